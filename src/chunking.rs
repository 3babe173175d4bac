//! Splits a parsed `Document` into addressable, page-attributed `Chunk`s.
//!
//! Default policy is one page per chunk with zero overlap; `pages_per_chunk`
//! and `overlap_pages` are tunable but do not affect the correctness of any
//! downstream stage.

use crate::data::{Chunk, Document};

/// Chunking policy. `overlap_pages` is accepted for configurability but has
/// no effect under the default `pages_per_chunk = 1` policy, since a
/// single-page window has nothing to overlap with itself.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub pages_per_chunk: usize,
    pub overlap_pages: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            pages_per_chunk: 1,
            overlap_pages: 0,
        }
    }
}

/// Splits `document` into chunks per `config`. Chunk ids are dense and
/// deterministic: `chunk_0`, `chunk_1`, ...
pub fn chunk(document: &Document, config: ChunkingConfig) -> Vec<Chunk> {
    let pages_per_chunk = config.pages_per_chunk.max(1);
    let stride = pages_per_chunk.saturating_sub(config.overlap_pages).max(1);

    let mut chunks = Vec::new();
    let mut window_start = 0usize;
    let mut chunk_index = 0usize;

    while window_start < document.pages.len() {
        let window_end = (window_start + pages_per_chunk).min(document.pages.len());
        let window = &document.pages[window_start..window_end];

        let raw_text = window
            .iter()
            .map(|p| p.raw_text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let normalized_text = window
            .iter()
            .map(|p| p.normalized_text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        chunks.push(Chunk {
            id: format!("{}:chunk_{}", document.id, chunk_index),
            raw_text,
            normalized_text,
            page_start: window.first().unwrap().page_number,
            page_end: window.last().unwrap().page_number,
            char_offset_start: window.first().unwrap().char_offset_start,
            char_offset_end: window.last().unwrap().char_offset_end,
        });

        chunk_index += 1;
        if window_end == document.pages.len() {
            break;
        }
        window_start += stride;
    }

    chunks
}
