//! Okapi BM25 retriever over a document's chunk corpus.
//!
//! Built once per document and reused, read-only, across all five
//! requirements and every chat message.

use crate::data::{Chunk, EvidenceChunk};
use crate::normalizer::normalize;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

const K1: f64 = 1.5;
const B: f64 = 0.75;

static TOKEN_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9a-z]+").unwrap());

/// Normalizes then splits on non-alphanumeric runs, discarding empty tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    TOKEN_SPLIT
        .split(&normalized)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// A read-only BM25 index over one document's chunk corpus. Chunk text is
/// owned by the index (not borrowed) so it can be shared across concurrent
/// chat messages without lifetime coupling to the chunk `Vec` the
/// orchestrator holds.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    chunks: Vec<Chunk>,
    doc_tokens: Vec<Vec<String>>,
    doc_freq: HashMap<String, usize>,
    doc_len: Vec<usize>,
    avg_doc_len: f64,
}

impl Bm25Index {
    /// Builds an index from the chunk corpus of one document.
    pub fn build(chunks: Vec<Chunk>) -> Self {
        let doc_tokens: Vec<Vec<String>> = chunks
            .iter()
            .map(|c| tokenize(&c.normalized_text))
            .collect();

        let doc_len: Vec<usize> = doc_tokens.iter().map(|t| t.len()).collect();
        let avg_doc_len = if doc_len.is_empty() {
            0.0
        } else {
            doc_len.iter().sum::<usize>() as f64 / doc_len.len() as f64
        };

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for tokens in &doc_tokens {
            let unique: std::collections::HashSet<&String> = tokens.iter().collect();
            for term in unique {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }

        Self {
            chunks,
            doc_tokens,
            doc_freq,
            doc_len,
            avg_doc_len,
        }
    }

    fn idf(&self, term: &str) -> f64 {
        let n = self.chunks.len() as f64;
        let df = *self.doc_freq.get(term).unwrap_or(&0) as f64;
        // Okapi BM25 idf with the +1 inside the log to keep it non-negative
        // for terms appearing in every document.
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    fn score(&self, query_terms: &[String], doc_index: usize) -> f64 {
        let tokens = &self.doc_tokens[doc_index];
        let doc_len = self.doc_len[doc_index] as f64;

        let mut term_counts: HashMap<&str, usize> = HashMap::new();
        for t in tokens {
            *term_counts.entry(t.as_str()).or_insert(0) += 1;
        }

        let mut score = 0.0;
        for term in query_terms {
            let tf = *term_counts.get(term.as_str()).unwrap_or(&0) as f64;
            if tf == 0.0 {
                continue;
            }
            let idf = self.idf(term);
            let numerator = tf * (K1 + 1.0);
            let denominator = tf + K1 * (1.0 - B + B * (doc_len / self.avg_doc_len.max(1e-9)));
            score += idf * (numerator / denominator);
        }
        score
    }

    /// Retrieves the top-`k` chunks for `query`, tagged with
    /// `requirement_id`. Ties are broken by ascending chunk index. Returns
    /// all chunks if the corpus has fewer than `k`.
    pub fn retrieve(&self, query: &str, k: usize, requirement_id: &str) -> Vec<EvidenceChunk> {
        let query_terms = tokenize(query);

        let mut scored: Vec<(usize, f64)> = (0..self.chunks.len())
            .map(|i| (i, self.score(&query_terms, i)))
            .collect();

        scored.sort_by(|(ia, sa), (ib, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ia.cmp(ib))
        });

        scored
            .into_iter()
            .take(k)
            .map(|(i, score)| EvidenceChunk {
                chunk: self.chunks[i].clone(),
                relevance_score: score.max(0.0),
                requirement_id: requirement_id.to_string(),
            })
            .collect()
    }

    pub fn corpus_len(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }
}
