//! Core data model: `Document`, `Page`, `Chunk`, `EvidenceChunk`, `Quote`,
//! `ComplianceResult`, and the chat-side `ChatSession`/`ChatAnswer` types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A compliance verdict for one requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceState {
    #[serde(rename = "Fully Compliant")]
    FullyCompliant,
    #[serde(rename = "Partially Compliant")]
    PartiallyCompliant,
    #[serde(rename = "Non-Compliant")]
    NonCompliant,
}

impl ComplianceState {
    /// Coerces free-form model output into one of the three states,
    /// case-insensitive and whitespace-trimmed. Returns `None` when the
    /// string does not resemble any recognized state.
    pub fn coerce(raw: &str) -> Option<Self> {
        let t = raw.trim().to_lowercase();
        let t = t.replace('_', " ").replace('-', " ");
        match t.as_str() {
            "fully compliant" | "compliant" | "full" => Some(Self::FullyCompliant),
            "partially compliant" | "partial" => Some(Self::PartiallyCompliant),
            "non compliant" | "noncompliant" | "not compliant" => Some(Self::NonCompliant),
            _ => None,
        }
    }
}

/// A single parsed page of a document.
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-indexed page number.
    pub page_number: usize,
    /// Raw extracted text.
    pub raw_text: String,
    /// Normalized form of `raw_text` (see `normalizer::normalize`).
    pub normalized_text: String,
    /// Half-open character range within the concatenated-document space.
    pub char_offset_start: usize,
    pub char_offset_end: usize,
}

/// A parsed, immutable document.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub pages: Vec<Page>,
    pub metadata: HashMap<String, String>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// `true` when the parser flagged this document as likely requiring OCR.
    pub fn needs_ocr(&self) -> bool {
        self.metadata
            .get("needs_ocr")
            .map(|v| v == "true")
            .unwrap_or(false)
    }

    /// Concatenated raw text across all pages, in the same coordinate
    /// space used by each page's char offsets.
    pub fn concatenated_raw_text(&self) -> String {
        self.pages.iter().map(|p| p.raw_text.as_str()).collect()
    }
}

/// A stable, addressable slice of a document used as the retrieval unit.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// `<doc_id>:chunk_<n>`
    pub id: String,
    pub raw_text: String,
    pub normalized_text: String,
    pub page_start: usize,
    pub page_end: usize,
    pub char_offset_start: usize,
    pub char_offset_end: usize,
}

impl Chunk {
    pub fn is_single_page(&self) -> bool {
        self.page_start == self.page_end
    }
}

/// A chunk retrieved for a specific requirement (or chat query), carrying
/// its BM25 relevance score.
#[derive(Debug, Clone)]
pub struct EvidenceChunk {
    pub chunk: Chunk,
    pub relevance_score: f64,
    pub requirement_id: String,
}

/// A verbatim supporting quote, grounded against evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub page_start: usize,
    pub page_end: usize,
    pub validated: bool,
}

/// The raw shape emitted by the analyzer, before JSON coercion into
/// `ComplianceResult`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuote {
    pub text: String,
    pub page_start: usize,
    pub page_end: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAnalysis {
    pub compliance_state: String,
    pub confidence: i64,
    #[serde(default)]
    pub relevant_quotes: Vec<RawQuote>,
    pub rationale: String,
}

/// The per-requirement judgment produced by analyze+ground.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub compliance_question: String,
    pub compliance_state: ComplianceState,
    pub confidence: u8,
    pub relevant_quotes: Vec<Quote>,
    pub rationale: String,
    pub evidence_chunks_used: Vec<String>,
}

/// Role of a message in a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Session-scoped message history for the chat subsystem.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: String,
    pub document_id: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_id: document_id.into(),
            messages: Vec::new(),
        }
    }

    /// The last `n` messages, truncated from the tail.
    pub fn last_messages(&self, n: usize) -> &[ChatMessage] {
        let len = self.messages.len();
        let start = len.saturating_sub(n);
        &self.messages[start..]
    }
}

/// The answer produced by the chat service for one user message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub relevant_quotes: Vec<Quote>,
    pub confidence: u8,
}
