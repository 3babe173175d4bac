//! Error taxonomy for the compliance core.
//!
//! A small, fixed set of variants escape the core to collaborators; everything
//! else is collapsed into `InternalError` before it crosses that boundary.

use thiserror::Error;

/// Errors that can escape the core to the orchestrator/HTTP layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The PDF bytes could not be parsed into a `Document`.
    #[error("failed to parse PDF: {0}")]
    ParserError(String),

    /// The LLM transport failed after exhausting its retry budget.
    #[error("LLM request failed after retries: {0}")]
    LLMError(String),

    /// A cancellation token fired while a stage had work in flight; that
    /// stage aborted and produced nothing usable.
    #[error("operation cancelled")]
    Cancelled,

    /// Any other failure; never carries raw model output or PDF text.
    #[error("internal error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn parser(msg: impl Into<String>) -> Self {
        Self::ParserError(msg.into())
    }

    pub fn llm(msg: impl Into<String>) -> Self {
        Self::LLMError(msg.into())
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// `true` if this error resulted from a cancellation rather than a
    /// transport/parse failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result alias used throughout the core.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<pdf_extract::OutputError> for CoreError {
    fn from(e: pdf_extract::OutputError) -> Self {
        CoreError::ParserError(e.to_string())
    }
}
