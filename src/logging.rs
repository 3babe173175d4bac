//! Logging and progress reporting system for the compliance core.
//!
//! Unified system for logging and progress reporting that can be controlled
//! by library users and CLI applications, independent of the `tracing`
//! instrumentation used for structured spans.

use std::sync::Arc;

/// Progress event types for the different stages of the pipeline.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// PDF parsing completed.
    DocumentParsed {
        page_count: usize,
        needs_ocr: bool,
    },
    /// Document chunked into addressable units.
    ChunkingStarted {
        total_chars: usize,
        chunk_count: usize,
        strategy: String,
    },
    /// BM25 retrieval completed for one requirement or chat query.
    RetrievalCompleted {
        query_label: String,
        evidence_count: usize,
    },
    /// Analysis of one requirement started.
    RequirementAnalysisStarted {
        requirement_id: String,
        evidence_count: usize,
    },
    /// Analysis of one requirement completed (post-analyze, pre-ground).
    RequirementAnalysisCompleted {
        requirement_id: String,
        quote_count: usize,
    },
    /// Quote grounding completed for one result.
    QuoteGroundingCompleted {
        original_count: usize,
        validated_count: usize,
    },
    /// Batch processing progress across the five requirements.
    BatchProgress {
        chunks_processed: usize,
        total_chunks: usize,
    },
    /// Language model call in progress.
    ModelCall {
        provider: String,
        model: String,
        input_length: usize,
    },
    /// Model response received.
    ModelResponse {
        success: bool,
        output_length: Option<usize>,
    },
    /// Raw-output validation/parsing started.
    ValidationStarted {
        raw_output_length: usize,
    },
    /// Raw-output validation/parsing completed.
    ValidationCompleted {
        errors: usize,
        warnings: usize,
    },
    /// A full job (all five requirements) completed.
    ProcessingCompleted {
        total_requirements: usize,
        processing_time_ms: u64,
    },
    /// Retry attempt for a transient failure.
    RetryAttempt {
        operation: String,
        attempt: usize,
        max_attempts: usize,
        delay_seconds: u64,
    },
    /// Error occurred. Never carries raw model output or PDF text.
    Error {
        operation: String,
        error: String,
    },
    /// Debug information.
    Debug {
        operation: String,
        details: String,
    },
}

/// Trait for handling progress events.
pub trait ProgressHandler: Send + Sync {
    /// Handle a progress event.
    fn handle_progress(&self, event: ProgressEvent);
}

/// Console progress handler that outputs to stdout with pipeline stage tags.
pub struct ConsoleProgressHandler {
    /// Whether to show progress messages.
    pub show_progress: bool,
    /// Whether to show debug information.
    pub show_debug: bool,
}

impl ConsoleProgressHandler {
    /// Create a new console handler with default settings.
    pub fn new() -> Self {
        Self {
            show_progress: true,
            show_debug: false,
        }
    }

    /// Create a quiet console handler (only errors).
    pub fn quiet() -> Self {
        Self {
            show_progress: false,
            show_debug: false,
        }
    }

    /// Create a verbose console handler (everything including debug).
    pub fn verbose() -> Self {
        Self {
            show_progress: true,
            show_debug: true,
        }
    }

    fn format_message(&self, tag: &str, message: &str) -> String {
        format!("[{}] {}", tag, message)
    }
}

impl Default for ConsoleProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHandler for ConsoleProgressHandler {
    fn handle_progress(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::DocumentParsed { page_count, needs_ocr } => {
                if self.show_progress {
                    println!("{}", self.format_message("parse",
                        &format!("{} pages (needs_ocr={})", page_count, needs_ocr)));
                }
            }
            ProgressEvent::ChunkingStarted { total_chars, chunk_count, strategy } => {
                if self.show_progress {
                    println!("{}", self.format_message("chunking",
                        &format!("{} chunks ({} strategy, {} chars total)", chunk_count, strategy, total_chars)));
                }
            }
            ProgressEvent::RetrievalCompleted { query_label, evidence_count } => {
                if self.show_progress {
                    println!("{}", self.format_message("retrieval",
                        &format!("{}: {} evidence chunks", query_label, evidence_count)));
                }
            }
            ProgressEvent::RequirementAnalysisStarted { requirement_id, evidence_count } => {
                if self.show_progress {
                    println!("{}", self.format_message("analyze",
                        &format!("{} -- {} evidence chunks", requirement_id, evidence_count)));
                }
            }
            ProgressEvent::RequirementAnalysisCompleted { requirement_id, quote_count } => {
                if self.show_progress {
                    println!("{}", self.format_message("analyze",
                        &format!("{} -- {} quotes emitted", requirement_id, quote_count)));
                }
            }
            ProgressEvent::QuoteGroundingCompleted { original_count, validated_count } => {
                if self.show_progress {
                    println!("{}", self.format_message("ground",
                        &format!("{}/{} quotes validated", validated_count, original_count)));
                }
            }
            ProgressEvent::BatchProgress { chunks_processed, total_chunks } => {
                if self.show_progress {
                    println!("{}", self.format_message("progress",
                        &format!("{}/{} chunks processed", chunks_processed, total_chunks)));
                }
            }
            ProgressEvent::ModelCall { provider, model: _, input_length } => {
                if self.show_debug {
                    println!("{}", self.format_message("inference",
                        &format!("{} API call -- {} chars", provider, input_length)));
                }
            }
            ProgressEvent::ModelResponse { success, output_length } => {
                if self.show_debug {
                    if success {
                        println!("{}", self.format_message("inference",
                            &format!("response received -- {} chars", output_length.unwrap_or(0))));
                    } else {
                        println!("{}", self.format_message("inference", "no response from model"));
                    }
                }
            }
            ProgressEvent::ProcessingCompleted { total_requirements, processing_time_ms: _ } => {
                if self.show_progress {
                    println!("{}", self.format_message("done",
                        &format!("{} requirements analyzed", total_requirements)));
                }
            }
            ProgressEvent::RetryAttempt { operation, attempt, max_attempts, delay_seconds } => {
                if self.show_progress {
                    println!("{}", self.format_message("retry",
                        &format!("{} failed (attempt {}/{}), retrying in {}s", operation, attempt, max_attempts, delay_seconds)));
                }
            }
            ProgressEvent::Error { operation, error } => {
                // Always show errors
                eprintln!("{}", self.format_message("error", &format!("{}: {}", operation, error)));
            }
            ProgressEvent::Debug { operation, details } => {
                if self.show_debug {
                    println!("{}", self.format_message("debug", &format!("{}: {}", operation, details)));
                }
            }
            ProgressEvent::ValidationStarted { raw_output_length: _ } => {
                // Internal event, no output needed
            }
            ProgressEvent::ValidationCompleted { errors, warnings } => {
                if self.show_debug {
                    println!("{}", self.format_message("validation",
                        &format!("{} errors, {} warnings", errors, warnings)));
                }
            }
        }
    }
}

/// Silent progress handler that does nothing.
pub struct SilentProgressHandler;

impl ProgressHandler for SilentProgressHandler {
    fn handle_progress(&self, _event: ProgressEvent) {
        // Do nothing
    }
}

/// Logger that integrates with the standard log crate.
pub struct LogProgressHandler;

impl ProgressHandler for LogProgressHandler {
    fn handle_progress(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::DocumentParsed { page_count, needs_ocr } => {
                log::info!("Parsed document: {} pages, needs_ocr={}", page_count, needs_ocr);
            }
            ProgressEvent::ChunkingStarted { total_chars, chunk_count, strategy } => {
                log::info!("Chunking document: {} {} chunks ({} chars)", chunk_count, strategy, total_chars);
            }
            ProgressEvent::RetrievalCompleted { query_label, evidence_count } => {
                log::debug!("Retrieval for {}: {} evidence chunks", query_label, evidence_count);
            }
            ProgressEvent::RequirementAnalysisStarted { requirement_id, evidence_count } => {
                log::debug!("Analyzing {} with {} evidence chunks", requirement_id, evidence_count);
            }
            ProgressEvent::RequirementAnalysisCompleted { requirement_id, quote_count } => {
                log::debug!("Analyzed {}: {} quotes emitted", requirement_id, quote_count);
            }
            ProgressEvent::QuoteGroundingCompleted { original_count, validated_count } => {
                log::debug!("Grounding: {}/{} quotes validated", validated_count, original_count);
            }
            ProgressEvent::BatchProgress { chunks_processed, total_chunks } => {
                log::debug!("Processing batch: {}/{} chunks", chunks_processed, total_chunks);
            }
            ProgressEvent::ModelCall { provider, model, input_length } => {
                log::debug!("Calling {} model {} with {} chars input", provider, model, input_length);
            }
            ProgressEvent::ModelResponse { success, output_length } => {
                if success {
                    log::debug!("Received response: {} chars", output_length.unwrap_or(0));
                } else {
                    log::warn!("Failed to receive model response");
                }
            }
            ProgressEvent::ValidationCompleted { errors, warnings } => {
                log::debug!("Validation: {} errors, {} warnings", errors, warnings);
            }
            ProgressEvent::ProcessingCompleted { total_requirements, processing_time_ms } => {
                log::info!("Job completed: {} requirements in {}ms", total_requirements, processing_time_ms);
            }
            ProgressEvent::RetryAttempt { operation, attempt, max_attempts, delay_seconds } => {
                log::warn!("Retry {}/{} for {}, waiting {}s", attempt, max_attempts, operation, delay_seconds);
            }
            ProgressEvent::Error { operation, error } => {
                log::error!("{}: {}", operation, error);
            }
            ProgressEvent::Debug { operation, details } => {
                log::debug!("{}: {}", operation, details);
            }
            ProgressEvent::ValidationStarted { .. } => {
                log::trace!("Starting validation");
            }
        }
    }
}

/// Global progress handler.
static PROGRESS_HANDLER: std::sync::OnceLock<Arc<dyn ProgressHandler>> = std::sync::OnceLock::new();

/// Initialize the global progress handler.
pub fn init_progress_handler(handler: Arc<dyn ProgressHandler>) {
    let _ = PROGRESS_HANDLER.set(handler);
}

/// Get the current progress handler, or create a default one.
fn get_progress_handler() -> Arc<dyn ProgressHandler> {
    PROGRESS_HANDLER.get_or_init(|| Arc::new(ConsoleProgressHandler::new())).clone()
}

/// Report a progress event.
pub fn report_progress(event: ProgressEvent) {
    let handler = get_progress_handler();
    handler.handle_progress(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_handler_formatting() {
        let handler = ConsoleProgressHandler::new();
        let message = handler.format_message("analyze", "Test message");
        assert!(message.contains("[analyze]"));
        assert!(message.contains("Test message"));
    }

    #[test]
    fn test_progress_events_do_not_panic() {
        let handler = ConsoleProgressHandler::quiet();
        handler.handle_progress(ProgressEvent::DocumentParsed {
            page_count: 10,
            needs_ocr: false,
        });
        handler.handle_progress(ProgressEvent::RequirementAnalysisCompleted {
            requirement_id: "password_management".to_string(),
            quote_count: 2,
        });
    }

    #[test]
    fn silent_handler_produces_no_output() {
        let handler = SilentProgressHandler;
        handler.handle_progress(ProgressEvent::Error {
            operation: "test".to_string(),
            error: "boom".to_string(),
        });
    }
}
