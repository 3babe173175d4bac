//! The three operations the core surfaces to its collaborator:
//! `run_analysis`, `build_chat_context`, `chat_answer`.
//!
//! One job's five requirements are analyzed sequentially to bound per-job
//! LLM concurrency at one in-flight request; distinct jobs are the
//! orchestrator's (external) concern to parallelize.

use crate::analyzer::{analyze, InferenceConfig};
use crate::catalog::REQUIREMENTS;
use crate::chat::ChatContext;
use crate::chunking::{chunk, ChunkingConfig};
use crate::data::{ChatAnswer, ChatSession, Chunk, ComplianceResult, Document};
use crate::errors::{CoreError, CoreResult};
use crate::grounding::ground;
use crate::inference::LanguageModel;
use crate::logging::{report_progress, ProgressEvent};
use crate::parser;
use crate::retrieval::Bm25Index;
use tokio_util::sync::CancellationToken;

const TOP_K: usize = 5;

/// Tunable knobs for one job run. BM25 parameters are process-wide and not
/// included here; they tune the index itself, not a single run.
#[derive(Debug, Clone, Copy)]
pub struct CoreConfig {
    pub chunking: ChunkingConfig,
    pub inference: InferenceConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            inference: InferenceConfig::default(),
        }
    }
}

/// The full result of `run_analysis`: the parsed document, its chunks, and
/// one `ComplianceResult` per catalog requirement, in catalog order.
pub struct AnalysisRun {
    pub document: Document,
    pub chunks: Vec<Chunk>,
    pub results: Vec<ComplianceResult>,
}

/// Runs the full pipeline over `pdf_bytes` against the fixed requirement
/// catalog. Parser failures and a fired `cancel` both escape as `Err`;
/// analyzer/grounder failures on an individual requirement instead degrade to
/// that requirement's fallback result rather than failing the job. A
/// cancellation observed partway through discards every result gathered so
/// far — callers must never see a partial `AnalysisRun`.
pub async fn run_analysis(
    pdf_bytes: &[u8],
    filename: &str,
    model: &dyn LanguageModel,
    config: CoreConfig,
    cancel: &CancellationToken,
) -> CoreResult<AnalysisRun> {
    let document = parser::parse(pdf_bytes, filename)?;
    report_progress(ProgressEvent::DocumentParsed {
        page_count: document.page_count(),
        needs_ocr: document.needs_ocr(),
    });

    let chunks = chunk(&document, config.chunking);
    report_progress(ProgressEvent::ChunkingStarted {
        total_chars: document.concatenated_raw_text().chars().count(),
        chunk_count: chunks.len(),
        strategy: "page".to_string(),
    });

    let index = Bm25Index::build(chunks.clone());

    let mut results = Vec::with_capacity(REQUIREMENTS.len());
    for requirement in &REQUIREMENTS {
        if cancel.is_cancelled() {
            return Err(CoreError::cancelled());
        }

        let evidence = index.retrieve(requirement.bm25_query, TOP_K, requirement.id);
        report_progress(ProgressEvent::RetrievalCompleted {
            query_label: requirement.id.to_string(),
            evidence_count: evidence.len(),
        });

        let raw_result = analyze(requirement, &evidence, model, config.inference, cancel).await?;
        let grounded = ground(raw_result, &evidence, true);
        results.push(grounded);
    }

    report_progress(ProgressEvent::ProcessingCompleted {
        total_requirements: results.len(),
        processing_time_ms: 0,
    });

    Ok(AnalysisRun {
        document,
        chunks,
        results,
    })
}

/// Wraps the BM25 index for reuse by chat.
pub fn build_chat_context(document: &Document, chunks: Vec<Chunk>) -> ChatContext {
    let index = Bm25Index::build(chunks);
    ChatContext::build(document, index)
}

/// Answers one chat message, delegating to the chat service.
pub async fn chat_answer(
    session: &mut ChatSession,
    user_message: &str,
    chat_context: &ChatContext,
    model: &dyn LanguageModel,
    config: CoreConfig,
    cancel: &CancellationToken,
) -> CoreResult<ChatAnswer> {
    crate::chat::answer(session, user_message, chat_context, model, config.inference, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ComplianceState;
    use crate::inference::MockLanguageModel;

    fn scripted_fully_compliant_for_all_five() -> Vec<String> {
        REQUIREMENTS
            .iter()
            .map(|_| {
                serde_json::json!({
                    "compliance_state": "Fully Compliant",
                    "confidence": 88,
                    "relevant_quotes": [],
                    "rationale": "ok"
                })
                .to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn run_analysis_produces_five_results_in_catalog_order() {
        // pdf_extract cannot be exercised without a real PDF fixture in a unit
        // test; the evidence-free path is covered by the analyzer/grounding
        // unit tests and by the tests/ integration scenarios which build
        // documents directly rather than through parser::parse.
        let model = MockLanguageModel::new(scripted_fully_compliant_for_all_five());
        let document = Document {
            id: "doc1".to_string(),
            filename: "f.pdf".to_string(),
            pages: vec![crate::data::Page {
                page_number: 1,
                raw_text: "All passwords must be at least 12 characters long.".to_string(),
                normalized_text: "all passwords must be at least 12 characters long.".to_string(),
                char_offset_start: 0,
                char_offset_end: 52,
            }],
            metadata: Default::default(),
        };
        let chunks = chunk(&document, ChunkingConfig::default());
        let index = Bm25Index::build(chunks.clone());

        let cancel = CancellationToken::new();
        let mut results = Vec::new();
        for requirement in &REQUIREMENTS {
            let evidence = index.retrieve(requirement.bm25_query, TOP_K, requirement.id);
            let raw = analyze(requirement, &evidence, &model, InferenceConfig::default(), &cancel)
                .await
                .unwrap();
            results.push(ground(raw, &evidence, true));
        }

        assert_eq!(results.len(), 5);
        for (result, requirement) in results.iter().zip(REQUIREMENTS.iter()) {
            assert_eq!(result.compliance_question, requirement.compliance_question);
            assert_eq!(result.compliance_state, ComplianceState::FullyCompliant);
        }
    }

    #[test]
    fn build_chat_context_does_not_panic_on_empty_chunks() {
        let document = Document {
            id: "doc1".to_string(),
            filename: "f.pdf".to_string(),
            pages: vec![],
            metadata: Default::default(),
        };
        let _ctx = build_chat_context(&document, vec![]);
    }
}
