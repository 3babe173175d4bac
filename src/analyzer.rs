//! Issues a prompt over evidence only and parses the JSON judgment into a
//! raw `ComplianceResult` (not yet quote-grounded; see `grounding`).

use crate::catalog::RequirementCatalogEntry;
use crate::data::{ComplianceResult, ComplianceState, EvidenceChunk, Quote, RawAnalysis};
use crate::errors::{CoreError, CoreResult};
use crate::inference::{complete_with_retry, CompletionOptions, LanguageModel};
use crate::logging::{report_progress, ProgressEvent};
use crate::prompting::{analysis_prompt, analysis_schema, repair_prompt};
use crate::resolver::try_parse;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const FALLBACK_RATIONALE: &str = "Model output could not be parsed";
const FALLBACK_CONFIDENCE: u8 = 10;

/// Inference tuning shared with the chat service.
#[derive(Debug, Clone, Copy)]
pub struct InferenceConfig {
    pub max_retries: usize,
    pub initial_backoff: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// Issues the analyze prompt, attempts to parse JSON, retries once with a
/// repair prompt on failure, and otherwise synthesizes the fixed fallback
/// result. A malformed or unreachable model becomes the fallback, not a
/// propagated error — the only error this returns is cancellation, which
/// aborts the in-flight call and propagates immediately rather than
/// degrading to the fallback.
#[tracing::instrument(skip_all, fields(requirement_id = requirement.id, evidence_count = evidence.len()))]
pub async fn analyze(
    requirement: &RequirementCatalogEntry,
    evidence: &[EvidenceChunk],
    model: &dyn LanguageModel,
    inference: InferenceConfig,
    cancel: &CancellationToken,
) -> CoreResult<ComplianceResult> {
    let evidence_chunks_used: Vec<String> = evidence.iter().map(|e| e.chunk.id.clone()).collect();
    let options = CompletionOptions {
        temperature: 0.3,
        json_mode: true,
        ..Default::default()
    };

    report_progress(ProgressEvent::RequirementAnalysisStarted {
        requirement_id: requirement.id.to_string(),
        evidence_count: evidence.len(),
    });

    let prompt = analysis_prompt(requirement, evidence);
    let first_response = complete_with_retry(
        model,
        &prompt,
        &options,
        inference.max_retries,
        inference.initial_backoff,
        cancel,
    )
    .await;

    let raw_text = match first_response {
        Ok(text) => text,
        Err(e) if e.is_cancelled() => return Err(e),
        Err(e) => {
            report_progress(ProgressEvent::Error {
                operation: "analyzer_llm_call".to_string(),
                error: e.to_string(),
            });
            return Ok(fallback_result(requirement, evidence_chunks_used));
        }
    };

    let parsed: Result<RawAnalysis, String> = try_parse(&raw_text);

    let raw_analysis = match parsed {
        Ok(r) => r,
        Err(first_err) => {
            report_progress(ProgressEvent::Debug {
                operation: "analyzer_repair".to_string(),
                details: format!("first parse failed: {first_err}; issuing repair prompt"),
            });

            let repair = repair_prompt(analysis_schema(), &raw_text);
            let second_response = complete_with_retry(
                model,
                &repair,
                &options,
                inference.max_retries,
                inference.initial_backoff,
                cancel,
            )
            .await;

            match second_response {
                Err(e) if e.is_cancelled() => return Err(e),
                Ok(t) => match try_parse::<RawAnalysis>(&t) {
                    Ok(r) => r,
                    Err(_) => return Ok(fallback_result(requirement, evidence_chunks_used)),
                },
                Err(_) => return Ok(fallback_result(requirement, evidence_chunks_used)),
            }
        }
    };

    let compliance_state = match ComplianceState::coerce(&raw_analysis.compliance_state) {
        Some(s) => s,
        None => return Ok(fallback_result(requirement, evidence_chunks_used)),
    };

    let confidence = raw_analysis.confidence.clamp(0, 100) as u8;

    let relevant_quotes: Vec<Quote> = raw_analysis
        .relevant_quotes
        .into_iter()
        .map(|q| Quote {
            text: q.text,
            page_start: q.page_start,
            page_end: q.page_end,
            validated: false,
        })
        .collect();

    report_progress(ProgressEvent::RequirementAnalysisCompleted {
        requirement_id: requirement.id.to_string(),
        quote_count: relevant_quotes.len(),
    });

    Ok(ComplianceResult {
        compliance_question: requirement.compliance_question.to_string(),
        compliance_state,
        confidence,
        relevant_quotes,
        rationale: raw_analysis.rationale,
        evidence_chunks_used,
    })
}

fn fallback_result(
    requirement: &RequirementCatalogEntry,
    evidence_chunks_used: Vec<String>,
) -> ComplianceResult {
    ComplianceResult {
        compliance_question: requirement.compliance_question.to_string(),
        compliance_state: ComplianceState::NonCompliant,
        confidence: FALLBACK_CONFIDENCE,
        relevant_quotes: Vec::new(),
        rationale: FALLBACK_RATIONALE.to_string(),
        evidence_chunks_used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::REQUIREMENTS;
    use crate::data::Chunk;
    use crate::inference::MockLanguageModel;

    fn no_cancel() -> CancellationToken {
        CancellationToken::new()
    }

    fn evidence() -> Vec<EvidenceChunk> {
        vec![EvidenceChunk {
            chunk: Chunk {
                id: "doc1:chunk_0".to_string(),
                raw_text: "All passwords must be at least 12 characters long.".to_string(),
                normalized_text: "all passwords must be at least 12 characters long.".to_string(),
                page_start: 1,
                page_end: 1,
                char_offset_start: 0,
                char_offset_end: 50,
            },
            relevance_score: 5.0,
            requirement_id: REQUIREMENTS[0].id.to_string(),
        }]
    }

    #[tokio::test]
    async fn parses_well_formed_response() {
        let response = serde_json::json!({
            "compliance_state": "Fully Compliant",
            "confidence": 90,
            "relevant_quotes": [{"text": "All passwords must be at least 12 characters long.", "page_start": 1, "page_end": 1}],
            "rationale": "Clear password policy present."
        }).to_string();
        let model = MockLanguageModel::single(response);

        let result = analyze(&REQUIREMENTS[0], &evidence(), &model, InferenceConfig::default(), &no_cancel()).await.unwrap();
        assert_eq!(result.compliance_state, ComplianceState::FullyCompliant);
        assert_eq!(result.confidence, 90);
        assert_eq!(result.relevant_quotes.len(), 1);
        assert_eq!(result.evidence_chunks_used, vec!["doc1:chunk_0".to_string()]);
    }

    #[tokio::test]
    async fn clamps_out_of_range_confidence() {
        let response = serde_json::json!({
            "compliance_state": "Fully Compliant",
            "confidence": 150,
            "relevant_quotes": [],
            "rationale": "r"
        }).to_string();
        let model = MockLanguageModel::single(response);
        let result = analyze(&REQUIREMENTS[0], &evidence(), &model, InferenceConfig::default(), &no_cancel()).await.unwrap();
        assert_eq!(result.confidence, 100);
    }

    #[tokio::test]
    async fn repairs_once_then_succeeds() {
        let good = serde_json::json!({
            "compliance_state": "Partially Compliant",
            "confidence": 50,
            "relevant_quotes": [],
            "rationale": "partial"
        }).to_string();
        let model = MockLanguageModel::new(vec!["<<not json>>".to_string(), good]);
        let result = analyze(&REQUIREMENTS[0], &evidence(), &model, InferenceConfig::default(), &no_cancel()).await.unwrap();
        assert_eq!(result.compliance_state, ComplianceState::PartiallyCompliant);
    }

    #[tokio::test]
    async fn falls_back_after_two_malformed_responses() {
        let model = MockLanguageModel::new(vec!["<<not json>>".to_string(), "<<still not json>>".to_string()]);
        let result = analyze(&REQUIREMENTS[0], &evidence(), &model, InferenceConfig::default(), &no_cancel()).await.unwrap();
        assert_eq!(result.compliance_state, ComplianceState::NonCompliant);
        assert_eq!(result.confidence, 10);
        assert!(result.relevant_quotes.is_empty());
        assert_eq!(result.rationale, "Model output could not be parsed");
    }

    #[tokio::test]
    async fn unrecognized_state_falls_back() {
        let response = serde_json::json!({
            "compliance_state": "Unsure",
            "confidence": 70,
            "relevant_quotes": [],
            "rationale": "r"
        }).to_string();
        let model = MockLanguageModel::single(response);
        let result = analyze(&REQUIREMENTS[0], &evidence(), &model, InferenceConfig::default(), &no_cancel()).await.unwrap();
        assert_eq!(result.compliance_state, ComplianceState::NonCompliant);
        assert_eq!(result.rationale, "Model output could not be parsed");
    }

    #[tokio::test]
    async fn evidence_chunks_used_is_computed_not_trusted_from_model() {
        let response = serde_json::json!({
            "compliance_state": "Fully Compliant",
            "confidence": 80,
            "relevant_quotes": [],
            "rationale": "r"
        }).to_string();
        let model = MockLanguageModel::single(response);
        let result = analyze(&REQUIREMENTS[0], &evidence(), &model, InferenceConfig::default(), &no_cancel()).await.unwrap();
        assert_eq!(result.evidence_chunks_used, vec!["doc1:chunk_0".to_string()]);
    }
}
