//! Deterministic quote grounding: verifies every quote the analyzer emitted
//! against the evidence it was shown, drops hallucinated quotes, and
//! adjusts confidence accordingly. This is the heart of the core — it is
//! what keeps a compliance verdict honest when the model hallucinates.

use crate::data::{ComplianceResult, EvidenceChunk, Quote};
use crate::logging::{report_progress, ProgressEvent};
use crate::normalizer::normalize;

const MIN_QUOTE_LEN: usize = 10;
const MIN_FLOOR: u8 = 20;
const ALL_REMOVED_CEILING: u8 = 30;
const PER_QUOTE_PENALTY: u8 = 10;
const MAX_PER_QUOTE_PENALTY_TOTAL: u8 = 20;

const ALL_REMOVED_ANNOTATION: &str = "No verifiable verbatim quotes found in retrieved evidence";

/// Verification outcome for a single quote.
enum Verification {
    SingleChunk { page_start: usize, page_end: usize },
    AdjacentPair { page_start: usize, page_end: usize },
    Unmatched,
}

fn verify_quote(normalized_quote: &str, evidence: &[EvidenceChunk]) -> Verification {
    for e in evidence {
        if e.chunk.normalized_text.contains(normalized_quote) {
            let (page_start, page_end) = if e.chunk.is_single_page() {
                (e.chunk.page_start, e.chunk.page_start)
            } else {
                (e.chunk.page_start, e.chunk.page_end)
            };
            return Verification::SingleChunk { page_start, page_end };
        }
    }

    for a in evidence {
        for b in evidence {
            if a.chunk.page_end + 1 == b.chunk.page_start {
                let concatenated = format!("{} {}", a.chunk.normalized_text, b.chunk.normalized_text);
                if concatenated.contains(normalized_quote) {
                    return Verification::AdjacentPair {
                        page_start: a.chunk.page_start,
                        page_end: b.chunk.page_end,
                    };
                }
            }
        }
    }

    Verification::Unmatched
}

/// Grounds every quote in `result` against `evidence`, then applies the
/// confidence-adjustment policy if `adjust_confidence` is set. The chat
/// service sets this `false` since it computes its own confidence
/// heuristic.
pub fn ground(mut result: ComplianceResult, evidence: &[EvidenceChunk], adjust_confidence: bool) -> ComplianceResult {
    let original_count = result.relevant_quotes.len();
    let mut validated_quotes = Vec::with_capacity(original_count);

    for quote in result.relevant_quotes.drain(..) {
        let normalized_quote = normalize(&quote.text);
        if normalized_quote.chars().count() < MIN_QUOTE_LEN {
            log_dropped(&quote.text);
            continue;
        }

        match verify_quote(&normalized_quote, evidence) {
            Verification::SingleChunk { page_start, page_end }
            | Verification::AdjacentPair { page_start, page_end } => {
                validated_quotes.push(Quote {
                    text: quote.text,
                    page_start,
                    page_end,
                    validated: true,
                });
            }
            Verification::Unmatched => {
                log_dropped(&quote.text);
            }
        }
    }

    let validated_count = validated_quotes.len();
    result.relevant_quotes = validated_quotes;

    if adjust_confidence {
        result.confidence = adjust_confidence_for(result.confidence, original_count, validated_count);
        if original_count > 0 && validated_count < original_count {
            let removed = original_count - validated_count;
            if validated_count > 0 {
                result.rationale = format!(
                    "{} [{} of {} quotes removed during validation]",
                    result.rationale, removed, original_count
                );
            } else {
                result.rationale = format!("{} {}", result.rationale, ALL_REMOVED_ANNOTATION);
            }
        }
    }

    report_progress(ProgressEvent::QuoteGroundingCompleted {
        original_count,
        validated_count,
    });

    result
}

/// Applies the confidence-adjustment policy table: unpenalized when every
/// quote verifies, floored and capped when some are dropped, capped hard
/// when all of them are.
fn adjust_confidence_for(confidence: u8, original_count: usize, validated_count: usize) -> u8 {
    if original_count == 0 {
        return confidence;
    }
    let removed = original_count - validated_count;
    if removed == 0 {
        return confidence;
    }
    if removed == original_count {
        return confidence.min(ALL_REMOVED_CEILING);
    }
    // 0 < removed < original_count
    let penalty = (removed as u8).saturating_mul(PER_QUOTE_PENALTY).min(MAX_PER_QUOTE_PENALTY_TOTAL);
    confidence.saturating_sub(penalty).max(MIN_FLOOR)
}

fn log_dropped(raw_quote: &str) {
    let preview: String = raw_quote.chars().take(30).collect();
    tracing::debug!(quote_preview = %preview, "dropped unverifiable quote");
}
