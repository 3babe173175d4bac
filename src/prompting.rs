//! Prompt construction for the analyzer and chat service.
//!
//! Exact wording is a free implementation choice; what matters is the
//! semantics: a system role describing the task and JSON schema, the
//! question, a rubric, and an evidence block the model is restricted to.

use crate::catalog::RequirementCatalogEntry;
use crate::data::EvidenceChunk;

const ANALYSIS_SCHEMA: &str = r#"{
  "compliance_state": "Fully Compliant" | "Partially Compliant" | "Non-Compliant",
  "confidence": <integer 0-100>,
  "relevant_quotes": [{"text": "<verbatim quote>", "page_start": <int>, "page_end": <int>}],
  "rationale": "<free text>"
}"#;

const CHAT_SCHEMA: &str = r#"{
  "answer": "<free text>",
  "relevant_quotes": [{"text": "<verbatim quote>", "page_start": <int>, "page_end": <int>}]
}"#;

fn evidence_block(evidence: &[EvidenceChunk]) -> String {
    evidence
        .iter()
        .map(|e| {
            let c = &e.chunk;
            if c.is_single_page() {
                format!("[page {}]\n{}", c.page_start, c.raw_text)
            } else {
                format!("[pages {}-{}]\n{}", c.page_start, c.page_end, c.raw_text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Builds the analysis prompt for one requirement over its retrieved
/// evidence. The model is explicitly restricted to these chunks.
pub fn analysis_prompt(requirement: &RequirementCatalogEntry, evidence: &[EvidenceChunk]) -> String {
    format!(
        "You are a contract compliance analyst. Evaluate the contract excerpts below \
against a single compliance requirement and respond with ONLY a JSON object matching \
this schema, no prose, no code fences:\n{schema}\n\n\
Compliance question: {question}\n\n\
Rubric:\n{rubric}\n\n\
You must base your judgment ONLY on the excerpts below. Do not use outside knowledge \
of the contract. If the excerpts do not address the requirement, say so and reflect \
that in a low confidence and a Non-Compliant or Partially Compliant state as the rubric \
dictates.\n\n\
Contract excerpts:\n{evidence}\n",
        schema = ANALYSIS_SCHEMA,
        question = requirement.compliance_question,
        rubric = requirement.rubric,
        evidence = evidence_block(evidence),
    )
}

/// Builds the one-shot repair prompt quoting back malformed output.
pub fn repair_prompt(schema: &str, offending_output: &str) -> String {
    format!(
        "Your previous response was not valid JSON matching the required schema.\n\n\
Required schema:\n{schema}\n\n\
Your previous response was:\n{offending_output}\n\n\
Respond again with ONLY a valid JSON object matching the schema above. No prose, no code fences.",
    )
}

/// Builds the chat prompt: system instruction, truncated history, evidence
/// block, and the answer schema.
pub fn chat_prompt(history: &[(String, String)], user_message: &str, evidence: &[EvidenceChunk]) -> String {
    let history_block = history
        .iter()
        .map(|(role, content)| format!("{role}: {content}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a contract assistant. Answer ONLY from the evidence below. If the \
evidence is insufficient to answer, reply with a sentence beginning exactly with \
\"I cannot find\". Respond with ONLY a JSON object matching this schema, no prose, no \
code fences:\n{schema}\n\n\
Recent conversation:\n{history}\n\n\
User question: {question}\n\n\
Contract excerpts:\n{evidence}\n",
        schema = CHAT_SCHEMA,
        history = history_block,
        question = user_message,
        evidence = evidence_block(evidence),
    )
}

pub fn analysis_schema() -> &'static str {
    ANALYSIS_SCHEMA
}

pub fn chat_schema() -> &'static str {
    CHAT_SCHEMA
}
