//! Chat subsystem: reuses the same retrieval + grounding machinery as the
//! analysis pipeline over a session-scoped message history.

use crate::analyzer::InferenceConfig;
use crate::data::{ChatAnswer, ChatMessage, ChatSession, Document, Quote, Role};
use crate::errors::CoreResult;
use crate::grounding::ground;
use crate::inference::{complete_with_retry, CompletionOptions, LanguageModel};
use crate::logging::{report_progress, ProgressEvent};
use crate::normalizer::normalize;
use crate::prompting::{chat_prompt, chat_schema, repair_prompt};
use crate::retrieval::Bm25Index;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

const CHAT_TOP_K: usize = 5;
const HISTORY_WINDOW: usize = 4;
const INSUFFICIENT_CONFIDENCE: u8 = 0;
const NO_EVIDENCE_CONFIDENCE: u8 = 30;
const BASE_CONFIDENCE: u8 = 70;
const PER_QUOTE_CONFIDENCE_BONUS: u8 = 10;

const CANNOT_FIND_MARKERS: [&str; 4] = ["cannot find", "can't find", "not found", "no information"];
const FALLBACK_ANSWER: &str = "I cannot find that information in the contract.";

#[derive(Debug, Deserialize)]
struct RawChatResponse {
    answer: String,
    #[serde(default)]
    relevant_quotes: Vec<crate::data::RawQuote>,
}

/// Wraps the BM25 index for reuse by chat, owning no document state of its
/// own beyond what retrieval needs.
pub struct ChatContext {
    index: Bm25Index,
}

impl ChatContext {
    pub fn build(_document: &Document, index: Bm25Index) -> Self {
        Self { index }
    }
}

/// Answers one user message within `session`, appending the user message and
/// then the assistant's reply to its history. A cancellation firing mid-call
/// aborts immediately and rolls back the just-appended user message, so a
/// cancelled turn leaves the session exactly as it was before the call.
#[tracing::instrument(skip_all, fields(session_id = %session.id))]
pub async fn answer(
    session: &mut ChatSession,
    user_message: &str,
    chat_context: &ChatContext,
    model: &dyn LanguageModel,
    inference: InferenceConfig,
    cancel: &CancellationToken,
) -> CoreResult<ChatAnswer> {
    session.messages.push(ChatMessage {
        role: Role::User,
        content: user_message.to_string(),
        timestamp: chrono::Utc::now(),
    });

    let evidence = chat_context.index.retrieve(user_message, CHAT_TOP_K, "chat");

    let history: Vec<(String, String)> = session
        .last_messages(HISTORY_WINDOW)
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            (role.to_string(), m.content.clone())
        })
        .collect();

    let prompt = chat_prompt(&history, user_message, &evidence);
    let options = CompletionOptions {
        temperature: 0.3,
        json_mode: true,
        ..Default::default()
    };

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
        Err(e) if e.is_cancelled() => {
            session.messages.pop();
            return Err(e);
        }
        Err(e) => {
            report_progress(ProgressEvent::Error {
                operation: "chat_llm_call".to_string(),
                error: e.to_string(),
            });
            return Ok(finalize(session, fallback_answer()));
        }
    };

    let parsed: Result<RawChatResponse, String> = crate::resolver::try_parse(&raw_text);

    let raw_chat = match parsed {
        Ok(r) => r,
        Err(_) => {
            let repair = repair_prompt(chat_schema(), &raw_text);
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
                Err(e) if e.is_cancelled() => {
                    session.messages.pop();
                    return Err(e);
                }
                Ok(t) => match crate::resolver::try_parse::<RawChatResponse>(&t) {
                    Ok(r) => r,
                    Err(_) => return Ok(finalize(session, fallback_answer())),
                },
                Err(_) => return Ok(finalize(session, fallback_answer())),
            }
        }
    };

    let quotes: Vec<Quote> = raw_chat
        .relevant_quotes
        .into_iter()
        .map(|q| Quote {
            text: q.text,
            page_start: q.page_start,
            page_end: q.page_end,
            validated: false,
        })
        .collect();

    let ungrounded = crate::data::ComplianceResult {
        compliance_question: String::new(),
        compliance_state: crate::data::ComplianceState::NonCompliant,
        confidence: 0,
        relevant_quotes: quotes,
        rationale: String::new(),
        evidence_chunks_used: Vec::new(),
    };
    let grounded = ground(ungrounded, &evidence, false);

    let confidence = chat_confidence(&raw_chat.answer, evidence.len(), grounded.relevant_quotes.len());

    let chat_answer = if confidence == INSUFFICIENT_CONFIDENCE {
        ChatAnswer {
            answer: raw_chat.answer,
            relevant_quotes: Vec::new(),
            confidence,
        }
    } else {
        ChatAnswer {
            answer: raw_chat.answer,
            relevant_quotes: grounded.relevant_quotes,
            confidence,
        }
    };

    Ok(finalize(session, chat_answer))
}

fn finalize(session: &mut ChatSession, chat_answer: ChatAnswer) -> ChatAnswer {
    session.messages.push(ChatMessage {
        role: Role::Assistant,
        content: chat_answer.answer.clone(),
        timestamp: chrono::Utc::now(),
    });
    chat_answer
}

fn fallback_answer() -> ChatAnswer {
    ChatAnswer {
        answer: FALLBACK_ANSWER.to_string(),
        relevant_quotes: Vec::new(),
        confidence: INSUFFICIENT_CONFIDENCE,
    }
}

/// Computes chat confidence from answer text and grounding outcome: zero if
/// the model says it can't find an answer, a low fixed floor if no evidence
/// was retrieved at all, otherwise a base score with a per-validated-quote
/// bonus. The "cannot find" predicate matches the substring anywhere in the
/// normalized answer, independent of case or punctuation.
fn chat_confidence(answer: &str, evidence_count: usize, validated_quote_count: usize) -> u8 {
    let normalized = normalize(answer);
    if CANNOT_FIND_MARKERS.iter().any(|m| normalized.contains(m)) {
        return INSUFFICIENT_CONFIDENCE;
    }
    if evidence_count == 0 {
        return NO_EVIDENCE_CONFIDENCE;
    }
    let bonus = (validated_quote_count as u32) * (PER_QUOTE_CONFIDENCE_BONUS as u32);
    (BASE_CONFIDENCE as u32 + bonus).min(100) as u8
}
