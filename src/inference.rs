//! The LLM capability: an opaque `(prompt, options) -> text` operation.
//! The transport (cloud provider vs. local server) is a collaborator
//! concern; the core works identically against any implementation.

use crate::errors::{CoreError, CoreResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Options accompanying a single completion request.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub json_mode: bool,
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            json_mode: true,
            timeout: Duration::from_secs(60),
        }
    }
}

/// The LLM capability consumed by the analyzer and chat service.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Issues `prompt` and returns the raw text response.
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> CoreResult<String>;

    /// Identifier for logging only; never influences behavior.
    fn model_id(&self) -> &str {
        "unknown"
    }

    /// Provider name for logging only.
    fn provider_name(&self) -> &str {
        "unknown"
    }
}

/// Calls `model.complete` with retry-with-exponential-backoff on transport
/// failure, up to `max_retries` additional attempts. Races every in-flight
/// call and every backoff sleep against `cancel`; a firing token aborts
/// immediately with `CoreError::Cancelled` rather than waiting out the
/// current attempt.
pub async fn complete_with_retry(
    model: &dyn LanguageModel,
    prompt: &str,
    options: &CompletionOptions,
    max_retries: usize,
    initial_backoff: Duration,
    cancel: &CancellationToken,
) -> CoreResult<String> {
    let mut attempt = 0usize;
    let mut backoff = initial_backoff;

    loop {
        if cancel.is_cancelled() {
            return Err(CoreError::cancelled());
        }

        let call = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CoreError::cancelled()),
            call = tokio::time::timeout(options.timeout, model.complete(prompt, options)) => call,
        };

        let result = match call {
            Ok(inner) => inner,
            Err(_) => Err(CoreError::llm(format!(
                "request to {} timed out after {:?}",
                model.model_id(),
                options.timeout
            ))),
        };

        match result {
            Ok(text) => return Ok(text),
            Err(e) if attempt < max_retries => {
                crate::logging::report_progress(crate::logging::ProgressEvent::RetryAttempt {
                    operation: "llm_complete".to_string(),
                    attempt: attempt + 1,
                    max_attempts: max_retries + 1,
                    delay_seconds: backoff.as_secs(),
                });
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(CoreError::cancelled()),
                    _ = tokio::time::sleep(backoff) => {}
                }
                attempt += 1;
                backoff *= 2;
                let _ = e;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Test and example double: returns scripted responses in order, one per
/// call. Panics (test-only) if called more times than it has responses.
pub struct MockLanguageModel {
    responses: std::sync::Mutex<std::collections::VecDeque<String>>,
}

impl MockLanguageModel {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into_iter().collect()),
        }
    }

    pub fn single(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(&self, _prompt: &str, _options: &CompletionOptions) -> CoreResult<String> {
        let mut guard = self.responses.lock().expect("mock model lock poisoned");
        guard
            .pop_front()
            .ok_or_else(|| CoreError::internal("mock language model ran out of scripted responses"))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

/// Built-in OpenAI-compatible chat-completion adapter. A convenience
/// implementation, not a requirement of the core: the core depends only on
/// `LanguageModel`.
#[cfg(feature = "http-client")]
pub mod http {
    use super::*;

    pub struct OpenAiCompatibleModel {
        client: reqwest::Client,
        base_url: String,
        api_key: String,
        model: String,
    }

    impl OpenAiCompatibleModel {
        pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
            Self {
                client: reqwest::Client::new(),
                base_url: base_url.into(),
                api_key: api_key.into(),
                model: model.into(),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for OpenAiCompatibleModel {
        async fn complete(&self, prompt: &str, options: &CompletionOptions) -> CoreResult<String> {
            let body = serde_json::json!({
                "model": self.model,
                "temperature": options.temperature,
                "response_format": if options.json_mode { serde_json::json!({"type": "json_object"}) } else { serde_json::Value::Null },
                "messages": [{"role": "user", "content": prompt}],
            });

            let resp = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| CoreError::llm(e.to_string()))?;

            let value: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| CoreError::llm(e.to_string()))?;

            value["choices"][0]["message"]["content"]
                .as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| CoreError::llm("malformed completion response".to_string()))
        }

        fn model_id(&self) -> &str {
            &self.model
        }

        fn provider_name(&self) -> &str {
            "openai-compatible"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_model_returns_scripted_responses_in_order() {
        let model = MockLanguageModel::new(vec!["first".to_string(), "second".to_string()]);
        let opts = CompletionOptions::default();
        assert_eq!(model.complete("p", &opts).await.unwrap(), "first");
        assert_eq!(model.complete("p", &opts).await.unwrap(), "second");
        assert!(model.complete("p", &opts).await.is_err());
    }

    #[tokio::test]
    async fn retry_succeeds_after_transient_failures() {
        struct FlakyThenOk {
            calls: std::sync::atomic::AtomicUsize,
        }
        #[async_trait]
        impl LanguageModel for FlakyThenOk {
            async fn complete(&self, _p: &str, _o: &CompletionOptions) -> CoreResult<String> {
                let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                if n < 2 {
                    Err(CoreError::llm("transient"))
                } else {
                    Ok("ok".to_string())
                }
            }
        }

        let model = FlakyThenOk {
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let opts = CompletionOptions::default();
        let cancel = CancellationToken::new();
        let result = complete_with_retry(&model, "p", &opts, 3, Duration::from_millis(1), &cancel).await;
        assert_eq!(result.unwrap(), "ok");
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_retries() {
        struct AlwaysFails;
        #[async_trait]
        impl LanguageModel for AlwaysFails {
            async fn complete(&self, _p: &str, _o: &CompletionOptions) -> CoreResult<String> {
                Err(CoreError::llm("down"))
            }
        }
        let opts = CompletionOptions::default();
        let cancel = CancellationToken::new();
        let result = complete_with_retry(&AlwaysFails, "p", &opts, 2, Duration::from_millis(1), &cancel).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cancellation_aborts_instead_of_waiting_out_the_call() {
        struct NeverResolves;
        #[async_trait]
        impl LanguageModel for NeverResolves {
            async fn complete(&self, _p: &str, _o: &CompletionOptions) -> CoreResult<String> {
                std::future::pending().await
            }
        }
        let opts = CompletionOptions {
            timeout: Duration::from_secs(60),
            ..Default::default()
        };
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = complete_with_retry(&NeverResolves, "p", &opts, 3, Duration::from_millis(1), &cancel).await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn cancellation_during_backoff_sleep_aborts_immediately() {
        struct AlwaysFails;
        #[async_trait]
        impl LanguageModel for AlwaysFails {
            async fn complete(&self, _p: &str, _o: &CompletionOptions) -> CoreResult<String> {
                Err(CoreError::llm("down"))
            }
        }
        let opts = CompletionOptions::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = complete_with_retry(&AlwaysFails, "p", &opts, 3, Duration::from_secs(30), &cancel).await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
