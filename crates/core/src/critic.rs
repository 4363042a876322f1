use std::sync::Arc;

use async_trait::async_trait;
use coach_openai_types::{ChatMessage, ChatRequest};
#[cfg(test)]
use mockall::automock;

use crate::error::{CoachError, ExternalServiceError, ValidationError};
use crate::openai::{ChatCompletions, OpenAiHttp};
use crate::persona::critique_request_text;

/// Transport failures get one more attempt. Nothing else is retried.
pub const TRANSPORT_RETRIES: u32 = 1;

// The session controller only knows about this trait, never about HTTP or
// models. `CriticClient` is the production implementation; tests use the
// generated `MockCritic` to count calls and script failures, and the console
// tests in the service crate use a small hand-written fake.
// `#[cfg_attr(test, automock)]` has to sit above `#[async_trait]` so mockall
// sees the `async fn` before it is rewritten into a boxed future.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Critic: Send + Sync {
    /// Reviews `answer` to `question` under `policy_prompt`.
    ///
    /// Output is not repeatable for the same input.
    async fn critique(
        &self,
        policy_prompt: &str,
        question: &str,
        answer: &str,
    ) -> Result<String, CoachError>;
}

pub struct CriticClient<C: ChatCompletions = Arc<OpenAiHttp>> {
    chat: C,
    model: String,
    retries: u32,
}

impl<C: ChatCompletions> CriticClient<C> {
    pub fn new(chat: C, model: &str) -> Self {
        Self {
            chat,
            model: model.to_string(),
            retries: TRANSPORT_RETRIES,
        }
    }

    fn build_request(&self, policy_prompt: &str, question: &str, answer: &str) -> ChatRequest {
        ChatRequest::new(&self.model)
            .with_message(ChatMessage::system(policy_prompt))
            .with_message(ChatMessage::user(critique_request_text(question, answer)))
    }

    async fn send_with_retry(&self, request: ChatRequest) -> Result<String, ExternalServiceError> {
        let mut attempt = 0;
        loop {
            match self.chat.complete(request.clone()).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!("Critique request failed ({}), retrying once", err);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl<C: ChatCompletions> Critic for CriticClient<C> {
    async fn critique(
        &self,
        policy_prompt: &str,
        question: &str,
        answer: &str,
    ) -> Result<String, CoachError> {
        if answer.trim().is_empty() {
            return Err(ValidationError::EmptyAnswer.into());
        }

        let request = self.build_request(policy_prompt, question, answer);
        tracing::debug!("Requesting critique from {}", self.model);

        let feedback = self.send_with_retry(request).await?;
        tracing::info!("Critique received ({} chars)", feedback.len());
        Ok(feedback)
    }
}
