//! Thin HTTP client for the OpenAI REST endpoints.
//!
//! Every failure is classified into an [`ExternalServiceError`] here, so the
//! critic and speech renderer never see a raw `reqwest` error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coach_openai_types::{ApiErrorBody, ChatRequest, ChatResponse, SpeechRequest};
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::error::ExternalServiceError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";
const SPEECH_PATH: &str = "audio/speech";

/// Anything that can turn a chat request into the assistant's reply text.
///
/// `CriticClient` is generic over this so tests can script transport failures.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatCompletions: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String, ExternalServiceError>;
}

pub struct OpenAiHttp {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiHttp {
    /// `timeout` bounds each whole request, connect through body.
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ExternalServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExternalServiceError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B>(&self, path: &str, body: &B) -> Result<reqwest::Response, ExternalServiceError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = classify_status(status.as_u16(), &body);
        tracing::warn!("{} failed with {}: {}", path, status, err);
        Err(err)
    }

    /// Sends a speech request and returns the raw audio body.
    pub async fn speech(&self, request: &SpeechRequest) -> Result<Vec<u8>, ExternalServiceError> {
        let response = self.post_json(SPEECH_PATH, request).await?;
        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(ExternalServiceError::MalformedResponse(
                "speech response had an empty body".to_string(),
            ));
        }
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl ChatCompletions for OpenAiHttp {
    async fn complete(&self, request: ChatRequest) -> Result<String, ExternalServiceError> {
        let response = self.post_json(CHAT_COMPLETIONS_PATH, &request).await?;
        let body = response.text().await?;

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ExternalServiceError::MalformedResponse(e.to_string()))?;

        parsed
            .first_content()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ExternalServiceError::MalformedResponse("no message content in response".to_string())
            })
    }
}

#[async_trait]
impl<T: ChatCompletions + ?Sized> ChatCompletions for Arc<T> {
    async fn complete(&self, request: ChatRequest) -> Result<String, ExternalServiceError> {
        (**self).complete(request).await
    }
}

/// Maps a non-2xx status and its body onto the error taxonomy.
pub fn classify_status(status: u16, body: &str) -> ExternalServiceError {
    let message = ApiErrorBody::message_from(body)
        .unwrap_or_else(|| body.trim().chars().take(200).collect());

    match status {
        401 | 403 => ExternalServiceError::Authentication(message),
        429 => ExternalServiceError::RateLimited(message),
        _ => ExternalServiceError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_openai::{FakeOpenAi, Reply};
    use axum::http::StatusCode;
    use coach_openai_types::{ChatMessage, Voice};

    fn http(base_url: &str) -> OpenAiHttp {
        OpenAiHttp::new(
            SecretString::from("sk-test".to_string()),
            base_url,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest::new("gpt-4o-mini")
            .with_message(ChatMessage::system("policy"))
            .with_message(ChatMessage::user("answer"))
    }

    #[test]
    fn classifies_auth_and_rate_limit_statuses() {
        let body = r#"{"error":{"message":"Incorrect API key provided"}}"#;
        assert_eq!(
            classify_status(401, body),
            ExternalServiceError::Authentication("Incorrect API key provided".into())
        );
        assert_eq!(
            classify_status(429, r#"{"error":{"message":"You exceeded your current quota"}}"#),
            ExternalServiceError::RateLimited("You exceeded your current quota".into())
        );
        assert_eq!(
            classify_status(502, "bad gateway"),
            ExternalServiceError::Api {
                status: 502,
                message: "bad gateway".into()
            }
        );
    }

    #[tokio::test]
    async fn complete_returns_trimmed_first_choice() {
        let server = FakeOpenAi::start(vec![Reply::chat("  Good on ya, mate.  ")]).await;

        let text = http(&server.base_url).complete(request()).await.unwrap();

        assert_eq!(text, "Good on ya, mate.");
        let sent = server.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["model"], "gpt-4o-mini");
        assert_eq!(sent[0]["messages"][0]["role"], "system");
        assert_eq!(server.auth_headers(), vec!["Bearer sk-test".to_string()]);
    }

    #[tokio::test]
    async fn complete_maps_401_to_authentication() {
        let server = FakeOpenAi::start(vec![Reply::json(
            StatusCode::UNAUTHORIZED,
            serde_json::json!({"error": {"message": "Incorrect API key provided"}}),
        )])
        .await;

        let err = http(&server.base_url).complete(request()).await.unwrap_err();

        assert_eq!(
            err,
            ExternalServiceError::Authentication("Incorrect API key provided".into())
        );
    }

    #[tokio::test]
    async fn complete_rejects_body_without_choices() {
        let server = FakeOpenAi::start(vec![Reply::json(
            StatusCode::OK,
            serde_json::json!({"choices": []}),
        )])
        .await;

        let err = http(&server.base_url).complete(request()).await.unwrap_err();

        assert!(matches!(err, ExternalServiceError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn complete_rejects_non_json_success_body() {
        let server = FakeOpenAi::start(vec![Reply::raw(StatusCode::OK, "not json")]).await;

        let err = http(&server.base_url).complete(request()).await.unwrap_err();

        assert!(matches!(err, ExternalServiceError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_failure() {
        let base_url = FakeOpenAi::closed_base_url().await;

        let err = http(&base_url).complete(request()).await.unwrap_err();

        assert!(matches!(err, ExternalServiceError::Transport(_)), "{err:?}");
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn hung_service_times_out_without_being_transient() {
        let server =
            FakeOpenAi::start(vec![Reply::chat("too late").after(Duration::from_secs(5))]).await;
        let http = OpenAiHttp::new(
            SecretString::from("sk-test".to_string()),
            &server.base_url,
            Duration::from_millis(300),
        )
        .unwrap();

        let err = http.complete(request()).await.unwrap_err();

        assert_eq!(err, ExternalServiceError::Timeout);
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn speech_returns_audio_bytes() {
        let server = FakeOpenAi::start(vec![Reply::audio(b"ID3fake-mp3")]).await;

        let audio = http(&server.base_url)
            .speech(&SpeechRequest::new("tts-1", Voice::Alloy, "Why FIFO?"))
            .await
            .unwrap();

        assert_eq!(audio, b"ID3fake-mp3".to_vec());
        assert_eq!(server.requests()[0]["voice"], "alloy");
        assert_eq!(server.requests()[0]["input"], "Why FIFO?");
    }

    #[tokio::test]
    async fn speech_rejects_empty_body() {
        let server = FakeOpenAi::start(vec![Reply::audio(b"")]).await;

        let err = http(&server.base_url)
            .speech(&SpeechRequest::new("tts-1", Voice::Alloy, "Why FIFO?"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExternalServiceError::MalformedResponse(_)));
    }
}
