//! Error taxonomy for the coaching pipeline.
//!
//! Nothing in here is fatal: configuration failures live in the service crate
//! and are the only errors allowed to stop the process. Everything below is
//! converted into console text at the boundary where it was raised.

use thiserror::Error;

/// Local input problems. These never reach an external service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("the answer is empty")]
    EmptyAnswer,
    #[error("there is no text to read out")]
    EmptySpeechText,
}

/// Failures reported by (or on the way to) the OpenAI endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternalServiceError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("rate limit or quota exceeded: {0}")]
    RateLimited(String),
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },
}

impl ExternalServiceError {
    /// Connection-level failures are the only ones worth a second attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExternalServiceError::Transport(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            ExternalServiceError::Authentication(_) => {
                "The AI service rejected our credentials. Check the API key and try again.".into()
            }
            ExternalServiceError::RateLimited(_) => {
                "The AI service is busy or out of quota right now. Give it a minute and try again."
                    .into()
            }
            ExternalServiceError::Timeout => {
                "The AI service took too long to answer. Try again.".into()
            }
            ExternalServiceError::Transport(_) => {
                "Couldn't reach the AI service. Check your connection and try again.".into()
            }
            ExternalServiceError::MalformedResponse(_) => {
                "The AI service sent back something we couldn't read. Try again.".into()
            }
            ExternalServiceError::Api { status, message } => {
                format!("The AI service returned an error ({status}): {message}")
            }
        }
    }
}

impl From<reqwest::Error> for ExternalServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExternalServiceError::Timeout
        } else if err.is_decode() {
            ExternalServiceError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ExternalServiceError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ExternalServiceError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoachError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no question for topic '{0}'")]
    NotFound(String),
    #[error(transparent)]
    External(#[from] ExternalServiceError),
    #[error("no topic has been selected")]
    NoTopicSelected,
    #[error("a request is already in flight")]
    Busy,
    #[error("could not store audio: {0}")]
    AudioStorage(String),
}

impl CoachError {
    /// Text for the console. Raw transport detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            CoachError::Validation(ValidationError::EmptyAnswer) => {
                "Please type an answer first.".into()
            }
            CoachError::Validation(ValidationError::EmptySpeechText) => {
                "There's no question text to read out.".into()
            }
            CoachError::NotFound(topic) => {
                format!("Couldn't find a question for '{topic}'. Pick one from the list.")
            }
            CoachError::External(err) => err.user_message(),
            CoachError::NoTopicSelected => "Select a topic to practice first.".into(),
            CoachError::Busy => "Hang on, still working on the last request.".into(),
            CoachError::AudioStorage(_) => "Couldn't save the audio for playback.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_transient() {
        assert!(ExternalServiceError::Transport("reset".into()).is_transient());
        assert!(!ExternalServiceError::Timeout.is_transient());
        assert!(!ExternalServiceError::RateLimited("quota".into()).is_transient());
        assert!(!ExternalServiceError::Authentication("bad key".into()).is_transient());
        assert!(!ExternalServiceError::MalformedResponse("eof".into()).is_transient());
    }

    #[test]
    fn each_service_failure_has_its_own_message() {
        let errors = [
            ExternalServiceError::Authentication(String::new()),
            ExternalServiceError::RateLimited(String::new()),
            ExternalServiceError::Timeout,
            ExternalServiceError::Transport(String::new()),
            ExternalServiceError::MalformedResponse(String::new()),
        ];
        let mut messages: Vec<String> = errors.iter().map(|e| e.user_message()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn user_message_hides_transport_detail() {
        let err = CoachError::from(ExternalServiceError::Transport(
            "tcp connect error: 10.0.0.1:443".into(),
        ));
        assert!(!err.user_message().contains("10.0.0.1"));
    }
}
