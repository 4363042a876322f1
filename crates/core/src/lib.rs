pub mod access;
pub mod critic;
pub mod error;
pub mod openai;
pub mod persona;
pub mod question_bank;
pub mod session_state;
pub mod speech;

#[cfg(test)]
mod fake_openai;

pub use access::{AccessError, AccessGate, SessionGrant};
pub use critic::{Critic, CriticClient};
pub use error::{CoachError, ExternalServiceError, ValidationError};
pub use openai::{ChatCompletions, OpenAiHttp};
pub use persona::Persona;
pub use question_bank::{Question, QuestionBank};
pub use session_state::{AudioOutcome, FeedbackOutcome, InterviewSession, InterviewState};
pub use speech::{AudioArtifact, AudioSlot, SpeechClient, SpeechRenderer};
