//! Wire types for the two OpenAI endpoints the coach talks to:
//! chat completions (critique) and audio speech (question read-out).

pub mod audio;
pub mod chat;
pub mod error;

pub use audio::{SpeechFormat, SpeechRequest, Voice};
pub use chat::{ChatMessage, ChatRequest, ChatResponse, MessageRole};
pub use error::ApiErrorBody;
