use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use coach_openai_types::{SpeechFormat, SpeechRequest, Voice};
#[cfg(test)]
use mockall::automock;

use crate::error::{CoachError, ValidationError};
use crate::openai::OpenAiHttp;

// Second seam of the session controller, next to `Critic`. Speech is an
// enhancement: the session turns any error from here into a text-only
// fallback, so implementations just report what went wrong and never retry.
/// Turns question text into playable audio. One attempt per call.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechRenderer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, CoachError>;
}

pub struct SpeechClient {
    http: Arc<OpenAiHttp>,
    model: String,
    format: SpeechFormat,
}

impl SpeechClient {
    pub fn new(http: Arc<OpenAiHttp>, model: &str) -> Self {
        Self {
            http,
            model: model.to_string(),
            format: SpeechFormat::default(),
        }
    }

    pub fn with_format(mut self, format: SpeechFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> SpeechFormat {
        self.format
    }
}

#[async_trait]
impl SpeechRenderer for SpeechClient {
    async fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, CoachError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptySpeechText.into());
        }

        let request = SpeechRequest::new(&self.model, voice, text).with_format(self.format);
        tracing::debug!("Requesting speech from {} with voice {}", self.model, voice);

        let audio = self.http.speech(&request).await?;
        tracing::info!("Speech received ({} bytes)", audio.len());
        Ok(audio)
    }
}

/// Audio for one question, sitting in the cache slot and ready to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub topic_label: String,
    pub path: PathBuf,
    pub format: SpeechFormat,
    pub size: usize,
}

/// The single on-disk cache slot for synthesized audio.
///
/// Every store overwrites the previous file. The slot is shared by the whole
/// process, which is only safe while there is a single session; a
/// multi-session deployment must give each session its own `name`.
#[derive(Debug, Clone)]
pub struct AudioSlot {
    path: PathBuf,
    format: SpeechFormat,
}

impl AudioSlot {
    pub const DEFAULT_NAME: &'static str = "question";

    pub fn new(dir: impl AsRef<Path>, name: &str, format: SpeechFormat) -> Self {
        let path = dir
            .as_ref()
            .join(format!("{}.{}", name, format.extension()));
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn store(&self, topic_label: &str, audio: &[u8]) -> Result<AudioArtifact, CoachError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| CoachError::AudioStorage(e.to_string()))?;
        }
        tokio::fs::write(&self.path, audio)
            .await
            .map_err(|e| CoachError::AudioStorage(e.to_string()))?;

        tracing::debug!("Stored {} bytes of audio at {}", audio.len(), self.path.display());
        Ok(AudioArtifact {
            topic_label: topic_label.to_string(),
            path: self.path.clone(),
            format: self.format,
            size: audio.len(),
        })
    }
}
