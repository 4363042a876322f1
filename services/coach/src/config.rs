//! Application Configuration Module
//!
//! Loads every setting the coach needs from the environment (and a `.env`
//! file, if present) once at startup. A missing API key is the only fatal
//! condition in the whole program and is reported from here.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use coach_core::Persona;
use coach_core::openai::DEFAULT_BASE_URL;
use coach_openai_types::{SpeechFormat, Voice};
use secrecy::SecretString;
use tracing::Level;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub openai_api_key: SecretString,
    pub base_url: String,
    pub chat_model: String,
    pub speech_model: String,
    pub voice: Voice,
    pub speech_format: SpeechFormat,
    pub persona: Persona,
    pub access_passphrase: Option<SecretString>,
    pub request_timeout: Duration,
    pub audio_cache_dir: PathBuf,
    pub prompts_dir: Option<PathBuf>,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// *   `OPENAI_API_KEY`: Secret key for the OpenAI API. Required.
    /// *   `OPENAI_BASE_URL`: (Optional) API root. Defaults to the public OpenAI endpoint.
    /// *   `CHAT_MODEL`: (Optional) Model that writes the critique. Defaults to "gpt-4o-mini".
    /// *   `SPEECH_MODEL`: (Optional) Text-to-speech model. Defaults to "tts-1".
    /// *   `SPEECH_VOICE`: (Optional) One of alloy, echo, fable, onyx, nova, shimmer. Defaults to "alloy".
    /// *   `SPEECH_FORMAT`: (Optional) One of mp3, opus, aac, flac, wav. Defaults to "mp3".
    /// *   `COACH_PERSONA`: (Optional) "recruiter" or "esl-coach". Defaults to "recruiter".
    /// *   `ACCESS_PASSPHRASE`: (Optional) Shared password. When set, the console asks for it first.
    /// *   `REQUEST_TIMEOUT_SECS`: (Optional) Per-request timeout. Defaults to 30.
    /// *   `AUDIO_CACHE_DIR`: (Optional) Where the question audio is written. Defaults to a temp dir.
    /// *   `PROMPTS_DIR`: (Optional) Directory with `<persona>.md` policy prompt overrides.
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let openai_api_key = get("OPENAI_API_KEY")
            .map(|key| SecretString::from(key.trim().to_string()))
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        let base_url = get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "OPENAI_BASE_URL".to_string(),
                format!("'{base_url}' is not an http(s) URL"),
            ));
        }

        let chat_model = get("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        let speech_model = get("SPEECH_MODEL").unwrap_or_else(|| DEFAULT_SPEECH_MODEL.to_string());

        let voice = match get("SPEECH_VOICE") {
            Some(raw) => raw.parse::<Voice>().map_err(|e| {
                ConfigError::InvalidValue("SPEECH_VOICE".to_string(), e.to_string())
            })?,
            None => Voice::default(),
        };

        let speech_format = match get("SPEECH_FORMAT") {
            Some(raw) => raw
                .parse::<SpeechFormat>()
                .map_err(|e| ConfigError::InvalidValue("SPEECH_FORMAT".to_string(), e))?,
            None => SpeechFormat::default(),
        };

        let persona = match get("COACH_PERSONA") {
            Some(raw) => raw
                .parse::<Persona>()
                .map_err(|e| ConfigError::InvalidValue("COACH_PERSONA".to_string(), e))?,
            None => Persona::default(),
        };

        // Attempts are trimmed before comparison, so the stored value must be too.
        let access_passphrase =
            get("ACCESS_PASSPHRASE").map(|p| SecretString::from(p.trim().to_string()));

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "REQUEST_TIMEOUT_SECS".to_string(),
                        format!("'{raw}' is not a positive number of seconds"),
                    ));
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let audio_cache_dir = get("AUDIO_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("fifo-coach"));
        let prompts_dir = get("PROMPTS_DIR").map(PathBuf::from);

        // Configure logging level from RUST_LOG, with a sensible default.
        let log_level_str = get("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            openai_api_key,
            base_url,
            chat_model,
            speech_model,
            voice,
            speech_format,
            persona,
            access_passphrase,
            request_timeout,
            audio_cache_dir,
            prompts_dir,
            log_level,
        })
    }
}
