mod consts;

pub use consts::*;

/// Body of `POST /audio/speech`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpeechRequest {
    pub model: String,
    pub voice: Voice,
    pub input: String,
    pub response_format: SpeechFormat,
}

impl SpeechRequest {
    pub fn new(model: &str, voice: Voice, input: &str) -> Self {
        Self {
            model: model.to_string(),
            voice,
            input: input.to_string(),
            response_format: SpeechFormat::default(),
        }
    }

    pub fn with_format(mut self, format: SpeechFormat) -> Self {
        self.response_format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speech_request_uses_lowercase_wire_names() {
        let request = SpeechRequest::new("tts-1", Voice::Onyx, "G'day mate");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "tts-1");
        assert_eq!(json["voice"], "onyx");
        assert_eq!(json["input"], "G'day mate");
        assert_eq!(json["response_format"], "mp3");
    }
}
