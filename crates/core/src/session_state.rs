use std::sync::Arc;

use coach_openai_types::Voice;

use crate::access::SessionGrant;
use crate::critic::Critic;
use crate::error::{CoachError, ExternalServiceError, ValidationError};
use crate::persona::Persona;
use crate::question_bank::{Question, QuestionBank};
use crate::speech::{AudioArtifact, AudioSlot, SpeechRenderer};

const AUDIO_UNAVAILABLE_NOTICE: &str =
    "Audio isn't available right now. Read the question above and answer away.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewState {
    AwaitingTopicSelection,
    QuestionDisplayed,
    AudioRequested,
    AudioReady,
    AudioUnavailable,
    AwaitingAnswer,
    FeedbackRequested,
    FeedbackDisplayed,
    FeedbackError,
}

/// A critique tied to the question it was produced for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub topic_label: String,
    pub text: String,
}

/// Everything needed to synthesize the selected question, captured when the
/// request started. Hand it back to [`InterviewSession::finish_audio`].
#[derive(Debug, Clone)]
pub struct AudioRequest {
    epoch: u64,
    pub topic_label: String,
    pub text: String,
    pub voice: Voice,
}

/// Snapshot of the question/answer pair sent for critique. Hand it back to
/// [`InterviewSession::finish_feedback`].
#[derive(Debug, Clone)]
pub struct FeedbackRequest {
    epoch: u64,
    pub topic_label: String,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioOutcome {
    Ready(AudioArtifact),
    /// Text-only fallback. Carries the notice shown to the user.
    Unavailable(String),
    /// The topic changed while the audio was being made; it was dropped.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Displayed(Feedback),
    /// Retryable failure. Carries the banner shown to the user.
    Failed(String),
    /// The topic changed while the critique was in flight; it was dropped.
    Stale,
}

/// One candidate's practice loop: pick a topic, optionally hear it, answer,
/// get feedback, repeat.
///
/// Every selection bumps an epoch. Requests remember the epoch they started
/// in, and results from an older epoch are discarded, so displayed feedback
/// always belongs to the selected question. Only one external request may be
/// in flight at a time.
pub struct InterviewSession {
    bank: Arc<QuestionBank>,
    policy_prompt: String,
    persona: Persona,
    voice: Voice,
    state: InterviewState,
    selected: Option<Question>,
    epoch: u64,
    in_flight: bool,
    answer: String,
    audio: Option<AudioArtifact>,
    feedback: Option<Feedback>,
    notice: Option<String>,
}

impl InterviewSession {
    pub fn new(
        _grant: SessionGrant,
        bank: Arc<QuestionBank>,
        policy_prompt: impl Into<String>,
        voice: Voice,
    ) -> Self {
        Self {
            bank,
            policy_prompt: policy_prompt.into(),
            persona: Persona::default(),
            voice,
            state: InterviewState::AwaitingTopicSelection,
            selected: None,
            epoch: 0,
            in_flight: false,
            answer: String::new(),
            audio: None,
            feedback: None,
            notice: None,
        }
    }

    /// Sets whose voice the session's notices are written in.
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn state(&self) -> InterviewState {
        self.state
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn list_topics(&self) -> Vec<&str> {
        self.bank.list_topics()
    }

    pub fn selected_question(&self) -> Option<&Question> {
        self.selected.as_ref()
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn audio(&self) -> Option<&AudioArtifact> {
        self.audio.as_ref()
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Latest warning or error banner, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Selects a topic. Allowed in every state; anything tied to the previous
    /// question (answer, audio, feedback, pending results) is invalidated.
    pub fn select_topic(&mut self, topic_label: &str) -> Result<&Question, CoachError> {
        let question = self.bank.lookup(topic_label)?.clone();
        tracing::info!("Topic selected: {}", question.topic_label);

        self.epoch += 1;
        self.state = InterviewState::QuestionDisplayed;
        self.answer.clear();
        self.audio = None;
        self.feedback = None;
        self.notice = None;
        Ok(&*self.selected.insert(question))
    }

    pub fn begin_audio(&mut self) -> Result<AudioRequest, CoachError> {
        if self.in_flight {
            return Err(CoachError::Busy);
        }
        let question = self.selected.as_ref().ok_or(CoachError::NoTopicSelected)?;
        let request = AudioRequest {
            epoch: self.epoch,
            topic_label: question.topic_label.clone(),
            text: question.prompt_text.clone(),
            voice: self.voice,
        };

        self.in_flight = true;
        self.state = InterviewState::AudioRequested;
        self.notice = None;
        Ok(request)
    }

    /// Applies the result of an audio request. Never fails: a broken speech
    /// service only switches the session to text-only.
    pub fn finish_audio(
        &mut self,
        request: AudioRequest,
        result: Result<AudioArtifact, CoachError>,
    ) -> AudioOutcome {
        self.in_flight = false;
        if request.epoch != self.epoch {
            tracing::warn!(
                "Discarding audio for '{}', the topic changed",
                request.topic_label
            );
            return AudioOutcome::Stale;
        }

        match result {
            Ok(artifact) => {
                self.state = InterviewState::AudioReady;
                self.audio = Some(artifact.clone());
                AudioOutcome::Ready(artifact)
            }
            Err(err) => {
                tracing::warn!("Audio unavailable for '{}': {}", request.topic_label, err);
                self.state = InterviewState::AudioUnavailable;
                self.audio = None;
                self.notice = Some(AUDIO_UNAVAILABLE_NOTICE.to_string());
                AudioOutcome::Unavailable(AUDIO_UNAVAILABLE_NOTICE.to_string())
            }
        }
    }

    /// Reads the selected question out loud into `slot`.
    ///
    /// Only `Busy` and `NoTopicSelected` come back as errors; speech and
    /// storage failures are folded into [`AudioOutcome::Unavailable`].
    pub async fn request_audio<S>(
        &mut self,
        renderer: &S,
        slot: &AudioSlot,
    ) -> Result<AudioOutcome, CoachError>
    where
        S: SpeechRenderer + ?Sized,
    {
        let request = self.begin_audio()?;
        let result = match renderer.synthesize(&request.text, request.voice).await {
            Ok(audio) => slot.store(&request.topic_label, &audio).await,
            Err(err) => Err(err),
        };
        Ok(self.finish_audio(request, result))
    }

    /// Replaces the draft answer. Any feedback on an earlier draft is cleared.
    pub fn set_answer(&mut self, text: impl Into<String>) -> Result<(), CoachError> {
        if self.selected.is_none() {
            return Err(CoachError::NoTopicSelected);
        }
        self.answer = text.into();
        self.feedback = None;
        if !self.in_flight {
            self.state = InterviewState::AwaitingAnswer;
            self.notice = None;
        }
        Ok(())
    }

    /// Validates the draft and marks a critique as in flight.
    ///
    /// An empty answer moves the session to `FeedbackError` and returns a
    /// validation error; no request is produced, so the critic is never called.
    pub fn begin_feedback(&mut self) -> Result<FeedbackRequest, CoachError> {
        if self.in_flight {
            return Err(CoachError::Busy);
        }
        let question = self.selected.as_ref().ok_or(CoachError::NoTopicSelected)?;

        if self.answer.trim().is_empty() {
            let err = CoachError::from(ValidationError::EmptyAnswer);
            self.state = InterviewState::FeedbackError;
            self.feedback = None;
            self.notice = Some(self.persona.user_message(&err));
            return Err(err);
        }

        let request = FeedbackRequest {
            epoch: self.epoch,
            topic_label: question.topic_label.clone(),
            question: question.prompt_text.clone(),
            answer: self.answer.clone(),
        };
        self.in_flight = true;
        self.state = InterviewState::FeedbackRequested;
        self.notice = None;
        Ok(request)
    }

    pub fn finish_feedback(
        &mut self,
        request: FeedbackRequest,
        result: Result<String, CoachError>,
    ) -> FeedbackOutcome {
        self.in_flight = false;
        if request.epoch != self.epoch {
            tracing::warn!(
                "Discarding feedback for '{}', the topic changed",
                request.topic_label
            );
            return FeedbackOutcome::Stale;
        }

        let result = result.and_then(|text| {
            if text.trim().is_empty() {
                Err(ExternalServiceError::MalformedResponse("empty critique".to_string()).into())
            } else {
                Ok(text)
            }
        });

        match result {
            Ok(text) => {
                let feedback = Feedback {
                    topic_label: request.topic_label,
                    text,
                };
                self.state = InterviewState::FeedbackDisplayed;
                self.answer.clear();
                self.notice = None;
                self.feedback = Some(feedback.clone());
                FeedbackOutcome::Displayed(feedback)
            }
            Err(err) => {
                tracing::warn!("Critique failed for '{}': {}", request.topic_label, err);
                let message = self.persona.user_message(&err);
                self.state = InterviewState::FeedbackError;
                self.feedback = None;
                self.notice = Some(message.clone());
                FeedbackOutcome::Failed(message)
            }
        }
    }

    /// Sends the draft answer for critique.
    ///
    /// Returns `Err` only for local problems (empty answer, no topic, busy).
    /// Service failures come back as [`FeedbackOutcome::Failed`] and leave the
    /// draft in place so the user can simply try again.
    pub async fn request_feedback<C>(&mut self, critic: &C) -> Result<FeedbackOutcome, CoachError>
    where
        C: Critic + ?Sized,
    {
        let request = self.begin_feedback()?;
        let result = critic
            .critique(&self.policy_prompt, &request.question, &request.answer)
            .await;
        Ok(self.finish_feedback(request, result))
    }
}
