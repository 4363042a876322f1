use std::fmt;
use std::str::FromStr;

use crate::error::{CoachError, ValidationError};

/// Longest answer forwarded to the critique model, in characters.
/// Anything beyond this is cut before the request is built.
pub const MAX_ANSWER_CHARS: usize = 4000;

const RECRUITER_PROMPT: &str = "\
You are a tough but fair Australian Mining HR Recruiter named Bluey.
You are interviewing a candidate for an entry-level FIFO role (Utility/Leasehand).
Your feedback must be based on:
1. SAFETY (Stop Work Authority is king).
2. RESILIENCE (Can they handle 12hr shifts/heat/flies?).
3. TEAM FIT (No drama, 'camp etiquette').
Tone: Use light Australian slang (mate, swing, crib room), but be deadly serious about safety.
";

const ESL_COACH_PROMPT: &str = "\
You are a patient, encouraging English-language interview coach.
The candidate is practising for an entry-level FIFO mining role (Utility/Leasehand) in Australia
and English may not be their first language.
Your feedback must cover:
1. CONTENT (Did they answer the question, with a real example where one was asked for?).
2. CLARITY (Grammar and word choice. Quote a phrase and show a more natural way to say it).
3. CONFIDENCE (Suggest one stronger sentence they could use in the real interview).
Tone: Warm and supportive. Use plain English, short sentences, and explain any mining slang you use.
";

/// The interviewer persona a deployment runs with. Fixed for the life of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Persona {
    #[default]
    Recruiter,
    EslCoach,
}

impl Persona {
    /// Name used in configuration and as the prompt override file stem.
    pub fn key(&self) -> &'static str {
        match self {
            Persona::Recruiter => "recruiter",
            Persona::EslCoach => "esl-coach",
        }
    }

    pub fn policy_prompt(&self) -> &'static str {
        match self {
            Persona::Recruiter => RECRUITER_PROMPT,
            Persona::EslCoach => ESL_COACH_PROMPT,
        }
    }

    pub fn greeting(&self) -> &'static str {
        match self {
            Persona::Recruiter => {
                "G'day! I'm 'Bluey', your AI Interviewer. I'm going to ask you the tough questions Australian mining HR managers actually ask."
            }
            Persona::EslCoach => {
                "Hello! I'm your interview coach. Take your time, answer in your own words, and I'll help you sound clear and confident."
            }
        }
    }

    pub fn progress_line(&self) -> &'static str {
        match self {
            Persona::Recruiter => "Reviewing your answer against site safety protocols...",
            Persona::EslCoach => "Reading your answer carefully...",
        }
    }

    pub fn empty_answer_warning(&self) -> &'static str {
        match self {
            Persona::Recruiter => "Please type an answer first, mate!",
            Persona::EslCoach => "Please write your answer first. A few short sentences are fine.",
        }
    }

    pub fn farewell(&self) -> &'static str {
        match self {
            Persona::Recruiter => "See ya, mate. Good luck on site!",
            Persona::EslCoach => "Well done today. Good luck with your interview!",
        }
    }

    /// Console text for `err` in this persona's voice. Only the empty-answer
    /// warning differs; everything else uses [`CoachError::user_message`].
    pub fn user_message(&self, err: &CoachError) -> String {
        match err {
            CoachError::Validation(ValidationError::EmptyAnswer) => {
                self.empty_answer_warning().to_string()
            }
            other => other.user_message(),
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recruiter" | "bluey" => Ok(Persona::Recruiter),
            "esl-coach" | "esl" | "coach" => Ok(Persona::EslCoach),
            other => Err(format!(
                "unknown persona '{other}', expected 'recruiter' or 'esl-coach'"
            )),
        }
    }
}

/// Builds the single user turn sent alongside the policy prompt. The answer
/// goes in as typed, only cut to [`MAX_ANSWER_CHARS`].
pub fn critique_request_text(question: &str, answer: &str) -> String {
    let answer = truncate_chars(answer, MAX_ANSWER_CHARS);
    format!("The Question: {question}. Candidate Answer: {answer}. Critique this answer.")
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
