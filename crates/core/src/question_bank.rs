use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use thiserror::Error;

use crate::error::CoachError;

/// One interview question, keyed by its topic label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub topic_label: String,
    pub prompt_text: String,
}

impl Question {
    pub fn new(topic_label: impl Into<String>, prompt_text: impl Into<String>) -> Self {
        Self {
            topic_label: topic_label.into(),
            prompt_text: prompt_text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("topic label '{0}' appears more than once")]
    DuplicateLabel(String),
    #[error("topic '{0}' has no question text")]
    EmptyPrompt(String),
    #[error("a question bank needs at least one question")]
    NoQuestions,
}

// Utility / Leasehand questions, grouped by category. Order is display order.
const FIFO_QUESTIONS: &[(&str, &str)] = &[
    (
        "Logistics: 1. Flying In",
        "Your flight to site leaves Perth at 5am on swing day. How will you make sure you never miss a flight?",
    ),
    (
        "Logistics: 2. Fit For Work",
        "We run drug and alcohol testing at the airport and on site. How do you make sure you turn up fit for work every swing?",
    ),
    (
        "Lifestyle: 3. The Roster",
        "The roster is 2 weeks on, 1 week off. You'll miss birthdays and it's 40 degrees in the shade. Why do you think you can handle the FIFO lifestyle?",
    ),
    (
        "Lifestyle: 4. Time Away",
        "How does your family feel about you being away for two weeks at a time, and how will you stay connected with them?",
    ),
    (
        "Camp Life: 5. Conflict",
        "You're tired, it's day 13, and a crew mate is being difficult in the mess hall. How do you handle the conflict without causing drama?",
    ),
    (
        "Camp Life: 6. Camp Etiquette",
        "Camp is shared space: the crib room, the laundry, the wet mess. What does good camp etiquette look like to you?",
    ),
    (
        "Safety: 7. Hazard Spotting",
        "Safety is our #1 priority. Tell me about a time you saw a hazard or something unsafe at work. What did you do?",
    ),
    (
        "Safety: 8. Stop Work Authority",
        "What does Stop Work Authority mean to you, and when would you use it?",
    ),
    (
        "Safety: 9. Unsafe Orders",
        "Your supervisor tells you to skip a safety step to get the job done faster. What do you do?",
    ),
    (
        "Work Ethic: 10. Entry Level Tasks",
        "As a Utility you'll be cleaning, carrying and doing the jobs nobody else wants. Why should we believe you'll still give it 100% on day 13?",
    ),
    (
        "Work Ethic: 11. Taking Direction",
        "Tell me about a time you were given feedback you didn't agree with. What did you do about it?",
    ),
    (
        "Work Ethic: 12. Why FIFO",
        "Why do you want to work FIFO, and where do you see yourself in two years?",
    ),
];

/// Ordered, immutable set of questions. Built once at startup.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        for (idx, question) in questions.iter().enumerate() {
            if question.prompt_text.trim().is_empty() {
                return Err(BankError::EmptyPrompt(question.topic_label.clone()));
            }
            if questions[..idx]
                .iter()
                .any(|earlier| earlier.topic_label == question.topic_label)
            {
                return Err(BankError::DuplicateLabel(question.topic_label.clone()));
            }
        }

        let bank = Self { questions };
        if bank.is_empty() {
            return Err(BankError::NoQuestions);
        }
        Ok(bank)
    }

    /// The built-in bank for entry-level FIFO roles.
    pub fn fifo() -> Self {
        Self {
            questions: FIFO_QUESTIONS
                .iter()
                .map(|(label, text)| Question::new(*label, *text))
                .collect(),
        }
    }

    pub fn list_topics(&self) -> Vec<&str> {
        self.questions
            .iter()
            .map(|q| q.topic_label.as_str())
            .collect()
    }

    pub fn get_question(&self, topic_label: &str) -> Result<&str, CoachError> {
        self.lookup(topic_label).map(|q| q.prompt_text.as_str())
    }

    pub fn lookup(&self, topic_label: &str) -> Result<&Question, CoachError> {
        self.questions
            .iter()
            .find(|q| q.topic_label == topic_label)
            .ok_or_else(|| CoachError::NotFound(topic_label.to_string()))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Resolves what a user typed into a topic from the bank.
    ///
    /// Accepts a 1-based position, an exact label (any case) or a fuzzy
    /// fragment such as `"unsafe"`. The best fuzzy match wins.
    pub fn find_topic(&self, query: &str) -> Option<&Question> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        if let Ok(position) = query.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|idx| self.questions.get(idx));
        }

        if let Some(exact) = self
            .questions
            .iter()
            .find(|q| q.topic_label.eq_ignore_ascii_case(query))
        {
            return Some(exact);
        }

        let matcher = SkimMatcherV2::default();
        let query = query.to_lowercase();
        self.questions
            .iter()
            .filter_map(|q| {
                matcher
                    .fuzzy_match(&q.topic_label.to_lowercase(), &query)
                    .map(|score| (score, q))
            })
            .max_by_key(|(score, _)| *score)
            .map(|(_, q)| q)
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::fifo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_topic_has_stable_non_empty_text() {
        let bank = QuestionBank::fifo();
        for topic in bank.list_topics() {
            let first = bank.get_question(topic).unwrap();
            let second = bank.get_question(topic).unwrap();
            assert!(!first.trim().is_empty(), "{topic} has no text");
            assert_eq!(first, second);
        }
    }

    #[test]
    fn builtin_labels_are_unique() {
        let bank = QuestionBank::fifo();
        let rebuilt = QuestionBank::new(bank.questions.clone());
        assert!(rebuilt.is_ok());
        assert_eq!(bank.len(), 12);
    }

    #[test]
    fn unsafe_orders_is_the_safety_refusal_question() {
        let bank = QuestionBank::fifo();
        assert_eq!(
            bank.get_question("Safety: 9. Unsafe Orders").unwrap(),
            "Your supervisor tells you to skip a safety step to get the job done faster. What do you do?"
        );
    }

    #[test]
    fn unknown_label_is_not_found() {
        let bank = QuestionBank::fifo();
        assert_eq!(
            bank.get_question("Safety: 99. Missing"),
            Err(CoachError::NotFound("Safety: 99. Missing".into()))
        );
    }

    #[test]
    fn rejects_duplicate_labels_and_empty_prompts() {
        let dup = QuestionBank::new(vec![Question::new("A", "one"), Question::new("A", "two")]);
        assert_eq!(dup.unwrap_err(), BankError::DuplicateLabel("A".into()));

        let empty = QuestionBank::new(vec![Question::new("B", "  ")]);
        assert_eq!(empty.unwrap_err(), BankError::EmptyPrompt("B".into()));

        assert_eq!(QuestionBank::new(Vec::new()).unwrap_err(), BankError::NoQuestions);
    }

    #[test]
    fn find_topic_by_position_label_and_fragment() {
        let bank = QuestionBank::fifo();

        assert_eq!(
            bank.find_topic("9").map(|q| q.topic_label.as_str()),
            Some("Safety: 9. Unsafe Orders")
        );
        assert_eq!(
            bank.find_topic("safety: 9. unsafe orders")
                .map(|q| q.topic_label.as_str()),
            Some("Safety: 9. Unsafe Orders")
        );
        assert_eq!(
            bank.find_topic("unsafe").map(|q| q.topic_label.as_str()),
            Some("Safety: 9. Unsafe Orders")
        );
        assert!(bank.find_topic("0").is_none());
        assert!(bank.find_topic("13").is_none());
        assert!(bank.find_topic("   ").is_none());
    }
}
