//! Line-oriented front end for the interview session.
//!
//! Reads commands from any async line source and writes everything the
//! candidate sees to a `std::io::Write`, so the whole loop can be driven from
//! a byte slice in tests.

use std::io::Write;

use anyhow::Result;
use coach_core::{
    AccessGate, AudioOutcome, AudioSlot, CoachError, Critic, FeedbackOutcome, InterviewSession,
    Persona, SessionGrant, SpeechRenderer,
};
use tokio::io::{AsyncBufRead, Lines};

pub const ROLE_LINE: &str = "Role: Entry Level Utility / Leasehand";

const HELP: &str = "\
Commands:
  topics              list the interview topics
  select <n|label>    pick a topic by number, label or a fragment of it
  question            show the current question again
  listen              read the question out loud (saved as an audio file)
  answer [text]       type your answer; without text, finish with an empty line
  feedback            get the interviewer's critique of your answer
  status              show where you are
  help                show this list
  quit                leave the simulator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Topics,
    Select(String),
    Question,
    Listen,
    /// `None` means the answer follows on the next lines.
    Answer(Option<String>),
    Feedback,
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_command(line: &str) -> ConsoleCommand {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_lowercase().as_str() {
        "" => ConsoleCommand::Empty,
        "topics" | "list" => ConsoleCommand::Topics,
        "select" | "topic" => ConsoleCommand::Select(rest.to_string()),
        "question" | "show" => ConsoleCommand::Question,
        "listen" | "play" => ConsoleCommand::Listen,
        "answer" => {
            if rest.is_empty() {
                ConsoleCommand::Answer(None)
            } else {
                ConsoleCommand::Answer(Some(rest.to_string()))
            }
        }
        "feedback" | "submit" => ConsoleCommand::Feedback,
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => ConsoleCommand::Unknown(verb.to_string()),
    }
}

pub fn banner(persona: Persona) -> String {
    format!(
        "🦺 FIFO Job Interview Simulator\n{}\n👋 {}\nType 'help' for commands.",
        ROLE_LINE,
        persona.greeting()
    )
}

pub fn render_topics(session: &InterviewSession) -> String {
    let selected = session.selected_question().map(|q| q.topic_label.as_str());
    session
        .list_topics()
        .into_iter()
        .map(|label| {
            let marker = if Some(label) == selected { ">" } else { " " };
            format!("{marker} {label}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_status(session: &InterviewSession) -> String {
    let mut lines = vec![format!("State: {:?}", session.state())];
    match session.selected_question() {
        Some(question) => lines.push(format!("Topic: {}", question.topic_label)),
        None => lines.push("Topic: none selected".to_string()),
    }
    if !session.answer().trim().is_empty() {
        lines.push(format!(
            "Draft answer: {} characters",
            session.answer().chars().count()
        ));
    }
    if let Some(audio) = session.audio() {
        lines.push(format!("Audio: {}", audio.path.display()));
    }
    if let Some(notice) = session.notice() {
        lines.push(format!("Notice: {notice}"));
    }
    lines.join("\n")
}

/// Asks for the passphrase until it is right. `None` means the input ended
/// before access was granted.
pub async fn unlock<R, W>(
    gate: &AccessGate,
    lines: &mut Lines<R>,
    out: &mut W,
) -> Result<Option<SessionGrant>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if let Some(grant) = gate.grant_if_open() {
        return Ok(Some(grant));
    }

    loop {
        write!(out, "Enter password: ")?;
        out.flush()?;
        let Some(attempt) = lines.next_line().await? else {
            return Ok(None);
        };
        match gate.unlock(&attempt) {
            Ok(grant) => return Ok(Some(grant)),
            Err(err) => writeln!(out, "⛔ {}", err.user_message())?,
        }
    }
}

pub struct Console<'a, C, S, W> {
    session: &'a mut InterviewSession,
    critic: &'a C,
    speech: &'a S,
    slot: &'a AudioSlot,
    persona: Persona,
    out: W,
}

impl<'a, C, S, W> Console<'a, C, S, W>
where
    C: Critic,
    S: SpeechRenderer,
    W: Write,
{
    pub fn new(
        session: &'a mut InterviewSession,
        critic: &'a C,
        speech: &'a S,
        slot: &'a AudioSlot,
        persona: Persona,
        out: W,
    ) -> Self {
        Self {
            session,
            critic,
            speech,
            slot,
            persona,
            out,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Runs commands until `quit` or the end of input.
    pub async fn run<R>(&mut self, lines: &mut Lines<R>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_command(&line) {
                ConsoleCommand::Empty => {}
                ConsoleCommand::Quit => break,
                ConsoleCommand::Help => writeln!(self.out, "{HELP}")?,
                ConsoleCommand::Topics => writeln!(self.out, "{}", render_topics(self.session))?,
                ConsoleCommand::Status => writeln!(self.out, "{}", render_status(self.session))?,
                ConsoleCommand::Select(query) => self.select(&query)?,
                ConsoleCommand::Question => self.show_question()?,
                ConsoleCommand::Listen => self.listen().await?,
                ConsoleCommand::Answer(Some(text)) => self.answer(text)?,
                ConsoleCommand::Answer(None) => {
                    writeln!(self.out, "Type your answer. Finish with an empty line.")?;
                    let text = read_block(lines).await?;
                    self.answer(text)?;
                }
                ConsoleCommand::Feedback => self.feedback().await?,
                ConsoleCommand::Unknown(verb) => {
                    writeln!(self.out, "Unknown command '{verb}'. Type 'help' for commands.")?
                }
            }
        }

        writeln!(self.out, "{}", self.persona.farewell())?;
        Ok(())
    }

    /// Selects a topic from a number, a label or a fragment of one.
    pub fn select(&mut self, query: &str) -> Result<()> {
        if query.is_empty() {
            writeln!(
                self.out,
                "Usage: select <1-{}|label>",
                self.session.bank().len()
            )?;
            return Ok(());
        }

        let label = match self.session.bank().find_topic(query) {
            Some(question) => question.topic_label.clone(),
            None => {
                writeln!(self.out, "No topic matches '{query}'. Type 'topics' to see them all.")?;
                return Ok(());
            }
        };

        match self.session.select_topic(&label) {
            Ok(_) => self.show_question()?,
            Err(err) => self.report(&err)?,
        }
        Ok(())
    }

    fn show_question(&mut self) -> Result<()> {
        match self.session.selected_question() {
            Some(question) => writeln!(
                self.out,
                "\n🗣️ Question ({}):\n{}\n",
                question.topic_label, question.prompt_text
            )?,
            None => self.report(&CoachError::NoTopicSelected)?,
        }
        Ok(())
    }

    async fn listen(&mut self) -> Result<()> {
        writeln!(self.out, "Generating audio...")?;
        match self.session.request_audio(self.speech, self.slot).await {
            Ok(AudioOutcome::Ready(artifact)) => writeln!(
                self.out,
                "🔊 Audio ready: {} ({} bytes, {})",
                artifact.path.display(),
                artifact.size,
                artifact.format.mime_type()
            )?,
            Ok(AudioOutcome::Unavailable(notice)) => writeln!(self.out, "🔇 {notice}")?,
            Ok(AudioOutcome::Stale) => {}
            Err(err) => self.report(&err)?,
        }
        Ok(())
    }

    fn answer(&mut self, text: String) -> Result<()> {
        match self.session.set_answer(text) {
            Ok(()) => writeln!(
                self.out,
                "Answer saved ({} characters). Type 'feedback' when you're ready.",
                self.session.answer().chars().count()
            )?,
            Err(err) => self.report(&err)?,
        }
        Ok(())
    }

    async fn feedback(&mut self) -> Result<()> {
        // Checked here so the progress line only shows for real requests.
        if self.session.selected_question().is_some() && !self.session.answer().trim().is_empty()
        {
            writeln!(self.out, "{}", self.persona.progress_line())?;
        }

        match self.session.request_feedback(self.critic).await {
            Ok(FeedbackOutcome::Displayed(feedback)) => {
                writeln!(self.out, "\n✅ Feedback:\n{}\n", feedback.text)?
            }
            Ok(FeedbackOutcome::Failed(message)) => writeln!(self.out, "❌ {message}")?,
            Ok(FeedbackOutcome::Stale) => {}
            Err(err) => self.report(&err)?,
        }
        Ok(())
    }

    fn report(&mut self, err: &CoachError) -> Result<()> {
        writeln!(self.out, "⚠️ {}", self.persona.user_message(err))?;
        Ok(())
    }
}

/// Collects lines up to the first empty one (or the end of input).
async fn read_block<R>(lines: &mut Lines<R>) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut block = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            break;
        }
        block.push(line);
    }
    Ok(block.join("\n"))
}
