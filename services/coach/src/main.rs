use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use coach_core::{
    AccessGate, AudioSlot, CriticClient, InterviewSession, OpenAiHttp, Persona, QuestionBank,
    SpeechClient,
};
use coach_service::config::Config;
use coach_service::console::{self, Console};
use coach_service::prompt_loader;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Practice FIFO mining job interviews against an AI recruiter")]
struct Cli {
    /// Topic to start on: a number, a label or part of one
    #[arg(long)]
    topic: Option<String>,

    /// Interviewer persona for this run (recruiter or esl-coach)
    #[arg(long)]
    persona: Option<Persona>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // --- 2. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 3. Initialize Logging ---
    // Logs go to stderr so they never interleave with the interview on stdout.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Configuration loaded successfully. Starting FIFO coach...");

    // --- 4. Load Policy Prompt ---
    let persona = args.persona.unwrap_or(config.persona);
    let policy_prompt = prompt_loader::resolve_policy_prompt(persona, config.prompts_dir.as_deref())
        .context("Failed to load the policy prompt")?;
    tracing::info!("Interviewer persona: {}", persona);

    // --- 5. Initialize API Clients ---
    let http = Arc::new(
        OpenAiHttp::new(config.openai_api_key, &config.base_url, config.request_timeout)
            .context("Failed to build the OpenAI HTTP client")?,
    );
    let critic = CriticClient::new(http.clone(), &config.chat_model);
    let speech = SpeechClient::new(http, &config.speech_model).with_format(config.speech_format);
    let slot = AudioSlot::new(&config.audio_cache_dir, AudioSlot::DEFAULT_NAME, speech.format());
    tracing::debug!("Question audio will be written to {}", slot.path().display());

    // --- 6. Access Gate ---
    let gate = match config.access_passphrase {
        Some(passphrase) => AccessGate::with_passphrase(passphrase),
        None => AccessGate::open(),
    };

    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}\n", console::banner(persona))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let Some(grant) = console::unlock(&gate, &mut lines, &mut stdout).await? else {
        tracing::info!("Input closed before access was granted");
        return Ok(());
    };

    // --- 7. Session Setup ---
    let mut session = InterviewSession::new(
        grant,
        Arc::new(QuestionBank::fifo()),
        policy_prompt,
        config.voice,
    )
    .with_persona(persona);
    let mut console = Console::new(&mut session, &critic, &speech, &slot, persona, stdout);

    match args.topic {
        Some(topic) => console.select(&topic)?,
        None => writeln!(
            std::io::stdout(),
            "Type 'topics' to see the questions, then 'select <n>' to start."
        )?,
    }

    // --- 8. Main Loop ---
    tokio::select! {
        result = console.run(&mut lines) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
        }
    }

    Ok(())
}
