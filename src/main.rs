use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quiz_sync::{load_questions_from_json, protocol::DEFAULT_PORT, QuizCore};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON file to load the question catalog from
    #[arg(short, long)]
    questions: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Reserved admin identity; joining with this name grants session control
    #[arg(long, env = "QUIZ_ADMIN_NAME")]
    admin_name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let questions = load_questions_from_json(&args.questions)
        .with_context(|| format!("loading questions from {}", args.questions.display()))?;
    info!(count = questions.len(), "loaded question catalog");

    let core = QuizCore::new(questions, args.admin_name).into_shared();
    quiz_sync::server::run(args.port, core).await?;

    Ok(())
}
