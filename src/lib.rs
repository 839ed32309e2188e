//! # quiz-sync
//!
//! Session synchronization core for a multi-participant live quiz.
//!
//! One admin advances a shared sequence of questions; participants submit one
//! answer each within a per-question time window and accumulate scores on a
//! shared leaderboard. The crate owns the authoritative session state machine,
//! the answer-window discipline, scoring, and the admin capability check;
//! rendering and asset delivery are left to clients.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quiz_sync::{load_questions_from_json, QuizCore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let questions = load_questions_from_json("questions.json")?;
//!     let core = QuizCore::new(questions, "quizmaster-secret".to_string()).into_shared();
//!     quiz_sync::server::run(8712, core).await?;
//!     Ok(())
//! }
//! ```

mod core;
mod data;
mod models;
pub mod protocol;
pub mod server;

pub use self::core::{
    points_for, AdminKey, CommandOutcome, JoinError, JoinOutcome, QuizCore, RejectReason,
    SharedCore, SubmitOutcome, BASE_POINTS,
};
pub use data::{load_questions_from_json, LoadError, MAX_OPTIONS, MIN_OPTIONS};
pub use models::Question;
