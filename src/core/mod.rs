//! Session synchronization core.
//!
//! The authoritative quiz state shared by every connection: session progress,
//! participant registry, score ledger, and the derived leaderboard. All
//! mutation goes through [`QuizCore`] behind one lock, which makes the
//! answer-record check-and-set and the session compare-and-swap atomic.

mod ledger;
mod leaderboard;
mod registry;
mod session;
pub mod timer;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::models::Question;
use crate::protocol::{LeaderboardEntry, SessionView};

pub use ledger::{points_for, BASE_POINTS};
pub use registry::{AdminKey, JoinError, JoinOutcome};
pub use session::CommandOutcome;

use ledger::Ledger;
use registry::Registry;
use session::SessionStore;

/// Shared core wrapped for async access from every connection task.
pub type SharedCore = Arc<Mutex<QuizCore>>;

/// Why a submission was not scored. Rejections are silent: the submitter gets
/// `accepted = false`, nobody else sees anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The admin identity never holds a scoreable entry.
    AdminCaller,
    /// Name is not a joined participant.
    NotJoined,
    /// Session has not been started.
    NotStarted,
    /// Submission targets a question other than the current one.
    NotCurrentQuestion,
    /// The answer window elapsed before the submission arrived.
    WindowClosed,
    /// An answer record already exists for this participant and question.
    AlreadyAnswered,
}

/// Outcome of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The attempt was consumed. `awarded` is zero for an incorrect answer.
    Accepted { correct: bool, awarded: u32 },
    Rejected(RejectReason),
}

impl SubmitOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn correct(&self) -> bool {
        matches!(self, Self::Accepted { correct: true, .. })
    }
}

pub struct QuizCore {
    questions: Vec<Question>,
    registry: Registry,
    ledger: Ledger,
    session: SessionStore,
    leaderboard_tx: watch::Sender<Vec<LeaderboardEntry>>,
}

impl QuizCore {
    pub fn new(questions: Vec<Question>, admin_name: String) -> Self {
        let time_limits = questions.iter().map(|q| q.time_limit_seconds).collect();
        let (leaderboard_tx, _rx) = watch::channel(Vec::new());
        Self {
            questions,
            registry: Registry::new(admin_name),
            ledger: Ledger::new(),
            session: SessionStore::new(time_limits),
            leaderboard_tx,
        }
    }

    pub fn into_shared(self) -> SharedCore {
        Arc::new(Mutex::new(self))
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Subscribe to session snapshots; the receiver immediately holds the
    /// current document.
    pub fn subscribe_session(&self) -> watch::Receiver<SessionView> {
        self.session.subscribe()
    }

    /// Subscribe to leaderboard updates.
    pub fn subscribe_leaderboard(&self) -> watch::Receiver<Vec<LeaderboardEntry>> {
        self.leaderboard_tx.subscribe()
    }

    pub fn session_view(&self) -> SessionView {
        self.session.view()
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        leaderboard::compute(&self.registry)
    }

    /// Join with a display name. Publishes the leaderboard when a scoreable
    /// entry appears.
    pub fn join(&mut self, name: &str) -> Result<JoinOutcome, JoinError> {
        let outcome = self.registry.join(name)?;
        match &outcome {
            JoinOutcome::Admin(_) => info!(name, "admin joined"),
            JoinOutcome::Participant { rejoined } => {
                info!(name, rejoined, "participant joined");
                if !rejoined {
                    self.publish_leaderboard();
                }
            }
        }
        Ok(outcome)
    }

    /// Remove a participant and its leaderboard entry. A later rejoin starts
    /// back at score 0; only a reconnect without leaving keeps the score.
    pub fn leave(&mut self, name: &str) -> bool {
        let removed = self.registry.leave(name);
        if removed {
            info!(name, "participant left");
            self.publish_leaderboard();
        }
        removed
    }

    /// Admin command: begin a run at question 0. Clears all answer records so
    /// every question of the fresh run is answerable again.
    pub fn start(
        &mut self,
        key: &AdminKey,
        expected_version: Option<u64>,
        now: DateTime<Utc>,
    ) -> CommandOutcome {
        if !self.registry.verify(key) {
            warn!("start rejected: invalid admin key");
            return CommandOutcome::Ignored;
        }
        let outcome = self.session.start(now, expected_version);
        if outcome.applied() {
            self.ledger.clear();
            info!("session started");
        }
        outcome
    }

    /// Admin command: move to the next question. No-op at the last question.
    pub fn advance(
        &mut self,
        key: &AdminKey,
        expected_version: Option<u64>,
        now: DateTime<Utc>,
    ) -> CommandOutcome {
        if !self.registry.verify(key) {
            warn!("advance rejected: invalid admin key");
            return CommandOutcome::Ignored;
        }
        let outcome = self.session.advance(now, expected_version);
        if outcome.applied() {
            info!(
                question_index = self.session.current_question_index(),
                "advanced to next question"
            );
        }
        outcome
    }

    /// Admin command: stop the run and rewind to question 0. Scores are kept;
    /// they only disappear when a participant leaves.
    pub fn reset(&mut self, key: &AdminKey, expected_version: Option<u64>) -> CommandOutcome {
        if !self.registry.verify(key) {
            warn!("reset rejected: invalid admin key");
            return CommandOutcome::Ignored;
        }
        let outcome = self.session.reset(expected_version);
        if outcome.applied() {
            info!("session reset");
        }
        outcome
    }

    /// Submit an answer for the current question.
    ///
    /// The remaining time used for the bonus is derived here from the shared
    /// start instant, never taken from the client. The answer record is
    /// written before the score, under the same lock, so a retry or reconnect
    /// can never score twice.
    pub fn submit_answer(
        &mut self,
        name: &str,
        question_index: usize,
        option: &str,
        now: DateTime<Utc>,
    ) -> SubmitOutcome {
        let name = name.trim();

        if self.registry.is_admin_name(name) {
            return self.reject(name, question_index, RejectReason::AdminCaller);
        }
        if self.registry.get(name).is_none() {
            return self.reject(name, question_index, RejectReason::NotJoined);
        }

        if !self.session.started() {
            return self.reject(name, question_index, RejectReason::NotStarted);
        }
        if question_index != self.session.current_question_index() {
            return self.reject(name, question_index, RejectReason::NotCurrentQuestion);
        }
        let (Some(started_at), Some(question)) = (
            self.session.question_started_at(),
            self.questions.get(question_index),
        ) else {
            return self.reject(name, question_index, RejectReason::NotStarted);
        };

        let remaining = timer::remaining_seconds(question.time_limit_seconds, started_at, now);
        if remaining == 0 {
            return self.reject(name, question_index, RejectReason::WindowClosed);
        }

        if !self.ledger.try_consume(name, question_index) {
            return self.reject(name, question_index, RejectReason::AlreadyAnswered);
        }

        let correct = question.is_correct(option);
        let awarded = if correct { points_for(remaining) } else { 0 };
        if correct {
            self.registry.credit(name, awarded);
            self.publish_leaderboard();
        }

        info!(name, question_index, correct, awarded, "answer accepted");
        SubmitOutcome::Accepted { correct, awarded }
    }

    fn reject(&self, name: &str, question_index: usize, reason: RejectReason) -> SubmitOutcome {
        debug!(name, question_index, ?reason, "submission rejected");
        SubmitOutcome::Rejected(reason)
    }

    fn publish_leaderboard(&self) {
        let _ = self.leaderboard_tx.send(leaderboard::compute(&self.registry));
    }
}
