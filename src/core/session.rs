//! Session state store.
//!
//! The single authoritative record of quiz progress: started flag, current
//! question index, and the shared instant the question became answerable.
//! Single writer (the admin capability, checked by the caller), any number of
//! watch subscribers. Every mutation bumps a version counter; commands may
//! carry the last-observed version as a compare-and-swap guard so a
//! double-clicked admin button applies once.

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::protocol::SessionView;

/// Whether a command mutated the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// State changed and was broadcast.
    Applied,
    /// Precondition not met (stale version, index at end, not admin);
    /// deliberately silent, never an error.
    Ignored,
}

impl CommandOutcome {
    pub fn applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

pub struct SessionStore {
    started: bool,
    current_question_index: usize,
    question_started_at: Option<DateTime<Utc>>,
    version: u64,
    question_count: usize,
    /// Per-question time limits, carried into the broadcast view.
    time_limits: Vec<u32>,
    tx: watch::Sender<SessionView>,
}

impl SessionStore {
    /// Create the store in the `NotStarted` state.
    ///
    /// The watch channel is seeded with the default document at construction,
    /// so the first subscriber always observes an initialized session; there
    /// is no lazy-create race.
    pub fn new(time_limits: Vec<u32>) -> Self {
        let question_count = time_limits.len();
        let first_limit = time_limits.first().copied().unwrap_or(0);
        let (tx, _rx) = watch::channel(SessionView::not_started(first_limit));
        Self {
            started: false,
            current_question_index: 0,
            question_started_at: None,
            version: 0,
            question_count,
            time_limits,
            tx,
        }
    }

    /// Subscribe to session snapshots. The receiver immediately holds the
    /// current document.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.tx.subscribe()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            started: self.started,
            current_question_index: self.current_question_index,
            question_started_at: self.question_started_at,
            time_limit_seconds: self.current_time_limit(),
            version: self.version,
        }
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn question_started_at(&self) -> Option<DateTime<Utc>> {
        self.question_started_at
    }

    pub fn current_time_limit(&self) -> u32 {
        self.time_limits
            .get(self.current_question_index)
            .copied()
            .unwrap_or(0)
    }

    /// Begin a run at question 0, stamping the shared start instant.
    /// Starting an already-running session restarts question 0.
    pub fn start(&mut self, now: DateTime<Utc>, expected_version: Option<u64>) -> CommandOutcome {
        if self.stale(expected_version) {
            return CommandOutcome::Ignored;
        }
        self.started = true;
        self.current_question_index = 0;
        self.question_started_at = Some(now);
        self.publish();
        CommandOutcome::Applied
    }

    /// Move to the next question and restamp the start instant. A no-op at
    /// the last question or before `start`; the index never exceeds
    /// `question_count - 1` and never moves backward while started.
    pub fn advance(&mut self, now: DateTime<Utc>, expected_version: Option<u64>) -> CommandOutcome {
        if self.stale(expected_version) {
            return CommandOutcome::Ignored;
        }
        if !self.started || self.current_question_index + 1 >= self.question_count {
            return CommandOutcome::Ignored;
        }
        self.current_question_index += 1;
        self.question_started_at = Some(now);
        self.publish();
        CommandOutcome::Applied
    }

    /// Stop the run and rewind to question 0. The only transition out of the
    /// last question.
    pub fn reset(&mut self, expected_version: Option<u64>) -> CommandOutcome {
        if self.stale(expected_version) {
            return CommandOutcome::Ignored;
        }
        self.started = false;
        self.current_question_index = 0;
        self.question_started_at = None;
        self.publish();
        CommandOutcome::Applied
    }

    fn stale(&self, expected_version: Option<u64>) -> bool {
        expected_version.is_some_and(|v| v != self.version)
    }

    fn publish(&mut self) {
        self.version += 1;
        let _ = self.tx.send(self.view());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn store() -> SessionStore {
        SessionStore::new(vec![30, 20, 40])
    }

    #[test]
    fn test_initial_view_is_not_started() {
        let store = store();
        let view = store.view();
        assert!(!view.started);
        assert_eq!(view.current_question_index, 0);
        assert_eq!(view.question_started_at, None);
        assert_eq!(view.time_limit_seconds, 30);
        assert_eq!(view.version, 0);
    }

    #[test]
    fn test_start_stamps_question_zero() {
        let mut store = store();
        assert!(store.start(t0(), None).applied());
        assert!(store.started());
        assert_eq!(store.current_question_index(), 0);
        assert_eq!(store.question_started_at(), Some(t0()));
    }

    #[test]
    fn test_advance_increments_once_per_call_and_stops_at_end() {
        let mut store = store();
        store.start(t0(), None);
        assert!(store.advance(t0(), None).applied());
        assert_eq!(store.current_question_index(), 1);
        assert_eq!(store.current_time_limit(), 20);
        assert!(store.advance(t0(), None).applied());
        assert_eq!(store.current_question_index(), 2);

        // Last question: advance is a no-op.
        assert!(!store.advance(t0(), None).applied());
        assert_eq!(store.current_question_index(), 2);
    }

    #[test]
    fn test_advance_before_start_is_ignored() {
        let mut store = store();
        assert!(!store.advance(t0(), None).applied());
        assert!(!store.started());
    }

    #[test]
    fn test_advance_restamps_start_instant() {
        let mut store = store();
        store.start(t0(), None);
        let later = t0() + chrono::TimeDelta::seconds(45);
        store.advance(later, None);
        assert_eq!(store.question_started_at(), Some(later));
    }

    #[test]
    fn test_reset_returns_to_not_started() {
        let mut store = store();
        store.start(t0(), None);
        store.advance(t0(), None);
        assert!(store.reset(None).applied());
        assert!(!store.started());
        assert_eq!(store.current_question_index(), 0);
        assert_eq!(store.question_started_at(), None);
    }

    #[test]
    fn test_stale_version_is_ignored() {
        let mut store = store();
        store.start(t0(), None);
        let observed = store.view().version;

        // First advance against the observed version applies; replaying the
        // same command (a double-click) is ignored.
        assert!(store.advance(t0(), Some(observed)).applied());
        assert!(!store.advance(t0(), Some(observed)).applied());
        assert_eq!(store.current_question_index(), 1);
    }

    #[test]
    fn test_omitted_version_applies_unconditionally() {
        let mut store = store();
        store.start(t0(), None);
        store.advance(t0(), None);

        // Without an expected version there is no guard: a repeated start
        // rewinds to question 0 with a fresh stamp.
        let later = t0() + chrono::TimeDelta::seconds(90);
        assert!(store.start(later, None).applied());
        assert_eq!(store.current_question_index(), 0);
        assert_eq!(store.question_started_at(), Some(later));
    }

    #[test]
    fn test_every_mutation_bumps_version() {
        let mut store = store();
        let v0 = store.view().version;
        store.start(t0(), None);
        let v1 = store.view().version;
        store.advance(t0(), None);
        let v2 = store.view().version;
        store.reset(None);
        let v3 = store.view().version;
        assert!(v0 < v1 && v1 < v2 && v2 < v3);
    }

    #[test]
    fn test_subscriber_sees_latest_document() {
        let mut store = store();
        let rx = store.subscribe();
        assert!(!rx.borrow().started);

        store.start(t0(), None);
        store.advance(t0(), None);
        let view = rx.borrow().clone();
        assert!(view.started);
        assert_eq!(view.current_question_index, 1);
    }
}
