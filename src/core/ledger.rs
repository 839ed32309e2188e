//! Score ledger.
//!
//! Holds the answer records that guarantee at most one scoring transaction
//! per `(participant, question)` pair, across retries and reconnects. The
//! record is written for incorrect answers too: an accepted submission
//! consumes the participant's single attempt for that question either way.

use std::collections::HashSet;

use super::timer;

/// Base points for a correct answer, before the time bonus.
pub const BASE_POINTS: u32 = 10;

/// Points awarded for a correct answer with `remaining` seconds left.
pub fn points_for(remaining: u32) -> u32 {
    BASE_POINTS + timer::time_bonus(remaining)
}

/// Answer records keyed by `(participant name, question index)`.
#[derive(Default)]
pub struct Ledger {
    records: HashSet<(String, usize)>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check-and-set the record for a pair.
    ///
    /// Returns true exactly once per pair; a second call observes the record
    /// and returns false. Callers hold the core lock, so two near-simultaneous
    /// submissions can never both pass.
    pub fn try_consume(&mut self, name: &str, question_index: usize) -> bool {
        self.records.insert((name.to_string(), question_index))
    }

    /// Drop all records. Called when a fresh run begins, so question indexes
    /// can be answered again.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_is_once_per_pair() {
        let mut ledger = Ledger::new();
        assert!(ledger.try_consume("Ana", 0));
        assert!(!ledger.try_consume("Ana", 0));
        assert!(ledger.try_consume("Ana", 1));
        assert!(ledger.try_consume("Ben", 0));
        assert!(!ledger.try_consume("Ben", 0));
    }

    #[test]
    fn test_clear_reopens_all_pairs() {
        let mut ledger = Ledger::new();
        assert!(ledger.try_consume("Ana", 0));
        ledger.clear();
        assert!(ledger.try_consume("Ana", 0));
    }

    #[test]
    fn test_points_include_time_bonus() {
        assert_eq!(points_for(21), 17);
        assert_eq!(points_for(0), 10);
        assert_eq!(points_for(30), 20);
    }
}
