//! Leaderboard view.
//!
//! A derived ranking of all non-admin participants, recomputed whenever the
//! registry or ledger change. Sort is score descending with join order as the
//! tie-break, so equal scores keep a stable relative order across
//! recomputations.

use crate::protocol::LeaderboardEntry;

use super::registry::Registry;

/// Compute the current leaderboard from the registry.
pub fn compute(registry: &Registry) -> Vec<LeaderboardEntry> {
    let mut participants: Vec<_> = registry.participants().collect();
    participants.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.joined_seq.cmp(&b.joined_seq))
    });

    participants
        .into_iter()
        .map(|p| LeaderboardEntry {
            name: p.name.clone(),
            score: p.score,
        })
        .collect()
}
