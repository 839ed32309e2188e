//! Participant registry.
//!
//! Tracks joined participants by unique name and distinguishes the one
//! privileged admin identity. The admin name is a shared secret: whoever
//! supplies it at join receives the [`AdminKey`] capability, and is never
//! registered as a scoreable participant.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::protocol::validate_name;

/// Capability token gating `start`/`advance`/`reset`.
///
/// Minted once per core; privileged operations compare the caller's key
/// against it server-side rather than trusting the name string again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminKey(Uuid);

impl AdminKey {
    fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

/// A scoreable participant.
#[derive(Debug, Clone)]
pub struct Participant {
    pub name: String,
    pub score: u32,
    /// Join order, used as the deterministic leaderboard tie-break.
    pub joined_seq: u64,
}

/// Outcome of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Caller supplied the reserved admin name and holds the capability.
    Admin(AdminKey),
    /// Caller is a scoreable participant. `rejoined` is true when the name
    /// already existed; its prior score is preserved.
    Participant { rejoined: bool },
}

/// Error joining the quiz.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("invalid name: {0}")]
    InvalidName(&'static str),
}

pub struct Registry {
    admin_name: String,
    admin_key: AdminKey,
    participants: HashMap<String, Participant>,
    next_seq: u64,
}

impl Registry {
    pub fn new(admin_name: String) -> Self {
        Self {
            admin_name,
            admin_key: AdminKey::mint(),
            participants: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Join with a display name.
    ///
    /// Rejoining an existing name is idempotent and keeps the prior score, so
    /// a reconnect never zeroes a participant. An explicit [`leave`] is the
    /// only way a score is discarded.
    ///
    /// [`leave`]: Registry::leave
    pub fn join(&mut self, name: &str) -> Result<JoinOutcome, JoinError> {
        let name = name.trim();
        validate_name(name).map_err(JoinError::InvalidName)?;

        if name == self.admin_name {
            return Ok(JoinOutcome::Admin(self.admin_key.clone()));
        }

        if self.participants.contains_key(name) {
            return Ok(JoinOutcome::Participant { rejoined: true });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.participants.insert(
            name.to_string(),
            Participant {
                name: name.to_string(),
                score: 0,
                joined_seq: seq,
            },
        );
        Ok(JoinOutcome::Participant { rejoined: false })
    }

    /// Remove a participant's scoreable record. Returns false if the name was
    /// not registered (including the admin identity, which never is).
    pub fn leave(&mut self, name: &str) -> bool {
        self.participants.remove(name.trim()).is_some()
    }

    /// Check a caller's capability.
    pub fn verify(&self, key: &AdminKey) -> bool {
        *key == self.admin_key
    }

    pub fn is_admin_name(&self, name: &str) -> bool {
        name.trim() == self.admin_name
    }

    pub fn get(&self, name: &str) -> Option<&Participant> {
        self.participants.get(name.trim())
    }

    /// Add points to a participant's score. Scores only ever grow.
    pub fn credit(&mut self, name: &str, points: u32) -> bool {
        if let Some(participant) = self.participants.get_mut(name.trim()) {
            participant.score += points;
            true
        } else {
            false
        }
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: &str = "quizmaster-secret";

    #[test]
    fn test_join_rejects_blank_names() {
        let mut registry = Registry::new(ADMIN.to_string());
        assert!(matches!(registry.join(""), Err(JoinError::InvalidName(_))));
        assert!(matches!(
            registry.join("   "),
            Err(JoinError::InvalidName(_))
        ));
    }

    #[test]
    fn test_admin_is_never_scoreable() {
        let mut registry = Registry::new(ADMIN.to_string());
        let outcome = registry.join(ADMIN).unwrap();
        assert!(matches!(outcome, JoinOutcome::Admin(_)));
        assert!(registry.get(ADMIN).is_none());
        assert!(!registry.leave(ADMIN));
    }

    #[test]
    fn test_admin_key_matches_only_this_registry() {
        let mut registry = Registry::new(ADMIN.to_string());
        let JoinOutcome::Admin(key) = registry.join(ADMIN).unwrap() else {
            panic!("expected admin outcome");
        };
        assert!(registry.verify(&key));

        let mut other = Registry::new(ADMIN.to_string());
        let JoinOutcome::Admin(other_key) = other.join(ADMIN).unwrap() else {
            panic!("expected admin outcome");
        };
        assert!(!registry.verify(&other_key));
    }

    #[test]
    fn test_rejoin_preserves_score() {
        let mut registry = Registry::new(ADMIN.to_string());
        registry.join("Ana").unwrap();
        registry.credit("Ana", 17);

        let outcome = registry.join("Ana").unwrap();
        assert_eq!(outcome, JoinOutcome::Participant { rejoined: true });
        assert_eq!(registry.get("Ana").unwrap().score, 17);
    }

    #[test]
    fn test_rejoin_after_leave_starts_at_zero() {
        let mut registry = Registry::new(ADMIN.to_string());
        registry.join("Ana").unwrap();
        registry.credit("Ana", 17);

        assert!(registry.leave("Ana"));
        assert!(registry.get("Ana").is_none());

        let outcome = registry.join("Ana").unwrap();
        assert_eq!(outcome, JoinOutcome::Participant { rejoined: false });
        assert_eq!(registry.get("Ana").unwrap().score, 0);
    }

    #[test]
    fn test_join_order_is_preserved() {
        let mut registry = Registry::new(ADMIN.to_string());
        registry.join("Ana").unwrap();
        registry.join("Ben").unwrap();
        assert!(registry.get("Ana").unwrap().joined_seq < registry.get("Ben").unwrap().joined_seq);
    }

    #[test]
    fn test_names_are_trimmed() {
        let mut registry = Registry::new(ADMIN.to_string());
        registry.join("  Ana  ").unwrap();
        assert!(registry.get("Ana").is_some());
        assert_eq!(registry.get("Ana").unwrap().name, "Ana");
    }
}
