//! Protocol messages for client-server communication.
//!
//! All messages are serialized as JSON over WebSocket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Client wants to join with a display name. Joining with the reserved
    /// admin name grants the admin capability instead of a scoreable entry.
    Join { name: String },

    /// Client leaves, deleting its leaderboard entry.
    Leave,

    /// Admin starts the quiz at question 0.
    ///
    /// `expected_version` is the compare-and-swap guard for all three admin
    /// commands: clients should echo `version` from their latest `Session`
    /// push, so a double-clicked command applies once. `None` opts out of
    /// the guard and applies unconditionally (last write wins).
    Start {
        #[serde(default)]
        expected_version: Option<u64>,
    },

    /// Admin moves to the next question.
    Advance {
        #[serde(default)]
        expected_version: Option<u64>,
    },

    /// Admin stops the quiz and rewinds to question 0.
    Reset {
        #[serde(default)]
        expected_version: Option<u64>,
    },

    /// Client submits an answer for the current question.
    SubmitAnswer { question_index: usize, option: String },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Connection accepted, waiting for Join message.
    ConnectionAck,

    /// Name accepted; `is_admin` tells the client which controls to offer.
    JoinAccepted { name: String, is_admin: bool },

    /// Name rejected (empty, too long).
    JoinRejected { reason: String },

    /// Leave acknowledged.
    LeaveAck,

    /// Authoritative session state, pushed on subscribe and on every change.
    Session { view: SessionView },

    /// Current leaderboard, pushed on subscribe and on every change.
    Leaderboard { entries: Vec<LeaderboardEntry> },

    /// Outcome of a Start/Advance/Reset from the admin connection:
    /// whether the command mutated the session or was a no-op.
    CommandAck { applied: bool },

    /// Outcome of a SubmitAnswer. A rejected submission carries
    /// `accepted: false` and is never a fatal error.
    AnswerAck { accepted: bool, correct: bool },

    /// Server is shutting down.
    ServerClosing,
}

/// Snapshot of the session document broadcast to every subscriber.
///
/// `question_started_at` is the shared instant all participants derive their
/// countdown from; clients must never seed a countdown from local receive
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub started: bool,
    pub current_question_index: usize,
    pub question_started_at: Option<DateTime<Utc>>,
    /// Time limit of the current question, for countdown display.
    pub time_limit_seconds: u32,
    /// Mutation counter; commands may carry it back as a compare-and-swap
    /// guard against double-applied admin clicks.
    pub version: u64,
}

impl SessionView {
    /// The initial document before any admin command.
    pub fn not_started(time_limit_seconds: u32) -> Self {
        Self {
            started: false,
            current_question_index: 0,
            question_started_at: None,
            time_limit_seconds,
            version: 0,
        }
    }
}

/// Entry in the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
}

/// Display name length cap.
pub const NAME_MAX_LENGTH: usize = 32;

/// Default server port.
pub const DEFAULT_PORT: u16 = 8712;

/// Validates a display name.
///
/// Returns `Ok(())` if valid, or `Err` with an error message.
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("Name must not be empty");
    }

    if trimmed.len() > NAME_MAX_LENGTH {
        return Err("Name must be at most 32 characters");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Ana").is_ok());
        assert!(validate_name("a").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(33)).is_err());
    }

    #[test]
    fn test_message_serialization() {
        let msg = ClientMessage::Join {
            name: "Ana".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"Join\""));

        let msg = ServerMessage::AnswerAck {
            accepted: true,
            correct: false,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"AnswerAck\""));
    }

    #[test]
    fn test_commands_parse_without_expected_version() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"Advance"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Advance {
                expected_version: None
            }
        ));
    }

    #[test]
    fn test_session_view_round_trip() {
        let view = SessionView::not_started(30);
        let json = serde_json::to_string(&ServerMessage::Session { view: view.clone() }).unwrap();
        let parsed: ServerMessage = serde_json::from_str(&json).unwrap();
        match parsed {
            ServerMessage::Session { view: v } => assert_eq!(v, view),
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
