mod messages;

pub use messages::{
    validate_name, ClientMessage, LeaderboardEntry, ServerMessage, SessionView, DEFAULT_PORT,
    NAME_MAX_LENGTH,
};
