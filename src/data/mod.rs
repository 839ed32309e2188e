mod loader;

pub use loader::{LoadError, load_questions_from_json, MAX_OPTIONS, MIN_OPTIONS};
