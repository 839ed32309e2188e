use serde::Deserialize;

#[derive(Clone, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub media: Option<String>,
    pub time_limit_seconds: u32,
}

impl Question {
    /// Whether the chosen option text matches the correct answer.
    ///
    /// A catalog may deliberately set `correct_answer` to a value that matches
    /// no option, meaning the question has no correct answer.
    pub fn is_correct(&self, chosen: &str) -> bool {
        self.correct_answer == chosen
    }
}
