use std::fmt;

/// Outcome of scoring one spoken attempt against its prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub prompt: String,
    pub transcript: String,
    /// Similarity in `[0, 100]`, rounded to two decimals.
    pub percent: f64,
}

impl fmt::Display for ScoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.percent)
    }
}
