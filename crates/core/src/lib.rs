#![forbid(unsafe_code)]

pub mod curriculum;
pub mod model;
pub mod progression;
pub mod similarity;
pub mod time;

pub use curriculum::Curriculum;
pub use progression::{LessonOutcome, LessonRef, ProgressionEngine, ProgressionError};
pub use similarity::SimilarityScorer;
pub use time::Clock;
