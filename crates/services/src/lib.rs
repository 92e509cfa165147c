#![forbid(unsafe_code)]

pub mod error;
pub mod progression_service;
pub mod speech_practice_service;

pub use cakap_core::Clock;

pub use error::{ProgressionServiceError, PromptError};
pub use progression_service::ProgressionService;
pub use speech_practice_service::{PromptSet, SpeechPracticeService};
