//! Shared error types for the services crate.

use thiserror::Error;

use cakap_core::ProgressionError;
use cakap_core::model::ConfigError;
use storage::repository::StorageError;

/// Errors emitted by `ProgressionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressionServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while building a prompt set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PromptError {
    #[error("no practice prompts available")]
    Empty,
    #[error("malformed prompt file: {0}")]
    Csv(String),
}
