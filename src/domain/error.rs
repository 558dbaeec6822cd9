//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Photo to upload is missing or not a regular file.
    #[error("File does not exist.")]
    FileNotFound(Option<PathBuf>),

    #[error("invalid photo name: {name:?} ({message})")]
    InvalidPhotoName { name: String, message: String },
}
