//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error(
        "no project id configured: pass --project, set OCRDEPLOY_PROJECT_ID, or add project_id to ocrdeploy.toml"
    )]
    ProjectNotConfigured,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("cannot run {program}: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command_line} failed: {message}")]
    CommandFailed {
        command_line: String,
        message: String,
        exit_code: Option<i32>,
    },

    #[error("invalid result {object}: {message}")]
    InvalidResult { object: String, message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
