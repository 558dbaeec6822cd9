//! Error conversion helpers for common I/O operations

use std::io;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Map a failure to start an external program.
    ///
    /// # Example
    /// ```ignore
    /// runner.run(&gcloud, &args).with_program_context(&gcloud)?;
    /// ```
    fn with_program_context(self, program: &str) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_program_context(self, program: &str) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::CommandSpawn {
            program: program.to_string(),
            source,
        })
    }
}
