//! Domain layer: pipeline resources and provisioning plans
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod plan;

pub use entities::*;
pub use error::DomainError;
pub use plan::{compile_plan, initialize_plan, read_result_step, result_object_name, upload_step};
