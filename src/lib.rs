//! ocrdeploy: provisions the Google Cloud OCR pipeline via the gcloud CLI.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
