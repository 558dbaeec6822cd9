//! CLI argument definitions using clap

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Printed after an unrecognized subcommand, and when none is given.
pub const USAGE_HINT: &str =
    "Usage: ocrdeploy [--project <id>] initializeGCloud | processPhoto <filePath> | compileCloudFunctions | fetchResult <fileName>";

/// Provision the Google Cloud OCR pipeline and feed photos into it
#[derive(Parser, Debug)]
#[command(name = "ocrdeploy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Google Cloud project id (overrides config and OCRDEPLOY_PROJECT_ID)
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Project directory searched for ocrdeploy.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Print the gcloud commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create buckets and topic, then deploy both functions
    #[command(name = "initializeGCloud", alias = "initialize")]
    InitializeGCloud,

    /// Upload a photo into the images bucket
    #[command(name = "processPhoto", alias = "process-photo")]
    ProcessPhoto {
        /// Local photo to upload
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Redeploy both functions without touching buckets or topic
    #[command(name = "compileCloudFunctions", alias = "compile-functions")]
    CompileCloudFunctions,

    /// Print the extracted result stored for a photo
    #[command(name = "fetchResult", alias = "fetch-result")]
    FetchResult {
        /// Photo file name as uploaded (e.g. bill.jpg)
        file_name: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    #[command(external_subcommand)]
    Unknown(Vec<OsString>),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
