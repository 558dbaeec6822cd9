//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/ocrdeploy/ocrdeploy.toml`
//! 3. Local config: `<project_dir>/ocrdeploy.toml`
//! 4. Environment variables: `OCRDEPLOY_*` prefix
//!
//! The `--project` flag is applied on top by the CLI.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;

/// Name of both the global and the local config file.
pub const CONFIG_FILE_NAME: &str = "ocrdeploy.toml";

/// Unified configuration for ocrdeploy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Google Cloud project id (no default: must be configured)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Region for functions and bucket location
    pub region: String,
    /// Directory holding the Cloud Functions sources (main.py, requirements.txt)
    pub source_dir: PathBuf,
    /// gcloud executable
    pub gcloud: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_id: None,
            region: "us-central1".into(),
            source_dir: PathBuf::from("."),
            gcloud: "gcloud".into(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` = not specified in this layer).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub source_dir: Option<PathBuf>,
    pub gcloud: Option<String>,
}

/// Get the XDG config directory for ocrdeploy.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ocrdeploy").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(CONFIG_FILE_NAME)
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.source_dir.to_string_lossy().as_ref());
        self.source_dir = PathBuf::from(expanded);

        self.gcloud = expand_env_vars(&self.gcloud);
    }

    /// Overlay wins wherever it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            project_id: overlay
                .project_id
                .clone()
                .or_else(|| self.project_id.clone()),
            region: overlay.region.clone().unwrap_or_else(|| self.region.clone()),
            source_dir: overlay
                .source_dir
                .clone()
                .unwrap_or_else(|| self.source_dir.clone()),
            gcloud: overlay.gcloud.clone().unwrap_or_else(|| self.gcloud.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory searched for a local `ocrdeploy.toml`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        Self::load_from(global.as_deref(), project_dir)
    }

    /// Load settings from an explicit global config file (if any) and project directory.
    pub fn load_from(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(path) = global_path {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        // 3. Local config
        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply OCRDEPLOY_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("OCRDEPLOY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("project_id") {
            settings.project_id = Some(val);
        }
        if let Ok(val) = config.get_string("region") {
            settings.region = val;
        }
        if let Ok(val) = config.get_string("source_dir") {
            settings.source_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("gcloud") {
            settings.gcloud = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# ocrdeploy configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/ocrdeploy/ocrdeploy.toml
#   Local:  ./ocrdeploy.toml (or -C <dir>)
#   Env:    OCRDEPLOY_* environment variables
#   Flag:   --project <id>

# Google Cloud project id (required for every cloud action)
# project_id = "my-project"

# Region for the functions and the bucket location
# region = "us-central1"

# Directory with the Cloud Functions sources (main.py, requirements.txt)
# source_dir = "."

# gcloud executable
# gcloud = "gcloud"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
