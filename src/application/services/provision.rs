//! Provisioning service
//!
//! Runs the provisioning plans against the `gcloud` CLI, one blocking call
//! at a time. Remote exit codes are recorded in the report but never stop
//! the sequence; only a failure to start `gcloud` aborts an action.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::gcloud::{command_line, GcloudTarget};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    compile_plan, initialize_plan, read_result_step, upload_step, DomainError, ProvisionReport,
    ProvisionStep, StepOutcome,
};
use crate::infrastructure::traits::{CommandRunner, FileSystem};

/// Cloud resource provisioning service.
pub struct ProvisionService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    settings: Arc<Settings>,
}

impl ProvisionService {
    /// Create a new provisioning service.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        settings: Arc<Settings>,
    ) -> Self {
        Self { fs, cmd, settings }
    }

    /// Resolve project, region and function sources from settings.
    pub fn target(&self) -> ApplicationResult<GcloudTarget> {
        let project_id = self
            .settings
            .project_id
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or(ApplicationError::ProjectNotConfigured)?;
        Ok(GcloudTarget {
            project_id: project_id.to_string(),
            region: self.settings.region.clone(),
            source_dir: self.settings.source_dir.clone(),
        })
    }

    /// Create buckets and topic, then deploy both functions.
    #[instrument(skip(self))]
    pub fn initialize(&self) -> ApplicationResult<ProvisionReport> {
        let target = self.target()?;
        info!("initializing project {}", target.project_id);
        self.execute(&target, initialize_plan(&target.project_id))
    }

    /// Redeploy both functions.
    #[instrument(skip(self))]
    pub fn compile_functions(&self) -> ApplicationResult<ProvisionReport> {
        let target = self.target()?;
        info!("deploying functions to {}", target.project_id);
        self.execute(&target, compile_plan(&target.project_id))
    }

    /// Copy a local photo into the images bucket.
    ///
    /// A missing path or one that is not a regular file fails before
    /// anything external runs.
    #[instrument(skip(self))]
    pub fn process_photo(&self, local_path: Option<&Path>) -> ApplicationResult<ProvisionReport> {
        let path = match local_path {
            Some(p) if self.fs.is_file(p) => p,
            other => {
                debug!("photo not found: {:?}", other);
                return Err(DomainError::FileNotFound(other.map(Path::to_path_buf)).into());
            }
        };
        let target = self.target()?;
        self.execute(&target, vec![upload_step(path)])
    }

    /// Read the JSON result stored for a photo.
    ///
    /// Returns `None` when the object is empty.
    #[instrument(skip(self))]
    pub fn fetch_result(&self, file_name: &str) -> ApplicationResult<Option<serde_json::Value>> {
        let step = read_result_step(file_name)?;
        let target = self.target()?;
        let args = target.render(&step);
        let line = command_line(&self.settings.gcloud, &args);
        debug!("run: {}", line);

        let output = self
            .cmd
            .run(&self.settings.gcloud, &args)
            .with_program_context(&self.settings.gcloud)?;

        if !output.status.success() {
            return Err(ApplicationError::CommandFailed {
                command_line: line,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                exit_code: output.status.code(),
            });
        }

        let object = step.target();
        let body = String::from_utf8_lossy(&output.stdout);
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ApplicationError::InvalidResult {
                object,
                message: e.to_string(),
            })
    }

    /// Run steps in order, recording each exit code.
    pub fn execute(
        &self,
        target: &GcloudTarget,
        steps: Vec<ProvisionStep>,
    ) -> ApplicationResult<ProvisionReport> {
        let program = &self.settings.gcloud;
        let mut report = ProvisionReport::default();

        for step in steps {
            let args = target.render(&step);
            let line = command_line(program, &args);
            info!("{}: {}", step.label(), step.target());
            debug!("run: {}", line);

            let status = self
                .cmd
                .run_inherited(program, &args)
                .with_program_context(program)?;

            if !status.success() {
                warn!("{} exited with {:?}", line, status.code());
            }
            report.outcomes.push(StepOutcome {
                step,
                command_line: line,
                exit_code: status.code(),
            });
        }

        Ok(report)
    }
}
