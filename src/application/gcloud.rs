//! Rendering of provisioning steps into `gcloud` argument vectors.
//!
//! Arguments are `OsString`s so local paths reach `gcloud` byte-for-byte;
//! only `command_line` is lossy, and only for display.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use crate::domain::{FunctionSpec, ProvisionStep, Trigger};

/// Where and how steps are rendered: project, region and function sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcloudTarget {
    pub project_id: String,
    pub region: String,
    pub source_dir: PathBuf,
}

/// `<flag><value>` without passing the value through UTF-8.
fn flag_with(flag: &str, value: &OsStr) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(value);
    arg
}

impl GcloudTarget {
    /// Arguments (without the program name) for one step.
    pub fn render(&self, step: &ProvisionStep) -> Vec<OsString> {
        let project = OsString::from(format!("--project={}", self.project_id));
        match step {
            ProvisionStep::CreateBucket { name } => vec![
                "storage".into(),
                "buckets".into(),
                "create".into(),
                format!("gs://{name}").into(),
                project,
                format!("--location={}", self.region).into(),
            ],
            ProvisionStep::CreateTopic { name } => vec![
                "pubsub".into(),
                "topics".into(),
                "create".into(),
                name.into(),
                project,
            ],
            ProvisionStep::DeployFunction(spec) => {
                let mut args = self.render_deploy(spec);
                args.push(project);
                args
            }
            ProvisionStep::UploadObject { local_path, bucket } => vec![
                "storage".into(),
                "cp".into(),
                local_path.as_os_str().to_os_string(),
                format!("gs://{bucket}").into(),
                project,
            ],
            ProvisionStep::ReadObject { bucket, object } => vec![
                "storage".into(),
                "cat".into(),
                format!("gs://{bucket}/{object}").into(),
                project,
            ],
        }
    }

    fn render_deploy(&self, spec: &FunctionSpec) -> Vec<OsString> {
        let trigger = match &spec.trigger {
            Trigger::BucketObjectCreated { bucket } => format!("--trigger-bucket={bucket}"),
            Trigger::TopicPublished { topic } => format!("--trigger-topic={topic}"),
        };
        let env_vars = spec
            .env_vars
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");

        vec![
            "functions".into(),
            "deploy".into(),
            spec.name.as_str().into(),
            "--gen2".into(),
            format!("--runtime={}", spec.runtime).into(),
            format!("--region={}", self.region).into(),
            flag_with("--source=", self.source_dir.as_os_str()),
            format!("--entry-point={}", spec.entry_point).into(),
            trigger.into(),
            format!("--set-env-vars={env_vars}").into(),
        ]
    }
}

/// Render a program and its arguments as a copy-pasteable shell line.
///
/// Non-UTF-8 bytes are replaced; use for display and logs only.
pub fn command_line(program: &str, args: &[OsString]) -> String {
    std::iter::once(program.to_string())
        .chain(args.iter().map(|a| a.to_string_lossy().into_owned()))
        .map(|a| shell_quote(&a))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
