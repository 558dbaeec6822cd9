//! Pipeline resources: buckets, topic, function definitions and provisioning steps.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Bucket receiving uploaded photos; object creation triggers extraction.
pub const IMAGES_BUCKET: &str = "utilityimages";
/// Bucket holding the cropped sections produced by the extraction function.
pub const PROCESSED_BUCKET: &str = "utilityprocessedimages";
/// Bucket where the save function writes one JSON result per photo.
pub const RESULTS_BUCKET: &str = "utilityresults";
/// Topic the extraction function publishes results on.
pub const RESULT_TOPIC: &str = "UtilityResults";

/// Buckets in creation order.
pub const BUCKETS: [&str; 3] = [IMAGES_BUCKET, PROCESSED_BUCKET, RESULTS_BUCKET];

/// Runtime both functions are deployed with.
pub const FUNCTION_RUNTIME: &str = "python310";

pub const EXTRACT_FUNCTION: &str = "ocr-extract";
pub const EXTRACT_ENTRY_POINT: &str = "process_image";
pub const SAVE_FUNCTION: &str = "ocr-save";
pub const SAVE_ENTRY_POINT: &str = "save_result";

/// Event condition that invokes a deployed function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Object finalized in a bucket.
    BucketObjectCreated { bucket: String },
    /// Message published on a topic.
    TopicPublished { topic: String },
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::BucketObjectCreated { bucket } => write!(f, "object created in gs://{bucket}"),
            Trigger::TopicPublished { topic } => write!(f, "message published on {topic}"),
        }
    }
}

/// Serverless function deployment definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: String,
    pub entry_point: String,
    pub runtime: String,
    pub trigger: Trigger,
    /// Sorted so rendered command lines are stable.
    pub env_vars: BTreeMap<String, String>,
}

impl FunctionSpec {
    /// Extraction function: resizes, crops and OCRs photos landing in the images bucket.
    pub fn extract(project_id: &str) -> Self {
        let env_vars = BTreeMap::from([
            ("GCP_PROJECT".to_string(), project_id.to_string()),
            ("PROCESSED_BUCKET".to_string(), PROCESSED_BUCKET.to_string()),
            ("RESULT_NAME".to_string(), RESULT_TOPIC.to_string()),
        ]);
        Self {
            name: EXTRACT_FUNCTION.to_string(),
            entry_point: EXTRACT_ENTRY_POINT.to_string(),
            runtime: FUNCTION_RUNTIME.to_string(),
            trigger: Trigger::BucketObjectCreated {
                bucket: IMAGES_BUCKET.to_string(),
            },
            env_vars,
        }
    }

    /// Save function: persists published results as JSON in the results bucket.
    pub fn save(project_id: &str) -> Self {
        let env_vars = BTreeMap::from([
            ("GCP_PROJECT".to_string(), project_id.to_string()),
            ("RESULT_BUCKET".to_string(), RESULTS_BUCKET.to_string()),
        ]);
        Self {
            name: SAVE_FUNCTION.to_string(),
            entry_point: SAVE_ENTRY_POINT.to_string(),
            runtime: FUNCTION_RUNTIME.to_string(),
            trigger: Trigger::TopicPublished {
                topic: RESULT_TOPIC.to_string(),
            },
            env_vars,
        }
    }
}

/// One external provisioning call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionStep {
    CreateBucket { name: String },
    CreateTopic { name: String },
    DeployFunction(FunctionSpec),
    UploadObject { local_path: PathBuf, bucket: String },
    ReadObject { bucket: String, object: String },
}

impl ProvisionStep {
    /// Short label for progress output.
    pub fn label(&self) -> &'static str {
        match self {
            ProvisionStep::CreateBucket { .. } => "create bucket",
            ProvisionStep::CreateTopic { .. } => "create topic",
            ProvisionStep::DeployFunction(_) => "deploy function",
            ProvisionStep::UploadObject { .. } => "upload",
            ProvisionStep::ReadObject { .. } => "read",
        }
    }

    /// Resource the step acts on.
    pub fn target(&self) -> String {
        match self {
            ProvisionStep::CreateBucket { name } => format!("gs://{name}"),
            ProvisionStep::CreateTopic { name } => name.clone(),
            ProvisionStep::DeployFunction(spec) => format!("{} ({})", spec.name, spec.trigger),
            ProvisionStep::UploadObject { local_path, bucket } => {
                format!("{} -> gs://{bucket}", local_path.display())
            }
            ProvisionStep::ReadObject { bucket, object } => format!("gs://{bucket}/{object}"),
        }
    }
}

/// Result of running one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: ProvisionStep,
    /// Rendered command line, for display.
    pub command_line: String,
    /// Exit code of the external tool; `None` if it was killed by a signal.
    pub exit_code: Option<i32>,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Outcomes of one action, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub outcomes: Vec<StepOutcome>,
}

impl ProvisionReport {
    pub fn failed(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Expand `~`, `$VAR` and `${VAR}` in a path-like string.
///
/// Unknown variables leave the input unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
