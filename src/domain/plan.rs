//! Ordered step lists for each provisioning action.

use std::path::Path;

use crate::domain::{
    DomainError, FunctionSpec, ProvisionStep, BUCKETS, IMAGES_BUCKET, RESULTS_BUCKET, RESULT_TOPIC,
};

/// Buckets, then the topic, then both function deployments.
pub fn initialize_plan(project_id: &str) -> Vec<ProvisionStep> {
    let mut steps: Vec<ProvisionStep> = BUCKETS
        .iter()
        .map(|name| ProvisionStep::CreateBucket {
            name: (*name).to_string(),
        })
        .collect();
    steps.push(ProvisionStep::CreateTopic {
        name: RESULT_TOPIC.to_string(),
    });
    steps.extend(compile_plan(project_id));
    steps
}

/// (Re)deploy both functions without touching buckets or the topic.
pub fn compile_plan(project_id: &str) -> Vec<ProvisionStep> {
    vec![
        ProvisionStep::DeployFunction(FunctionSpec::extract(project_id)),
        ProvisionStep::DeployFunction(FunctionSpec::save(project_id)),
    ]
}

pub fn upload_step(local_path: &Path) -> ProvisionStep {
    ProvisionStep::UploadObject {
        local_path: local_path.to_path_buf(),
        bucket: IMAGES_BUCKET.to_string(),
    }
}

/// Name of the JSON object the save function writes for a photo.
///
/// Everything from the first `.` on is dropped: `bill.2023.jpg` -> `bill.json`,
/// and `.jpg` -> `.json`, as the save function does.
pub fn result_object_name(file_name: &str) -> Result<String, DomainError> {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DomainError::InvalidPhotoName {
            name: file_name.to_string(),
            message: "no file name".to_string(),
        })?;
    let stem = base.split('.').next().unwrap_or_default();
    Ok(format!("{stem}.json"))
}

pub fn read_result_step(file_name: &str) -> Result<ProvisionStep, DomainError> {
    Ok(ProvisionStep::ReadObject {
        bucket: RESULTS_BUCKET.to_string(),
        object: result_object_name(file_name)?,
    })
}
