//! Training configuration: the immutable part of a training job.

use serde::{Deserialize, Serialize};
use xihe_domain::values::rules;
use xihe_domain::{Account, ProjName, ResourceType, value_type};

value_type!(TrainingName, training_name, |v| {
    rules::length(v, 1, 50)?;
    rules::slug(v, &['_', '-'])
});

value_type!(TrainingDesc, training_desc, |v| rules::length(v, 0, 200));

value_type!(
    /// Directory holding the training code, relative to the project repo.
    Directory,
    directory,
    |v| {
        rules::length(v, 1, 500)?;
        rules::path(v)
    }
);

value_type!(
    /// Entry script, relative to the code directory.
    FilePath,
    file_path,
    |v| {
        rules::length(v, 1, 500)?;
        rules::path(v)?;
        if v.ends_with('/') {
            return Err("must name a file".to_string());
        }
        Ok(())
    }
);

value_type!(ComputeType, compute_type, |v| {
    rules::length(v, 1, 100)?;
    rules::no_whitespace(v)
});

value_type!(ComputeFlavor, compute_flavor, |v| {
    rules::length(v, 1, 100)?;
    rules::no_whitespace(v)
});

value_type!(ComputeVersion, compute_version, |v| {
    rules::length(v, 1, 100)?;
    rules::no_whitespace(v)
});

value_type!(
    /// Key of a hyperparameter or environment variable.
    CustomizedKey,
    customized_key,
    |v| {
        rules::length(v, 1, 100)?;
        rules::no_whitespace(v)?;
        if v.contains('=') {
            return Err("must not contain '='".to_string());
        }
        Ok(())
    }
);

value_type!(CustomizedValue, customized_value, |v| rules::length(v, 0, 500));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compute {
    #[serde(rename = "type")]
    pub compute_type: ComputeType,
    pub flavor: ComputeFlavor,
    pub version: ComputeVersion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: CustomizedKey,
    #[serde(default)]
    pub value: Option<CustomizedValue>,
}

/// Binding of another user's resource into the training job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    /// Name under which the job sees the resource.
    pub key: CustomizedKey,
    pub user: Account,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub repo_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub project_name: ProjName,
    pub project_repo_id: String,
    pub name: TrainingName,
    #[serde(default)]
    pub desc: Option<TrainingDesc>,
    pub code_dir: Directory,
    pub boot_file: FilePath,
    pub compute: Compute,
    #[serde(default)]
    pub hyperparameters: Vec<KeyValue>,
    #[serde(default)]
    pub env: Vec<KeyValue>,
    #[serde(default)]
    pub inputs: Vec<Input>,
    /// Whether the job reports to the experiment tracker.
    #[serde(default)]
    pub enable_aim: bool,
}
