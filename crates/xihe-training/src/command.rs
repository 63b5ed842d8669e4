//! `TrainingCreateCmd` and its validator.
//!
//! The command mirrors what the transport layer can express, so every field
//! that may be absent is an `Option`. Validation is a pure, ordered list of
//! named rules evaluated before any external call; the first failing rule is
//! reported.

use std::fmt;

use serde::Deserialize;
use xihe_domain::{Account, ProjName, ResourceType};

use crate::config::{
    Compute, ComputeFlavor, ComputeType, ComputeVersion, CustomizedKey, CustomizedValue,
    Directory, FilePath, Input, KeyValue, TrainingConfig, TrainingDesc, TrainingName,
};

/// A validation rule of `TrainingCreateCmd`, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    User,
    ProjectId,
    ProjectName,
    ProjectRepoId,
    Name,
    CodeDir,
    BootFile,
    ComputeFlavor,
    ComputeType,
    ComputeVersion,
    /// Hyperparameter at this position has no key.
    HyperparameterKey(usize),
    /// Environment variable at this position has no key.
    EnvKey(usize),
    /// Input at this position misses its key, user, type or repo id.
    Input(usize),
}

/// The first rule a command violated.
///
/// Displays only a generic message; use [`ValidationError::rule`] for detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationError {
    rule: ValidationRule,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            ValidationRule::Input(_) => f.write_str("invalid input"),
            _ => f.write_str("invalid cmd of creating training"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    #[must_use]
    pub fn new(rule: ValidationRule) -> Self {
        Self { rule }
    }

    #[must_use]
    pub fn rule(&self) -> ValidationRule {
        self.rule
    }

    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.rule, ValidationRule::Input(_))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComputeCmd {
    #[serde(rename = "type")]
    pub compute_type: Option<ComputeType>,
    pub flavor: Option<ComputeFlavor>,
    pub version: Option<ComputeVersion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyValueCmd {
    pub key: Option<CustomizedKey>,
    pub value: Option<CustomizedValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputCmd {
    pub key: Option<CustomizedKey>,
    pub user: Option<Account>,
    #[serde(rename = "type")]
    pub resource_type: Option<ResourceType>,
    pub repo_id: String,
}

impl InputCmd {
    fn is_complete(&self) -> bool {
        self.key.is_some()
            && self.user.is_some()
            && self.resource_type.is_some()
            && !self.repo_id.is_empty()
    }
}

/// Request to create a training job inside a project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrainingCreateCmd {
    pub user: Option<Account>,
    pub project_id: String,
    pub project_name: Option<ProjName>,
    pub project_repo_id: String,
    pub name: Option<TrainingName>,
    pub desc: Option<TrainingDesc>,
    pub code_dir: Option<Directory>,
    pub boot_file: Option<FilePath>,
    pub compute: ComputeCmd,
    pub hyperparameters: Vec<KeyValueCmd>,
    pub env: Vec<KeyValueCmd>,
    pub inputs: Vec<InputCmd>,
    pub enable_aim: bool,
}

fn required<T>(value: Option<T>, rule: ValidationRule) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::new(rule))
}

fn into_key_values(
    items: Vec<KeyValueCmd>,
    rule: fn(usize) -> ValidationRule,
) -> Result<Vec<KeyValue>, ValidationError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, kv)| Ok(KeyValue { key: required(kv.key, rule(i))?, value: kv.value }))
        .collect()
}

impl TrainingCreateCmd {
    fn scalar_checks(&self) -> [(ValidationRule, bool); 10] {
        let c = &self.compute;
        [
            (ValidationRule::User, self.user.is_some()),
            (ValidationRule::ProjectId, !self.project_id.is_empty()),
            (ValidationRule::ProjectName, self.project_name.is_some()),
            (ValidationRule::ProjectRepoId, !self.project_repo_id.is_empty()),
            (ValidationRule::Name, self.name.is_some()),
            (ValidationRule::CodeDir, self.code_dir.is_some()),
            (ValidationRule::BootFile, self.boot_file.is_some()),
            (ValidationRule::ComputeFlavor, c.flavor.is_some()),
            (ValidationRule::ComputeType, c.compute_type.is_some()),
            (ValidationRule::ComputeVersion, c.version.is_some()),
        ]
    }

    /// Checks the command, returning the first violated rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some((rule, _)) = self.scalar_checks().into_iter().find(|(_, ok)| !ok) {
            return Err(ValidationError::new(rule));
        }
        if let Some(i) = self.hyperparameters.iter().position(|kv| kv.key.is_none()) {
            return Err(ValidationError::new(ValidationRule::HyperparameterKey(i)));
        }
        if let Some(i) = self.env.iter().position(|kv| kv.key.is_none()) {
            return Err(ValidationError::new(ValidationRule::EnvKey(i)));
        }
        if let Some(i) = self.inputs.iter().position(|input| !input.is_complete()) {
            return Err(ValidationError::new(ValidationRule::Input(i)));
        }
        Ok(())
    }

    /// Consumes a valid command into `(user, project_id, config)`.
    pub fn into_parts(self) -> Result<(Account, String, TrainingConfig), ValidationError> {
        self.validate()?;

        let user = required(self.user, ValidationRule::User)?;
        let compute = Compute {
            compute_type: required(self.compute.compute_type, ValidationRule::ComputeType)?,
            flavor: required(self.compute.flavor, ValidationRule::ComputeFlavor)?,
            version: required(self.compute.version, ValidationRule::ComputeVersion)?,
        };
        let inputs = self
            .inputs
            .into_iter()
            .enumerate()
            .map(|(i, input)| {
                let rule = ValidationRule::Input(i);
                Ok(Input {
                    key: required(input.key, rule)?,
                    user: required(input.user, rule)?,
                    resource_type: required(input.resource_type, rule)?,
                    repo_id: input.repo_id,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let config = TrainingConfig {
            project_name: required(self.project_name, ValidationRule::ProjectName)?,
            project_repo_id: self.project_repo_id,
            name: required(self.name, ValidationRule::Name)?,
            desc: self.desc,
            code_dir: required(self.code_dir, ValidationRule::CodeDir)?,
            boot_file: required(self.boot_file, ValidationRule::BootFile)?,
            compute,
            hyperparameters: into_key_values(
                self.hyperparameters,
                ValidationRule::HyperparameterKey,
            )?,
            env: into_key_values(self.env, ValidationRule::EnvKey)?,
            inputs,
            enable_aim: self.enable_aim,
        };

        Ok((user, self.project_id, config))
    }
}
