//! Workflow-related type definitions

use job_client::ClientError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::WorkflowInput;

/// Catalog and submission errors
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("failed to list workflow definitions: {source}")]
    ListingFailed { source: ClientError },

    #[error("failed to parse workflow definition {path}: {cause}")]
    ParseFailed { path: String, cause: String },

    #[error("not connected: log in before contacting the store or job API")]
    NotAuthenticated,

    #[error("invalid job name {0:?}: must be non-empty and contain no '/'")]
    InvalidJobName(String),

    #[error("job directory {directory} is unavailable: {source}")]
    DirectoryUnavailable {
        directory: String,
        source: ClientError,
    },

    #[error("input {input_id} could not be resolved: {cause}")]
    InputResolutionFailed { input_id: String, cause: String },

    #[error("job submission failed: {source}")]
    SubmissionFailed { source: ClientError },

    #[error("job request failed: {source}")]
    JobRequestFailed { source: ClientError },
}

impl WorkflowError {
    /// Wraps a transport error, keeping a missing session distinguishable.
    pub(crate) fn from_client(
        err: ClientError,
        wrap: impl FnOnce(ClientError) -> WorkflowError,
    ) -> Self {
        match err {
            ClientError::NotAuthenticated => WorkflowError::NotAuthenticated,
            other => wrap(other),
        }
    }

    pub(crate) fn input(input_id: &str, cause: impl ToString) -> Self {
        WorkflowError::InputResolutionFailed {
            input_id: input_id.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// A parsed, runnable workflow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Display label; workflows without one never reach the catalog
    pub name: Option<String>,

    pub description: String,

    /// Definition path relative to the store root, referenced by submitted jobs
    pub filename: String,

    /// Declared parameters in definition order, ids unique
    pub inputs: Vec<WorkflowInput>,
}

impl Workflow {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.filename)
    }

    pub fn has_name(&self) -> bool {
        self.name
            .as_deref()
            .map(|name| !name.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn input(&self, id: &str) -> Option<&WorkflowInput> {
        self.inputs.iter().find(|input| input.id == id)
    }
}
