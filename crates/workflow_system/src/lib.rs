//! Workflow catalog and job submission on top of `job_client`.

pub mod catalog;
pub mod events;
pub mod jobs;
pub mod parser;
pub mod service;
pub mod submitter;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{list_definitions, WorkflowCatalog};
pub use events::{EventBus, SubmissionState, WorkflowEvent};
pub use jobs::JobManager;
pub use parser::{render_definition, DefinitionParser};
pub use service::WorkflowService;
pub use submitter::{FilePayload, JobSubmitter, SubmissionRequest};
pub use types::{InputType, Workflow, WorkflowError, WorkflowInput};
