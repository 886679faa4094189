//! Job submission: directory, inputs, then the job itself

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bytes::Bytes;
use futures::future::try_join_all;
use job_client::{Job, JobDescription, JobValue, ObjectStore};
use log::{debug, info, warn};
use serde_json::Value;

use crate::events::{EventBus, SubmissionState, WorkflowEvent};
use crate::jobs::JobManager;
use crate::types::{InputType, Workflow, WorkflowError, WorkflowInput};

/// A file chosen for a `file` input.
#[derive(Debug, Clone)]
pub struct FilePayload {
    /// Original file name; the upload keeps it.
    pub file_name: String,
    pub bytes: Bytes,
}

impl FilePayload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Base name the payload is stored under, without any directories.
    pub fn upload_name(&self) -> &str {
        self.file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
    }
}

/// Everything the caller collected for one run.
#[derive(Debug, Clone, Default)]
pub struct SubmissionRequest {
    /// Job name, also the directory the inputs are uploaded to.
    pub name: String,
    /// Raw values by input id. A present `null` is passed through.
    pub values: HashMap<String, Value>,
    /// File payloads by input id.
    pub files: HashMap<String, FilePayload>,
}

impl SubmissionRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, input_id: impl Into<String>, value: Value) -> Self {
        self.values.insert(input_id.into(), value);
        self
    }

    pub fn with_file(mut self, input_id: impl Into<String>, payload: FilePayload) -> Self {
        self.files.insert(input_id.into(), payload);
        self
    }
}

/// Tracks one attempt through its states and reports each transition.
struct SubmissionAttempt<'a> {
    job_name: &'a str,
    state: SubmissionState,
    events: &'a EventBus,
}

impl<'a> SubmissionAttempt<'a> {
    fn new(job_name: &'a str, events: &'a EventBus) -> Self {
        Self {
            job_name,
            state: SubmissionState::Idle,
            events,
        }
    }

    fn advance(&mut self, next: SubmissionState) {
        debug_assert!(
            self.state.can_advance_to(&next),
            "invalid submission transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("Submission {}: {:?} -> {:?}", self.job_name, self.state, next);
        self.state = next.clone();
        self.events.publish(WorkflowEvent::SubmissionProgress {
            job_name: self.job_name.to_string(),
            state: next,
        });
    }

    fn fail(mut self, err: WorkflowError) -> Result<Job, WorkflowError> {
        warn!("Submission {} failed: {}", self.job_name, err);
        self.advance(SubmissionState::Failed(err.to_string()));
        Err(err)
    }
}

/// Launches runs of catalog workflows.
pub struct JobSubmitter {
    store: Arc<dyn ObjectStore>,
    jobs: Arc<JobManager>,
}

impl JobSubmitter {
    pub fn new(store: Arc<dyn ObjectStore>, jobs: Arc<JobManager>) -> Self {
        Self { store, jobs }
    }

    /// Creates the job directory, resolves every input concurrently
    /// (uploading files), then posts the job. Any failure ends the attempt
    /// before the job is posted.
    ///
    /// On success the new job becomes the selected job and a job list
    /// refresh is requested.
    pub async fn submit(
        &self,
        workflow: &Workflow,
        request: &SubmissionRequest,
    ) -> Result<Job, WorkflowError> {
        let mut attempt = SubmissionAttempt::new(&request.name, self.jobs.events());

        if request.name.trim().is_empty() || request.name.contains('/') {
            return attempt.fail(WorkflowError::InvalidJobName(request.name.clone()));
        }
        if let Err(err) = check_upload_names(workflow, request) {
            return attempt.fail(err);
        }

        attempt.advance(SubmissionState::EnsuringDirectory);
        if let Err(err) = self.store.ensure_directory(&request.name).await {
            return attempt.fail(WorkflowError::from_client(err, |source| {
                WorkflowError::DirectoryUnavailable {
                    directory: request.name.clone(),
                    source,
                }
            }));
        }

        attempt.advance(SubmissionState::ResolvingInputs);
        for id in request.values.keys() {
            if workflow.input(id).is_none() {
                debug!("Ignoring value for undeclared input {id}");
            }
        }
        let resolutions = workflow
            .inputs
            .iter()
            .map(|input| self.resolve_input(input, request));
        let input: BTreeMap<String, JobValue> = match try_join_all(resolutions).await {
            Ok(resolved) => resolved.into_iter().flatten().collect(),
            Err(err) => return attempt.fail(err),
        };

        attempt.advance(SubmissionState::Submitting);
        let description = JobDescription {
            name: request.name.clone(),
            workflow: workflow.filename.clone(),
            input,
        };
        let job = match self.jobs.api().submit_job(&description).await {
            Ok(job) => job,
            Err(err) => {
                return attempt.fail(WorkflowError::from_client(err, |source| {
                    WorkflowError::SubmissionFailed { source }
                }))
            }
        };

        attempt.advance(SubmissionState::Succeeded);
        info!("Submitted job {} ({})", job.id, request.name);
        self.jobs.select_job(Some(job.clone()));
        self.jobs.request_list_refresh();
        Ok(job)
    }

    /// `None` means the input is left out of the job document.
    async fn resolve_input(
        &self,
        input: &WorkflowInput,
        request: &SubmissionRequest,
    ) -> Result<Option<(String, JobValue)>, WorkflowError> {
        let raw = request.values.get(&input.id);

        let value = match &input.input_type {
            InputType::File => match request.files.get(&input.id) {
                Some(payload) => Some(self.upload_input(input, &request.name, payload).await?),
                None if input.optional => raw.cloned().map(JobValue::Scalar),
                None => return Err(WorkflowError::input(&input.id, "no file was provided")),
            },
            _ => match raw {
                None => None,
                Some(Value::Null) => Some(JobValue::null()),
                Some(raw) => Some(coerce_scalar(input, raw)?),
            },
        };

        Ok(value.map(|value| (input.id.clone(), value)))
    }

    async fn upload_input(
        &self,
        input: &WorkflowInput,
        directory: &str,
        payload: &FilePayload,
    ) -> Result<JobValue, WorkflowError> {
        let file_name = payload.upload_name();
        if file_name.is_empty() {
            return Err(WorkflowError::input(&input.id, "file has no name"));
        }

        let path = format!("{directory}/{file_name}");
        let reference = self
            .store
            .upload(&path, payload.bytes.clone())
            .await
            .map_err(|err| {
                WorkflowError::from_client(err, |source| WorkflowError::input(&input.id, source))
            })?;

        Ok(JobValue::file(reference))
    }
}

/// Every uploaded file lands in the job directory, so two file inputs must
/// not share a base name.
fn check_upload_names(
    workflow: &Workflow,
    request: &SubmissionRequest,
) -> Result<(), WorkflowError> {
    let mut claimed: HashMap<&str, &str> = HashMap::new();
    for input in workflow.inputs.iter().filter(|input| input.is_file()) {
        let Some(payload) = request.files.get(&input.id) else {
            continue;
        };
        let name = payload.upload_name();
        if name.is_empty() {
            continue;
        }
        if let Some(owner) = claimed.insert(name, &input.id) {
            return Err(WorkflowError::input(
                &input.id,
                format!("file {name} is already uploaded for input {owner}"),
            ));
        }
    }
    Ok(())
}

fn coerce_scalar(input: &WorkflowInput, raw: &Value) -> Result<JobValue, WorkflowError> {
    match input.input_type {
        InputType::Boolean => Ok(JobValue::boolean(truthy(raw))),
        InputType::Number => parse_integer(raw)
            .map(JobValue::integer)
            .ok_or_else(|| WorkflowError::input(&input.id, format!("{raw} is not an integer"))),
        _ => Ok(JobValue::Scalar(raw.clone())),
    }
}

/// Truthiness of a form control value. Strings spelled like a boolean
/// count as that boolean.
fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "no" | "n" | "off"
        ),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Base-10 integer from a JSON integer, an integral JSON float, or a
/// numeric string.
fn parse_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|n| n.is_finite() && n.fract() == 0.0)
                .filter(|n| *n >= i64::MIN as f64 && *n < i64::MAX as f64)
                .map(|n| n as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}
