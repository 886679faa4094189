//! Notifications for observers of the catalog, the job list and submissions

use job_client::Job;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// Stage of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    EnsuringDirectory,
    ResolvingInputs,
    Submitting,
    Succeeded,
    Failed(String),
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Succeeded | SubmissionState::Failed(_))
    }

    /// Forward-only transitions; any non-terminal state may fail.
    pub fn can_advance_to(&self, next: &SubmissionState) -> bool {
        use SubmissionState::*;
        match (self, next) {
            (Idle, EnsuringDirectory)
            | (EnsuringDirectory, ResolvingInputs)
            | (ResolvingInputs, Submitting)
            | (Submitting, Succeeded) => true,
            (current, Failed(_)) => !current.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    CatalogRefreshed { count: usize },
    SelectedJobChanged(Option<Job>),
    JobListChanged,
    ConnectionChanged(bool),
    SubmissionProgress {
        job_name: String,
        state: SubmissionState,
    },
}

/// Broadcast channel shared by the catalog, job manager and submitter.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    /// Publishing without subscribers is fine.
    pub fn publish(&self, event: WorkflowEvent) {
        log::debug!("event: {event:?}");
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
