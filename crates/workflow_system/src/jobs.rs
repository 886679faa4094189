//! Connection handling and job bookkeeping

use std::sync::{Arc, RwLock};

use job_client::{Job, JobApi, Session};
use log::info;

use crate::events::{EventBus, WorkflowEvent};
use crate::types::WorkflowError;

/// Owns the session lifecycle and the selected job.
pub struct JobManager {
    api: Arc<dyn JobApi>,
    session: Session,
    events: EventBus,
    selected: RwLock<Option<Job>>,
}

impl JobManager {
    pub fn new(api: Arc<dyn JobApi>, session: Session, events: EventBus) -> Self {
        Self {
            api,
            session,
            events,
            selected: RwLock::new(None),
        }
    }

    pub fn api(&self) -> &Arc<dyn JobApi> {
        &self.api
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Stores the credentials and checks them by listing jobs. Rejected
    /// credentials are cleared again.
    pub async fn connect(&self, username: &str, password: &str) -> Result<Vec<Job>, WorkflowError> {
        self.session.connect(username, password);

        match self.api.list_jobs().await {
            Ok(jobs) => {
                info!("Connected as {username}");
                self.events.publish(WorkflowEvent::ConnectionChanged(true));
                Ok(jobs)
            }
            Err(err) => {
                self.session.disconnect();
                Err(WorkflowError::from_client(err, |source| {
                    WorkflowError::JobRequestFailed { source }
                }))
            }
        }
    }

    pub fn disconnect(&self) {
        self.session.disconnect();
        self.select_job(None);
        self.events.publish(WorkflowEvent::ConnectionChanged(false));
        info!("Disconnected");
    }

    pub async fn list_jobs(&self) -> Result<Vec<Job>, WorkflowError> {
        self.api.list_jobs().await.map_err(request_failed)
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Job, WorkflowError> {
        self.api.get_job(job_id).await.map_err(request_failed)
    }

    pub async fn cancel_job(&self, job_id: &str) -> Result<(), WorkflowError> {
        self.api.cancel_job(job_id).await.map_err(request_failed)?;
        self.request_list_refresh();
        Ok(())
    }

    /// Deleting the selected job also clears the selection.
    pub async fn delete_job(&self, job_id: &str) -> Result<(), WorkflowError> {
        self.api.delete_job(job_id).await.map_err(request_failed)?;

        let was_selected = self
            .selected_job()
            .map(|job| job.id == job_id)
            .unwrap_or(false);
        if was_selected {
            self.select_job(None);
        }
        self.request_list_refresh();
        Ok(())
    }

    pub fn select_job(&self, job: Option<Job>) {
        {
            let mut selected = self
                .selected
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *selected = job.clone();
        }
        self.events.publish(WorkflowEvent::SelectedJobChanged(job));
    }

    pub fn selected_job(&self) -> Option<Job> {
        self.selected
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn request_list_refresh(&self) {
        self.events.publish(WorkflowEvent::JobListChanged);
    }
}

fn request_failed(err: job_client::ClientError) -> WorkflowError {
    WorkflowError::from_client(err, |source| WorkflowError::JobRequestFailed { source })
}
