//! Wires the store, job API, catalog and submitter for one session

use std::sync::Arc;

use job_client::{Config, JobApi, JobsClient, ObjectStore, Session, WebDavStore};

use crate::catalog::WorkflowCatalog;
use crate::events::EventBus;
use crate::jobs::JobManager;
use crate::submitter::JobSubmitter;

/// Everything a front end needs, sharing one session and one event bus.
pub struct WorkflowService {
    pub catalog: WorkflowCatalog,
    pub jobs: Arc<JobManager>,
    pub submitter: JobSubmitter,
    events: EventBus,
}

impl WorkflowService {
    pub fn new(config: &Config) -> Self {
        let session = Session::new();
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            session.connect(username.as_str(), password.as_str());
        }

        let store: Arc<dyn ObjectStore> = Arc::new(WebDavStore::new(config, session.clone()));
        let api: Arc<dyn JobApi> = Arc::new(JobsClient::new(config, session.clone()));
        Self::from_parts(config, store, api, session)
    }

    /// Builds the service over caller-provided transports.
    pub fn from_parts(
        config: &Config,
        store: Arc<dyn ObjectStore>,
        api: Arc<dyn JobApi>,
        session: Session,
    ) -> Self {
        let events = EventBus::new();
        let jobs = Arc::new(JobManager::new(api, session, events.clone()));
        Self {
            catalog: WorkflowCatalog::new(store.clone(), config, events.clone()),
            submitter: JobSubmitter::new(store, jobs.clone()),
            jobs,
            events,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}
