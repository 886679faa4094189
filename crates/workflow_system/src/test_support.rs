//! In-memory fakes for the store and job API.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use job_client::{ClientError, Job, JobApi, JobDescription, ObjectStore, Result};
use mockall::mock;
use reqwest::StatusCode;

mock! {
    pub Jobs {}

    #[async_trait]
    impl JobApi for Jobs {
        async fn list_jobs(&self) -> Result<Vec<Job>>;
        async fn get_job(&self, job_id: &str) -> Result<Job>;
        async fn submit_job(&self, description: &JobDescription) -> Result<Job>;
        async fn delete_job(&self, job_id: &str) -> Result<()>;
        async fn cancel_job(&self, job_id: &str) -> Result<()>;
    }
}

pub fn job(id: &str) -> Job {
    Job {
        id: id.to_string(),
        name: None,
        state: Some("Queued".to_string()),
        extra: Default::default(),
    }
}

pub fn status_error(code: u16) -> ClientError {
    ClientError::Status {
        method: "GET".to_string(),
        url: "http://localhost/test".to_string(),
        status: StatusCode::from_u16(code).unwrap(),
        body: String::new(),
    }
}

type Failure = Box<dyn Fn() -> ClientError + Send + Sync>;

/// Object store that serves canned documents and records every call as
/// `op:path`.
#[derive(Default)]
pub struct RecordingStore {
    listing: Vec<String>,
    documents: HashMap<String, String>,
    failing_fetches: HashSet<String>,
    listing_fails: bool,
    directory_failure: Option<Failure>,
    upload_failure: Option<Failure>,
    delays: Vec<(String, Duration)>,
    uploads: Mutex<HashMap<String, Bytes>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(mut self, entries: Vec<&str>) -> Self {
        self.listing = entries.into_iter().map(str::to_string).collect();
        self
    }

    /// Serves `content` at `path` and lists it after earlier entries.
    pub fn with_document(mut self, path: &str, content: &str) -> Self {
        self.listing.push(path.to_string());
        self.documents.insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_failing_fetch(mut self, path: &str) -> Self {
        self.listing.push(path.to_string());
        self.failing_fetches.insert(path.to_string());
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub fn with_directory_failure(
        mut self,
        failure: impl Fn() -> ClientError + Send + Sync + 'static,
    ) -> Self {
        self.directory_failure = Some(Box::new(failure));
        self
    }

    pub fn with_directory_error(self, code: u16) -> Self {
        self.with_directory_failure(move || status_error(code))
    }

    pub fn with_upload_error(mut self, code: u16) -> Self {
        self.upload_failure = Some(Box::new(move || status_error(code)));
        self
    }

    /// Slows down directory and upload calls under `prefix`.
    pub fn with_delay(mut self, prefix: &str, delay: Duration) -> Self {
        self.delays.push((prefix.to_string(), delay));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    pub fn uploaded(&self, path: &str) -> Option<Bytes> {
        self.uploads.lock().unwrap().get(path).cloned()
    }

    fn record(&self, op: &str, path: &str) {
        self.calls.lock().unwrap().push(format!("{op}:{path}"));
    }

    async fn pause(&self, path: &str) {
        let delay = self
            .delays
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn list(&self, directory_url: &str) -> Result<Vec<String>> {
        self.record("list", directory_url);
        if self.listing_fails {
            return Err(status_error(500));
        }
        Ok(self.listing.clone())
    }

    async fn fetch(&self, path: &str) -> Result<String> {
        self.record("fetch", path);
        if self.failing_fetches.contains(path) {
            return Err(status_error(500));
        }
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| status_error(404))
    }

    async fn ensure_directory(&self, path: &str) -> Result<()> {
        self.record("ensure", path);
        self.pause(path).await;
        match &self.directory_failure {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }

    async fn upload(&self, path: &str, bytes: Bytes) -> Result<String> {
        self.record("upload", path);
        self.pause(path).await;
        if let Some(failure) = &self.upload_failure {
            return Err(failure());
        }
        self.uploads.lock().unwrap().insert(path.to_string(), bytes);
        Ok(path.to_string())
    }
}
