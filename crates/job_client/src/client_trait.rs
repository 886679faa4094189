use async_trait::async_trait;
use bytes::Bytes;

use crate::api::models::{Job, JobDescription};
use crate::error::Result;

/// Remote document store holding workflow definitions, job directories and
/// uploaded inputs. Paths are relative to the store root unless noted.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Immediate children of the collection at `directory_url` (depth 1), as
    /// the absolute paths the server reports.
    async fn list(&self, directory_url: &str) -> Result<Vec<String>>;

    /// Raw text of the document at the absolute server path `path`.
    async fn fetch(&self, path: &str) -> Result<String>;

    /// Creates the single collection `path` unless it already exists.
    async fn ensure_directory(&self, path: &str) -> Result<()>;

    /// Writes `bytes` to `path`, overwriting, and returns the reference to
    /// put in a job document.
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<String>;
}

#[async_trait]
pub trait JobApi: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<Job>>;

    async fn get_job(&self, job_id: &str) -> Result<Job>;

    async fn submit_job(&self, description: &JobDescription) -> Result<Job>;

    async fn delete_job(&self, job_id: &str) -> Result<()>;

    async fn cancel_job(&self, job_id: &str) -> Result<()>;
}
