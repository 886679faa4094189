use async_trait::async_trait;
use log::info;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;

use crate::api::models::{Job, JobDescription};
use crate::client_trait::JobApi;
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::session::Session;
use crate::utils::http_utils::{execute_request, parse_url};

/// HTTP client for the job API (`GET/POST /jobs`, `GET/DELETE /jobs/{id}`,
/// `POST /jobs/{id}/cancel`).
#[derive(Debug, Clone)]
pub struct JobsClient {
    client: Client,
    session: Session,
    base_url: String,
}

impl JobsClient {
    pub fn new(config: &Config, session: Session) -> Self {
        Self::with_client(Client::new(), &config.jobs_api, session)
    }

    pub fn with_client(client: Client, base_url: &str, session: Session) -> Self {
        Self {
            client,
            session,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of one job, or of an action under it. The id is a single
    /// percent-encoded segment.
    fn job_url(&self, job_id: &str, action: Option<&str>) -> Result<String> {
        let mut url = parse_url(&self.base_url)?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl {
                    url: self.base_url.clone(),
                    reason: "job API URL cannot carry a path".to_string(),
                })?;
            path.pop_if_empty().push(job_id);
            if let Some(action) = action {
                path.push(action);
            }
        }
        Ok(url.to_string())
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| ClientError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl JobApi for JobsClient {
    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let response =
            execute_request(&self.client, &self.session, Method::GET, &self.base_url, |b| b)
                .await?;
        Self::decode(&self.base_url, response).await
    }

    async fn get_job(&self, job_id: &str) -> Result<Job> {
        let url = self.job_url(job_id, None)?;
        let response = execute_request(&self.client, &self.session, Method::GET, &url, |b| b).await?;
        Self::decode(&url, response).await
    }

    async fn submit_job(&self, description: &JobDescription) -> Result<Job> {
        info!(
            "Submitting job {} for workflow {}",
            description.name, description.workflow
        );
        let response = execute_request(
            &self.client,
            &self.session,
            Method::POST,
            &self.base_url,
            |b| b.json(description),
        )
        .await?;
        Self::decode(&self.base_url, response).await
    }

    async fn delete_job(&self, job_id: &str) -> Result<()> {
        let url = self.job_url(job_id, None)?;
        execute_request(&self.client, &self.session, Method::DELETE, &url, |b| b).await?;
        info!("Deleted job {job_id}");
        Ok(())
    }

    async fn cancel_job(&self, job_id: &str) -> Result<()> {
        let url = self.job_url(job_id, Some("cancel"))?;
        execute_request(&self.client, &self.session, Method::POST, &url, |b| b).await?;
        info!("Cancelled job {job_id}");
        Ok(())
    }
}
