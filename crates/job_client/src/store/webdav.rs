use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, info};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};

use crate::client_trait::ObjectStore;
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::session::Session;
use crate::store::propfind::{parse_multistatus, PROPFIND_BODY};
use crate::utils::http_utils::{execute_request, parse_url, webdav_method};

/// [`ObjectStore`] backed by a WebDAV server.
#[derive(Debug, Clone)]
pub struct WebDavStore {
    client: Client,
    session: Session,
    store_url: String,
    root_prefix: String,
}

impl WebDavStore {
    pub fn new(config: &Config, session: Session) -> Self {
        Self::with_client(Client::new(), config, session)
    }

    pub fn with_client(client: Client, config: &Config, session: Session) -> Self {
        Self {
            client,
            session,
            store_url: config.store_url.trim_end_matches('/').to_string(),
            root_prefix: config.root_prefix(),
        }
    }

    /// URL of `relative` under the store root, percent-encoding each segment.
    /// Collections get a trailing slash.
    pub fn resource_url(&self, relative: &str, collection: bool) -> Result<String> {
        let mut url = parse_url(&self.store_url)?;
        let segments = self
            .root_prefix
            .split('/')
            .chain(relative.split('/'))
            .filter(|segment| !segment.is_empty());

        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl {
                    url: self.store_url.clone(),
                    reason: "store URL cannot carry a path".to_string(),
                })?;
            path.clear().extend(segments);
            if collection {
                path.push("");
            }
        }

        Ok(url.to_string())
    }

    fn server_url(&self, absolute_path: &str) -> String {
        format!("{}/{}", self.store_url, absolute_path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ObjectStore for WebDavStore {
    async fn list(&self, directory_url: &str) -> Result<Vec<String>> {
        let response = execute_request(
            &self.client,
            &self.session,
            webdav_method("PROPFIND"),
            directory_url,
            |b| {
                b.header("Depth", "1")
                    .header(CONTENT_TYPE, HeaderValue::from_static("application/xml"))
                    .body(PROPFIND_BODY)
            },
        )
        .await?;

        let content = response.text().await?;
        let hrefs = parse_multistatus(&content)?;
        debug!("Listed {} entries under {}", hrefs.len(), directory_url);
        Ok(hrefs)
    }

    async fn fetch(&self, path: &str) -> Result<String> {
        let url = self.server_url(path);
        let response = execute_request(&self.client, &self.session, Method::GET, &url, |b| b).await?;
        Ok(response.text().await?)
    }

    async fn ensure_directory(&self, path: &str) -> Result<()> {
        let url = self.resource_url(path, true)?;

        match execute_request(&self.client, &self.session, Method::GET, &url, |b| b).await {
            Ok(_) => {
                debug!("Directory {url} already exists");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                info!("Creating directory {url}");
                execute_request(
                    &self.client,
                    &self.session,
                    webdav_method("MKCOL"),
                    &url,
                    |b| b,
                )
                .await?;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn upload(&self, path: &str, bytes: Bytes) -> Result<String> {
        let url = self.resource_url(path, false)?;
        let size = bytes.len();

        execute_request(&self.client, &self.session, Method::PUT, &url, |b| {
            b.header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            )
            .body(bytes)
        })
        .await?;

        info!("Uploaded {size} bytes to {url}");
        Ok(path.trim_matches('/').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> WebDavStore {
        WebDavStore::new(&Config::default(), Session::new())
    }

    #[test]
    fn resource_urls_live_under_the_root() {
        let store = store();
        assert_eq!(
            store.resource_url("run-1", true).unwrap(),
            "http://localhost:8989/webdav/run-1/"
        );
        assert_eq!(
            store.resource_url("run-1/reads.fastq", false).unwrap(),
            "http://localhost:8989/webdav/run-1/reads.fastq"
        );
    }

    #[test]
    fn resource_url_segments_are_encoded() {
        assert_eq!(
            store().resource_url("my run/a b.txt", false).unwrap(),
            "http://localhost:8989/webdav/my%20run/a%20b.txt"
        );
    }

    #[test]
    fn server_urls_join_absolute_paths() {
        assert_eq!(
            store().server_url("/webdav/cwl/a.cwl"),
            "http://localhost:8989/webdav/cwl/a.cwl"
        );
    }
}
