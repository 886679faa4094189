use std::error::Error;

use log::{debug, error};
use reqwest::{Client, Method, RequestBuilder, Response};
use url::Url;

use crate::error::{ClientError, Result};
use crate::session::Session;

/// Executes an authenticated HTTP request and maps non-success statuses to
/// [`ClientError::Status`].
///
/// The credential header is read from `session` before anything is sent, so
/// a missing session fails without touching the network. `customize` adds
/// the request-specific headers and body.
pub async fn execute_request<F>(
    client: &Client,
    session: &Session,
    method: Method,
    url: &str,
    customize: F,
) -> Result<Response>
where
    F: FnOnce(RequestBuilder) -> RequestBuilder,
{
    let authorization = session.authorization_header()?;
    let url_val = parse_url(url)?;

    let request_builder = client
        .request(method.clone(), url_val.clone())
        .header(reqwest::header::AUTHORIZATION, authorization);
    let request_builder = customize(request_builder);

    debug!("Sending {} request to {}", method, url_val);
    let start_time = std::time::Instant::now();

    let response = request_builder.send().await.map_err(|e| {
        error!("Failed HTTP request {} {}: {}", method, url_val, e);
        if let Some(source) = e.source() {
            debug!("Error source: {:?}", source);
        }
        if e.is_timeout() {
            error!("Request timed out");
        }
        if e.is_connect() {
            error!("Connection error");
        }
        ClientError::Transport(e)
    })?;

    debug!(
        "Got response from {} {} after {:?} with status {}",
        method,
        url_val,
        start_time.elapsed(),
        response.status()
    );

    ensure_success(&method, url_val.as_str(), response).await
}

/// Passes 2xx responses through and turns everything else into an error
/// carrying the response body.
pub async fn ensure_success(method: &Method, url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        method: method.to_string(),
        url: url.to_string(),
        status,
        body,
    })
}

pub fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| ClientError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Builds a WebDAV extension method such as `PROPFIND` or `MKCOL`.
pub fn webdav_method(name: &str) -> Method {
    // Both verbs are plain ASCII tokens.
    Method::from_bytes(name.as_bytes()).unwrap_or(Method::GET)
}
