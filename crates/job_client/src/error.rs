use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no active session: connect with a username and password first")]
    NotAuthenticated,

    #[error("{method} {url} failed with status {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid directory listing: {0}")]
    InvalidListing(String),

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ClientError {
    /// True when the server answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: StatusCode) -> ClientError {
        ClientError::Status {
            method: "GET".to_string(),
            url: "http://localhost/webdav/job/".to_string(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn not_found_is_detected_only_for_404() {
        assert!(status_error(StatusCode::NOT_FOUND).is_not_found());
        assert!(!status_error(StatusCode::FORBIDDEN).is_not_found());
        assert!(!ClientError::NotAuthenticated.is_not_found());
    }

    #[test]
    fn status_error_message_names_request() {
        let message = status_error(StatusCode::INTERNAL_SERVER_ERROR).to_string();
        assert!(message.contains("GET http://localhost/webdav/job/"));
        assert!(message.contains("500"));
    }
}
