pub mod api;
pub mod client_trait;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod utils;

pub use api::client::JobsClient;
pub use api::models::{FileRef, Job, JobDescription, JobValue};
pub use client_trait::{JobApi, ObjectStore};
pub use config::Config;
pub use error::{ClientError, Result};
pub use session::{Credentials, Session};
pub use store::webdav::WebDavStore;
