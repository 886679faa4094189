use std::path::Path;

use serde::{Deserialize, Serialize};

const CONFIG_FILE_PATH: &str = "config.toml";

const DEFAULT_STORE_URL: &str = "http://localhost:8989";
const DEFAULT_STORE_ROOT: &str = "/webdav/";
const DEFAULT_CATALOG_DIR: &str = "cwl/";
const DEFAULT_JOBS_API: &str = "http://localhost:8080/jobs";
const DEFAULT_DEFINITION_EXTENSION: &str = ".cwl";

/// Endpoints and credentials for the document store and the job API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Scheme and authority of the WebDAV server, e.g. `http://localhost:8989`.
    pub store_url: String,
    /// Path prefix of the WebDAV collection root. Stripped from listed hrefs.
    pub store_root: String,
    /// Catalog directory, relative to `store_root`.
    pub catalog_dir: String,
    /// Base URL of the job API collection (`.../jobs`).
    pub jobs_api: String,
    pub definition_extension: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: DEFAULT_STORE_URL.to_string(),
            store_root: DEFAULT_STORE_ROOT.to_string(),
            catalog_dir: DEFAULT_CATALOG_DIR.to_string(),
            jobs_api: DEFAULT_JOBS_API.to_string(),
            definition_extension: DEFAULT_DEFINITION_EXTENSION.to_string(),
            username: None,
            password: None,
        }
    }
}

impl Config {
    /// Loads `config.toml` from the working directory when present, then
    /// applies environment overrides.
    pub fn new() -> Self {
        let mut config = Self::load(Path::new(CONFIG_FILE_PATH));
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Reads a TOML config file. Missing or invalid files yield the defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Config::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(file_config) => file_config,
                Err(err) => {
                    log::warn!("Ignoring invalid {}: {err}", path.display());
                    Config::default()
                }
            },
            Err(err) => {
                log::warn!("Failed to read {}: {err}", path.display());
                Config::default()
            }
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(store_url) = lookup("WEBDAV_URL") {
            self.store_url = store_url;
        }
        if let Some(store_root) = lookup("WEBDAV_ROOT") {
            self.store_root = store_root;
        }
        if let Some(catalog_dir) = lookup("CWL_DIR") {
            self.catalog_dir = catalog_dir;
        }
        if let Some(jobs_api) = lookup("JOBS_API_URL") {
            self.jobs_api = jobs_api;
        }
        if let Some(extension) = lookup("CWL_EXTENSION") {
            self.definition_extension = extension;
        }
        if let Some(username) = lookup("WEBDAV_USER") {
            self.username = Some(username);
        }
        if let Some(password) = lookup("WEBDAV_PASSWORD") {
            self.password = Some(password);
        }
    }

    /// `store_root` normalised to start and end with a single `/`.
    pub fn root_prefix(&self) -> String {
        let trimmed = self.store_root.trim_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        }
    }

    /// Full URL of the catalog collection.
    pub fn catalog_url(&self) -> String {
        format!(
            "{}{}{}",
            self.store_url.trim_end_matches('/'),
            self.root_prefix(),
            self.catalog_dir.trim_start_matches('/')
        )
    }
}
