//! Workflow catalog backed by a remote definition directory

use std::sync::{Arc, RwLock};

use futures::future::join_all;
use job_client::{Config, ObjectStore};
use log::{debug, info, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::events::{EventBus, WorkflowEvent};
use crate::parser::DefinitionParser;
use crate::types::{Workflow, WorkflowError};

/// Lists the definition files directly under `directory_url`.
///
/// Only entries whose name ends with `extension` (case-insensitive) are
/// kept; collections and other files are skipped.
pub async fn list_definitions(
    store: &dyn ObjectStore,
    directory_url: &str,
    extension: &str,
) -> Result<Vec<String>, WorkflowError> {
    let entries = store.list(directory_url).await.map_err(|err| {
        WorkflowError::from_client(err, |source| WorkflowError::ListingFailed { source })
    })?;

    let extension = extension.to_lowercase();
    Ok(entries
        .into_iter()
        .filter(|entry| !entry.ends_with('/') && entry.to_lowercase().ends_with(&extension))
        .collect())
}

/// The session's set of runnable workflows.
pub struct WorkflowCatalog {
    store: Arc<dyn ObjectStore>,
    parser: DefinitionParser,
    catalog_url: String,
    extension: String,
    events: EventBus,
    workflows: RwLock<Vec<Workflow>>,
}

impl WorkflowCatalog {
    pub fn new(store: Arc<dyn ObjectStore>, config: &Config, events: EventBus) -> Self {
        Self {
            store,
            parser: DefinitionParser::new(config.root_prefix()),
            catalog_url: config.catalog_url(),
            extension: config.definition_extension.clone(),
            events,
            workflows: RwLock::new(Vec::new()),
        }
    }

    /// Re-reads every definition and replaces the catalog.
    ///
    /// Documents that cannot be fetched or parsed, or that have no label, are
    /// skipped. Only a failed listing fails the refresh.
    pub async fn refresh(&self) -> Result<Vec<Workflow>, WorkflowError> {
        let paths =
            list_definitions(self.store.as_ref(), &self.catalog_url, &self.extension).await?;
        info!("Found {} workflow definitions under {}", paths.len(), self.catalog_url);

        let fetches = paths.iter().map(|path| async move {
            let fetched = self.store.fetch(path).await;
            (path, fetched)
        });

        let mut workflows: Vec<Workflow> = join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(path, fetched)| {
                let content = match fetched {
                    Ok(content) => content,
                    Err(err) => {
                        warn!("Skipping {path}: {err}");
                        return None;
                    }
                };
                match self.parser.parse(path, &content) {
                    Ok(workflow) if workflow.has_name() => Some(workflow),
                    Ok(_) => {
                        debug!("Skipping {path}: definition has no label");
                        None
                    }
                    Err(err) => {
                        warn!("Skipping {path}: {err}");
                        None
                    }
                }
            })
            .collect();

        sort_by_name(&mut workflows);

        {
            let mut current = self
                .workflows
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *current = workflows.clone();
        }

        self.events.publish(WorkflowEvent::CatalogRefreshed {
            count: workflows.len(),
        });
        Ok(workflows)
    }

    /// Workflows from the last successful refresh.
    pub fn workflows(&self) -> Vec<Workflow> {
        self.workflows
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Looks a workflow up by filename, or by case-insensitive name.
    pub fn find(&self, key: &str) -> Option<Workflow> {
        let workflows = self
            .workflows
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        workflows
            .iter()
            .find(|workflow| workflow.filename == key)
            .or_else(|| {
                workflows.iter().find(|workflow| {
                    workflow
                        .name
                        .as_deref()
                        .map(|name| name.to_lowercase() == key.to_lowercase())
                        .unwrap_or(false)
                })
            })
            .cloned()
    }
}

/// Ascending by name, ignoring case; equal names keep their order.
fn sort_by_name(workflows: &mut [Workflow]) {
    workflows.sort_by_cached_key(|workflow| {
        collation_key(workflow.name.as_deref().unwrap_or_default())
    });
}

/// Orders by base letters first and accents second, never by case, so
/// `Éclair` sits between `apple` and `Zeta` and `eclair` precedes `éclair`.
fn collation_key(name: &str) -> (String, String) {
    let folded: String = name.nfd().flat_map(char::to_lowercase).collect();
    let base = folded.chars().filter(|c| !is_combining_mark(*c)).collect();
    (base, folded)
}
