//! Sequential view fetching and render cycles
//!
//! One render cycle runs three view queries, each starting only after the
//! previous one resolved:
//! 1. request-registry documents (`campaign-request`, `include_docs`)
//! 2. latest agent entry per request (`latest-request`, reduced and grouped)
//! 3. the agent documents for those entries (`latest-request`, `include_docs`)
//!
//! The registry rows and agent rows are then merged and projected into a
//! table. Cycles are numbered; a cycle that finishes after a newer one has
//! already been published is returned to its caller but not published.

use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use wmstats_common::config::TomlConfig;

use crate::couch::{ViewQuery, ViewRow, ViewSource};
use crate::error::Result;
use crate::merge::merge;
use crate::view::{build_table, TableModel};

/// View names inside the design document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewNames {
    /// Request-registry view
    pub campaign: String,
    /// Execution-agent view (map + reduce)
    pub latest: String,
}

impl Default for ViewNames {
    fn default() -> Self {
        Self {
            campaign: "campaign-request".to_string(),
            latest: "latest-request".to_string(),
        }
    }
}

impl From<&TomlConfig> for ViewNames {
    fn from(config: &TomlConfig) -> Self {
        Self {
            campaign: config.campaign_view.clone(),
            latest: config.latest_view.clone(),
        }
    }
}

/// Identifiers of `rows`, in row order, for use as a follow-up key set
pub fn keys_from_rows(rows: &[ViewRow]) -> Vec<Value> {
    rows.iter().filter_map(ViewRow::identifier).collect()
}

/// Runs the view queries and hands the batches to the merger
pub struct FetchOrchestrator {
    source: Arc<dyn ViewSource>,
    views: ViewNames,
}

impl FetchOrchestrator {
    pub fn new(source: Arc<dyn ViewSource>, views: ViewNames) -> Self {
        Self { source, views }
    }

    /// Fetch the request-registry batch and the execution-agent batch
    pub async fn fetch_batches(&self) -> Result<(Vec<ViewRow>, Vec<ViewRow>)> {
        let registry = self
            .source
            .query(&self.views.campaign, &ViewQuery::new().include_docs(true))
            .await?;
        info!(rows = registry.rows.len(), "Fetched request registry rows");

        let request_keys = keys_from_rows(&registry.rows);
        if request_keys.is_empty() {
            return Ok((registry.rows, Vec::new()));
        }

        // Reduce results cannot carry documents, hence the extra round trip
        let latest = self
            .source
            .query(
                &self.views.latest,
                &ViewQuery::new()
                    .keys(request_keys)
                    .reduce(true)
                    .group(true)
                    .descending(true),
            )
            .await?;

        let agent_keys = keys_from_rows(&latest.rows);
        info!(keys = agent_keys.len(), "Resolved latest agent entries");
        if agent_keys.is_empty() {
            return Ok((registry.rows, Vec::new()));
        }

        let agent = self
            .source
            .query(
                &self.views.latest,
                &ViewQuery::new()
                    .keys(agent_keys)
                    .reduce(false)
                    .include_docs(true),
            )
            .await?;
        info!(rows = agent.rows.len(), "Fetched agent rows");

        Ok((registry.rows, agent.rows))
    }

    /// Fetch, merge and project into a table
    pub async fn load_table(&self) -> Result<TableModel> {
        let (registry, agent) = self.fetch_batches().await?;
        let store = merge(&registry, &agent)?;
        info!(requests = store.len(), "Merged request records");
        Ok(build_table(&store))
    }

    /// Run one numbered cycle and publish its table if still current
    pub async fn run_cycle(&self, cycles: &RenderCycles) -> Result<Arc<PublishedTable>> {
        let generation = cycles.begin();

        let table = match self.load_table().await {
            Ok(table) => table,
            Err(e) => {
                error!(generation, "Render cycle failed: {}", e);
                return Err(e);
            }
        };

        let published = Arc::new(PublishedTable { generation, table });
        if !cycles.publish(Arc::clone(&published)).await {
            warn!(generation, "Discarding stale render cycle result");
        }
        Ok(published)
    }
}

/// Table produced by one render cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedTable {
    pub generation: u64,
    #[serde(flatten)]
    pub table: TableModel,
}

/// Generation counter and the last published table
#[derive(Debug, Default)]
pub struct RenderCycles {
    next: AtomicU64,
    published: RwLock<Option<Arc<PublishedTable>>>,
}

impl RenderCycles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a cycle; generations start at 1 and only increase
    pub fn begin(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish unless a newer generation is already published
    ///
    /// Returns `false` when `table` was stale and dropped.
    pub async fn publish(&self, table: Arc<PublishedTable>) -> bool {
        let mut slot = self.published.write().await;
        if let Some(current) = slot.as_ref() {
            if current.generation > table.generation {
                return false;
            }
        }
        *slot = Some(table);
        true
    }

    /// Most recently published table
    pub async fn latest(&self) -> Option<Arc<PublishedTable>> {
        self.published.read().await.clone()
    }
}
