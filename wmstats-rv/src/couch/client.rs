//! HTTP client for CouchDB design-document views

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use wmstats_common::config::TomlConfig;

use super::{ViewQuery, ViewResponse, ViewSource};
use crate::error::{Error, Result};

/// CouchDB view client
///
/// Queries `{couch_url}/{database}/_design/{design}/_view/{view}`. Key sets
/// are POSTed as `{"keys": [...]}` so long key lists never hit URL length
/// limits; queries without keys use GET.
pub struct CouchClient {
    /// HTTP client for view requests
    http_client: Client,
    base_url: String,
    database: String,
    design: String,
}

impl CouchClient {
    /// Create a client for one database/design document pair
    pub fn new(
        couch_url: &str,
        database: &str,
        design: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: couch_url.trim_end_matches('/').to_string(),
            database: database.to_string(),
            design: design.to_string(),
        })
    }

    /// Create a client from bootstrap configuration
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        Self::new(
            &config.couch_url,
            &config.database,
            &config.design,
            config.request_timeout(),
        )
    }

    /// Full URL of a view
    pub fn view_url(&self, view: &str) -> String {
        format!(
            "{}/{}/_design/{}/_view/{}",
            self.base_url, self.database, self.design, view
        )
    }
}

#[async_trait]
impl ViewSource for CouchClient {
    async fn query(&self, view: &str, query: &ViewQuery) -> Result<ViewResponse> {
        let url = self.view_url(view);
        let params = query.query_params();

        debug!(
            view = %view,
            keys = query.keys.len(),
            params = ?params,
            "Querying view"
        );

        let request = if query.keys.is_empty() {
            self.http_client.get(&url)
        } else {
            self.http_client
                .post(&url)
                .json(&json!({ "keys": query.keys }))
        };

        let response = request
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::Network(format!("View '{}' request failed: {}", view, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: ViewResponse = response.json().await.map_err(|e| {
            Error::Parse(format!("Failed to parse view '{}' response: {}", view, e))
        })?;

        debug!(view = %view, rows = body.rows.len(), "View query complete");

        Ok(body)
    }
}
