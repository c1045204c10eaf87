//! Document store view access
//!
//! Views are queried by key set with the CouchDB flags `include_docs`,
//! `reduce`, `group` and `descending`. Rows come back in view order as
//! `{id, key, value, doc}` objects, any of which may be absent depending on
//! the query mode.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

mod client;
pub use client::CouchClient;

/// Options for one view query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewQuery {
    /// Keys to look up; empty means the whole view
    pub keys: Vec<Value>,
    pub include_docs: Option<bool>,
    pub reduce: Option<bool>,
    pub group: Option<bool>,
    pub descending: Option<bool>,
}

impl ViewQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(mut self, keys: Vec<Value>) -> Self {
        self.keys = keys;
        self
    }

    pub fn include_docs(mut self, flag: bool) -> Self {
        self.include_docs = Some(flag);
        self
    }

    pub fn reduce(mut self, flag: bool) -> Self {
        self.reduce = Some(flag);
        self
    }

    pub fn group(mut self, flag: bool) -> Self {
        self.group = Some(flag);
        self
    }

    pub fn descending(mut self, flag: bool) -> Self {
        self.descending = Some(flag);
        self
    }

    /// Flags as query-string pairs (keys travel in the request body)
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        [
            ("include_docs", self.include_docs),
            ("reduce", self.reduce),
            ("group", self.group),
            ("descending", self.descending),
        ]
        .into_iter()
        .filter_map(|(name, flag)| flag.map(|f| (name, f.to_string())))
        .collect()
    }
}

/// One row of a view response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    /// Source document id (absent on reduced rows)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub key: Value,

    #[serde(default)]
    pub value: Value,

    /// Full document when `include_docs=true`; `null` for deleted docs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Value>,
}

impl ViewRow {
    /// Row carrying a document under `id`
    pub fn document(id: impl Into<String>, doc: Value) -> Self {
        Self {
            id: Some(id.into()),
            doc: Some(doc),
            ..Self::default()
        }
    }

    /// Reduced row: `key` grouped to `value`, no document id
    pub fn reduced(key: Value, value: Value) -> Self {
        Self {
            key,
            value,
            ..Self::default()
        }
    }

    /// Identifier to feed into a follow-up key query
    ///
    /// Map rows identify themselves by `id`; reduced rows only have `key`.
    pub fn identifier(&self) -> Option<Value> {
        match &self.id {
            Some(id) => Some(Value::String(id.clone())),
            None if !self.key.is_null() => Some(self.key.clone()),
            None => None,
        }
    }
}

/// Body of a view response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,

    #[serde(default)]
    pub rows: Vec<ViewRow>,
}

/// Read-only access to named views
#[async_trait]
pub trait ViewSource: Send + Sync {
    /// Run one query against `view`
    ///
    /// Rows are returned in view order. Failures are returned as-is; no
    /// retry happens at this layer.
    async fn query(&self, view: &str, query: &ViewQuery) -> Result<ViewResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_params_only_set_flags() {
        let q = ViewQuery::new().reduce(true).group(true).descending(true);
        assert_eq!(
            q.query_params(),
            vec![
                ("reduce", "true".to_string()),
                ("group", "true".to_string()),
                ("descending", "true".to_string()),
            ]
        );
        assert!(ViewQuery::new().query_params().is_empty());
    }

    #[test]
    fn test_row_deserializes_map_and_reduce_shapes() {
        let response: ViewResponse = serde_json::from_value(json!({
            "total_rows": 2,
            "offset": 0,
            "rows": [
                {"id": "doc1", "key": "req1", "value": null, "doc": {"_id": "doc1", "workflow": "req1"}},
                {"key": "req2", "value": "doc7"},
                {"id": "doc3", "key": "req3", "value": null, "doc": null}
            ]
        }))
        .unwrap();

        assert_eq!(response.total_rows, Some(2));
        assert_eq!(response.rows.len(), 3);
        assert_eq!(response.rows[0].id.as_deref(), Some("doc1"));
        assert_eq!(response.rows[1].id, None);
        assert_eq!(response.rows[1].value, json!("doc7"));
        assert_eq!(response.rows[2].doc, None);
    }

    #[test]
    fn test_reduced_response_without_totals() {
        let response: ViewResponse =
            serde_json::from_value(json!({"rows": [{"key": "r", "value": 1}]})).unwrap();
        assert_eq!(response.total_rows, None);
        assert_eq!(response.rows[0].identifier(), Some(json!("r")));
    }

    #[test]
    fn test_identifier_prefers_id() {
        assert_eq!(
            ViewRow::document("doc1", json!({})).identifier(),
            Some(json!("doc1"))
        );
        assert_eq!(
            ViewRow::reduced(json!(["req", "agent"]), json!(3)).identifier(),
            Some(json!(["req", "agent"]))
        );
        assert_eq!(ViewRow::default().identifier(), None);
    }
}
