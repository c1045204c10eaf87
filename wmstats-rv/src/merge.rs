//! Merging partial request records from two sources
//!
//! The request-registry batch is applied first, then the execution-agent
//! batch. A row whose id is new inserts its document as-is; a row whose id
//! is already known overlays its top-level fields onto the stored record.
//! Nested objects are replaced whole, never merged.

use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

use crate::couch::ViewRow;
use crate::error::{Error, Result};

/// One partial request document
pub type Record = Map<String, Value>;

/// Batch label used in error reports for the request-registry rows
pub const PRIMARY_BATCH: &str = "primary";
/// Batch label used in error reports for the execution-agent rows
pub const SECONDARY_BATCH: &str = "secondary";

/// Merged records keyed by id, remembering first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestStore {
    order: Vec<String>,
    records: HashMap<String, Record>,
}

impl RequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or shallow-overlay one record
    pub fn update(&mut self, id: &str, doc: Record) {
        match self.records.get_mut(id) {
            Some(existing) => {
                for (field, value) in doc {
                    existing.insert(field, value);
                }
            }
            None => {
                self.order.push(id.to_string());
                self.records.insert(id.to_string(), doc);
            }
        }
    }

    /// Apply every row of one batch in order
    ///
    /// Stops at the first row without an id, or whose document is neither
    /// an object nor null. Rows before the failing one stay applied.
    pub fn update_bulk(&mut self, batch: &'static str, rows: &[ViewRow]) -> Result<()> {
        for (index, row) in rows.iter().enumerate() {
            let id = row
                .id
                .as_deref()
                .ok_or(Error::MissingIdentifier { batch, index })?;

            let doc = match &row.doc {
                None | Some(Value::Null) => Record::new(),
                Some(Value::Object(map)) => map.clone(),
                Some(_) => {
                    return Err(Error::InvalidRecord { id: id.to_string() });
                }
            };

            self.update(id, doc);
        }

        debug!(batch = batch, rows = rows.len(), records = self.len(), "Applied batch");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids in first-seen order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// `(id, record)` pairs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id).map(|r| (id.as_str(), r)))
    }

    /// Records in first-seen order
    pub fn get_list(&self) -> Vec<&Record> {
        self.iter().map(|(_, record)| record).collect()
    }
}

/// Build a fresh store from the two batches
///
/// Fields present in both batches take the secondary batch's value.
pub fn merge(primary: &[ViewRow], secondary: &[ViewRow]) -> Result<RequestStore> {
    let mut store = RequestStore::new();
    store.update_bulk(PRIMARY_BATCH, primary)?;
    store.update_bulk(SECONDARY_BATCH, secondary)?;
    Ok(store)
}
