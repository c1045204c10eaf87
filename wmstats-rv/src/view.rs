//! Row view-models handed to the table renderer
//!
//! A row is the five projected request fields, verbatim, followed by the
//! nine derived counters in `DerivedColumn::ALL` order.

use serde::Serialize;
use serde_json::{Number, Value};

use crate::merge::{Record, RequestStore};
use crate::metrics::{DerivedColumn, DerivedMetrics};

/// Request fields copied into the table as-is: `(field, title)`
pub const PROJECTED_FIELDS: [(&str, &str); 5] = [
    ("workflow", "workflow"),
    ("requestor", "requestor"),
    ("request_type", "type"),
    ("inputdataset", "inputdataset"),
    ("site_white_list", "site white list"),
];

/// One table column as the renderer sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub key: &'static str,
    pub title: &'static str,
}

/// Rendered cells for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowViewModel {
    pub id: String,
    pub cells: Vec<Value>,
}

impl RowViewModel {
    /// Cell under column `key`, if such a column exists
    pub fn cell(&self, key: &str) -> Option<&Value> {
        columns()
            .iter()
            .position(|c| c.key == key)
            .and_then(|i| self.cells.get(i))
    }
}

/// Column specification plus rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableModel {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<RowViewModel>,
}

/// Fixed column order: projections, then derived columns
pub fn columns() -> Vec<ColumnSpec> {
    PROJECTED_FIELDS
        .iter()
        .map(|&(key, title)| ColumnSpec { key, title })
        .chain(DerivedColumn::ALL.iter().map(|c| ColumnSpec {
            key: c.key(),
            title: c.title(),
        }))
        .collect()
}

/// Whole numbers become JSON integers, everything else a float.
/// Non-finite values have no JSON form and render as null.
fn metric_value(value: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53

    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT {
        Value::Number(Number::from(value as i64))
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

/// Project one record into its row
pub fn build_row(id: &str, record: &Record) -> RowViewModel {
    let mut cells: Vec<Value> = PROJECTED_FIELDS
        .iter()
        .map(|(field, _)| record.get(*field).cloned().unwrap_or(Value::Null))
        .collect();

    cells.extend(
        DerivedMetrics::derive(record)
            .values()
            .into_iter()
            .map(metric_value),
    );

    RowViewModel {
        id: id.to_string(),
        cells,
    }
}

/// One row per record, in the store's first-seen order
pub fn build(store: &RequestStore) -> Vec<RowViewModel> {
    store.iter().map(|(id, record)| build_row(id, record)).collect()
}

/// Rows paired with the column specification
pub fn build_table(store: &RequestStore) -> TableModel {
    TableModel {
        columns: columns(),
        rows: build(store),
    }
}
