//! Derived status columns
//!
//! Each column is a fixed sum or ratio over nested `status` fields. Every
//! operand is resolved on its own, so a missing or zero intermediate node
//! only degrades that operand to its default.

use serde::Serialize;

use crate::merge::Record;
use crate::resolve::resolve_number;

/// How a column combines its operands
enum Formula {
    /// Sum of paths, each defaulting to 0
    Sum(&'static [&'static str]),
    /// `numerator / denominator`, each with its own default
    Ratio {
        numerator: (&'static str, f64),
        denominator: (&'static str, f64),
    },
}

/// Columns computed from nested record fields, in table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedColumn {
    Queued,
    Pending,
    Running,
    Failure,
    Canceled,
    Success,
    CoolOff,
    PreCooloff,
    QueueInjection,
}

impl DerivedColumn {
    /// All derived columns in display order
    pub const ALL: [DerivedColumn; 9] = [
        DerivedColumn::Queued,
        DerivedColumn::Pending,
        DerivedColumn::Running,
        DerivedColumn::Failure,
        DerivedColumn::Canceled,
        DerivedColumn::Success,
        DerivedColumn::CoolOff,
        DerivedColumn::PreCooloff,
        DerivedColumn::QueueInjection,
    ];

    /// Stable machine name, used as the column key
    pub fn key(self) -> &'static str {
        match self {
            DerivedColumn::Queued => "queued",
            DerivedColumn::Pending => "pending",
            DerivedColumn::Running => "running",
            DerivedColumn::Failure => "failure",
            DerivedColumn::Canceled => "canceled",
            DerivedColumn::Success => "success",
            DerivedColumn::CoolOff => "cool_off",
            DerivedColumn::PreCooloff => "pre_cooloff",
            DerivedColumn::QueueInjection => "queue_injection",
        }
    }

    /// Column title shown by the renderer
    pub fn title(self) -> &'static str {
        match self {
            DerivedColumn::Queued => "queued",
            DerivedColumn::Pending => "pending",
            DerivedColumn::Running => "running",
            DerivedColumn::Failure => "failure",
            DerivedColumn::Canceled => "canceled",
            DerivedColumn::Success => "success",
            DerivedColumn::CoolOff => "cool off",
            DerivedColumn::PreCooloff => "pre-cooloff",
            DerivedColumn::QueueInjection => "queue injection",
        }
    }

    fn formula(self) -> Formula {
        match self {
            DerivedColumn::Queued => Formula::Sum(&["status.queued.first", "status.queued.retry"]),
            DerivedColumn::Pending => Formula::Sum(&["status.submitted.pending"]),
            DerivedColumn::Running => Formula::Sum(&["status.submitted.running"]),
            DerivedColumn::Failure => Formula::Sum(&[
                "status.failure.create",
                "status.failure.submit",
                "status.failure.exception",
            ]),
            DerivedColumn::Canceled => Formula::Sum(&["status.canceled"]),
            DerivedColumn::Success => Formula::Sum(&["status.success"]),
            DerivedColumn::CoolOff => Formula::Sum(&["status.cooloff"]),
            DerivedColumn::PreCooloff => {
                Formula::Sum(&["status.submitted.retry", "status.queued.retry"])
            }
            DerivedColumn::QueueInjection => Formula::Ratio {
                numerator: ("status.inWMBS", 0.0),
                denominator: ("total_jobs", 1.0),
            },
        }
    }

    /// Compute this column for one record
    ///
    /// No rounding is applied; the caller decides formatting.
    pub fn compute(self, record: &Record) -> f64 {
        match self.formula() {
            Formula::Sum(paths) => paths
                .iter()
                .map(|path| resolve_number(record, path, 0.0))
                .sum(),
            Formula::Ratio {
                numerator: (num_path, num_default),
                denominator: (den_path, den_default),
            } => {
                resolve_number(record, num_path, num_default)
                    / resolve_number(record, den_path, den_default)
            }
        }
    }
}

/// All derived values for one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub queued: f64,
    pub pending: f64,
    pub running: f64,
    pub failure: f64,
    pub canceled: f64,
    pub success: f64,
    pub cool_off: f64,
    pub pre_cooloff: f64,
    pub queue_injection: f64,
}

impl DerivedMetrics {
    /// Compute every derived column for `record`
    pub fn derive(record: &Record) -> Self {
        Self {
            queued: DerivedColumn::Queued.compute(record),
            pending: DerivedColumn::Pending.compute(record),
            running: DerivedColumn::Running.compute(record),
            failure: DerivedColumn::Failure.compute(record),
            canceled: DerivedColumn::Canceled.compute(record),
            success: DerivedColumn::Success.compute(record),
            cool_off: DerivedColumn::CoolOff.compute(record),
            pre_cooloff: DerivedColumn::PreCooloff.compute(record),
            queue_injection: DerivedColumn::QueueInjection.compute(record),
        }
    }

    /// Values in `DerivedColumn::ALL` order
    pub fn values(&self) -> [f64; 9] {
        [
            self.queued,
            self.pending,
            self.running,
            self.failure,
            self.canceled,
            self.success,
            self.cool_off,
            self.pre_cooloff,
            self.queue_injection,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("test record must be an object, got {}", other),
        }
    }

    #[test]
    fn test_empty_record_defaults() {
        let metrics = DerivedMetrics::derive(&Record::new());
        assert_eq!(metrics.values(), [0.0; 9]);
    }

    #[test]
    fn test_pending_and_zero_running() {
        let r = record(json!({"status": {"submitted": {"pending": 3, "running": 0}}}));
        let metrics = DerivedMetrics::derive(&r);
        assert_eq!(metrics.pending, 3.0);
        assert_eq!(metrics.running, 0.0);
    }

    #[test]
    fn test_full_status_block() {
        let r = record(json!({
            "total_jobs": 200,
            "status": {
                "inWMBS": 50,
                "queued": {"first": 10, "retry": 2},
                "submitted": {"pending": 4, "running": 6, "retry": 3},
                "failure": {"create": 1, "submit": 2, "exception": 3},
                "canceled": 5,
                "success": 90,
                "cooloff": 7
            }
        }));
        let m = DerivedMetrics::derive(&r);

        assert_eq!(m.queued, 12.0);
        assert_eq!(m.pending, 4.0);
        assert_eq!(m.running, 6.0);
        assert_eq!(m.failure, 6.0);
        assert_eq!(m.canceled, 5.0);
        assert_eq!(m.success, 90.0);
        assert_eq!(m.cool_off, 7.0);
        assert_eq!(m.pre_cooloff, 5.0);
        assert_eq!(m.queue_injection, 0.25);
    }

    #[test]
    fn test_operands_degrade_independently() {
        // failure.submit is a string, failure.create is zero
        let r = record(json!({
            "status": {"failure": {"create": 0, "submit": "n/a", "exception": 4}}
        }));
        assert_eq!(DerivedColumn::Failure.compute(&r), 4.0);
    }

    #[test]
    fn test_queue_injection_defaults() {
        assert_eq!(DerivedColumn::QueueInjection.compute(&Record::new()), 0.0);

        let r = record(json!({"status": {"inWMBS": 30}}));
        assert_eq!(DerivedColumn::QueueInjection.compute(&r), 30.0);

        // total_jobs = 0 is falsy, so the divisor falls back to 1
        let r = record(json!({"total_jobs": 0, "status": {"inWMBS": 30}}));
        assert_eq!(DerivedColumn::QueueInjection.compute(&r), 30.0);
    }

    #[test]
    fn test_queue_injection_is_not_rounded() {
        let r = record(json!({"total_jobs": 3, "status": {"inWMBS": 1}}));
        assert_eq!(DerivedColumn::QueueInjection.compute(&r), 1.0 / 3.0);
    }

    #[test]
    fn test_titles_in_order() {
        let titles: Vec<_> = DerivedColumn::ALL.iter().map(|c| c.title()).collect();
        assert_eq!(
            titles,
            [
                "queued",
                "pending",
                "running",
                "failure",
                "canceled",
                "success",
                "cool off",
                "pre-cooloff",
                "queue injection"
            ]
        );
    }

    #[test]
    fn test_values_match_compute() {
        let r = record(json!({"status": {"queued": {"first": 1, "retry": 1}, "success": 2}}));
        let m = DerivedMetrics::derive(&r);
        for (column, value) in DerivedColumn::ALL.iter().zip(m.values()) {
            assert_eq!(column.compute(&r), value, "column {}", column.title());
        }
    }
}
