use std::collections::BTreeMap;

use serde::Serialize;

use super::{Priority, TaskCategory};

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    pub completion_rate: f64,
    pub by_category: BTreeMap<TaskCategory, i64>,
    /// Pending tasks only.
    pub by_priority: BTreeMap<Priority, i64>,
}

impl Statistics {
    pub fn from_counts(total: i64, completed: i64) -> Self {
        let completion_rate = if total > 0 {
            (completed as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        Self {
            total,
            completed,
            pending: total - completed,
            completion_rate,
            ..Self::default()
        }
    }
}
