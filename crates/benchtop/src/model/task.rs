//! Classification vs. regression detection.

use serde::{Deserialize, Serialize};

use crate::table::Column;

/// Kind of supervised task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Classification,
    Regression,
}

impl TaskType {
    pub fn label(&self) -> &'static str {
        match self {
            TaskType::Classification => "classification",
            TaskType::Regression => "regression",
        }
    }
}

/// Caller's task choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSelection {
    /// Infer from the target column.
    #[default]
    Auto,
    Classification,
    Regression,
}

/// Cardinality rule deciding the task for a target column.
///
/// A target is a classification target when it is not stored as numbers,
/// or when it has at most `max_distinct` distinct values and the ratio of
/// distinct values to rows is below `max_distinct_ratio`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDetector {
    pub max_distinct: usize,
    pub max_distinct_ratio: f64,
}

impl Default for TaskDetector {
    fn default() -> Self {
        Self {
            max_distinct: 20,
            max_distinct_ratio: 0.1,
        }
    }
}

impl TaskDetector {
    /// Detect the task for a target column.
    pub fn detect(&self, target: &Column) -> TaskType {
        if !target.storage.is_numeric() {
            return TaskType::Classification;
        }
        let distinct = target.distinct_count();
        let ratio = if target.is_empty() {
            0.0
        } else {
            distinct as f64 / target.len() as f64
        };
        if distinct <= self.max_distinct && ratio < self.max_distinct_ratio {
            TaskType::Classification
        } else {
            TaskType::Regression
        }
    }

    /// Resolve a caller's selection, detecting only for `Auto`.
    pub fn resolve(&self, selection: TaskSelection, target: &Column) -> TaskType {
        match selection {
            TaskSelection::Auto => self.detect(target),
            TaskSelection::Classification => TaskType::Classification,
            TaskSelection::Regression => TaskType::Regression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_labels_are_classification() {
        let labels = ["a", "b", "c"];
        let column = Column::text("y", (0..1000).map(|i| Some(labels[i % 3])));
        assert_eq!(TaskDetector::default().detect(&column), TaskType::Classification);
    }

    #[test]
    fn test_many_distinct_floats_are_regression() {
        let column = Column::numeric("y", (0..1000).map(|i| Some((i % 500) as f64 + 0.5)));
        assert_eq!(column.distinct_count(), 500);
        assert_eq!(TaskDetector::default().detect(&column), TaskType::Regression);
    }

    #[test]
    fn test_few_numeric_codes_are_classification() {
        let column = Column::numeric("y", (0..1000).map(|i| Some((i % 2) as f64)));
        assert_eq!(TaskDetector::default().detect(&column), TaskType::Classification);

        // few distinct values, but too many relative to the row count
        let small = Column::numeric("y", [Some(0.0), Some(1.0), Some(2.0), Some(0.0)]);
        assert_eq!(TaskDetector::default().detect(&small), TaskType::Regression);
    }

    #[test]
    fn test_explicit_selection_wins() {
        let column = Column::text("y", [Some("a"), Some("b")]);
        let detector = TaskDetector::default();
        assert_eq!(
            detector.resolve(TaskSelection::Regression, &column),
            TaskType::Regression
        );
        assert_eq!(
            detector.resolve(TaskSelection::Auto, &column),
            TaskType::Classification
        );
    }
}
