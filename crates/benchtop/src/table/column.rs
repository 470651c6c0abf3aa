//! Named, typed columns.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::value::{ElementKind, Value, ValueKey};

/// Storage type of a column, fixed at ingestion or by coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// Every non-missing cell is a number.
    Numeric,
    /// Text or mixed ("object") cells.
    Text,
    /// Every non-missing cell is a datetime.
    DateTime,
}

impl StorageType {
    /// Returns true if this storage is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, StorageType::Numeric)
    }

    /// Infer the storage type for a set of cells.
    ///
    /// All-missing columns are numeric, matching how a reader sees an empty
    /// column of NaNs.
    pub fn infer(values: &[Value]) -> Self {
        let kinds: BTreeSet<ElementKind> = values.iter().filter_map(Value::element_kind).collect();
        match (kinds.len(), kinds.iter().next()) {
            (0, _) => StorageType::Numeric,
            (1, Some(ElementKind::Number)) => StorageType::Numeric,
            (1, Some(ElementKind::DateTime)) => StorageType::DateTime,
            _ => StorageType::Text,
        }
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Storage type.
    pub storage: StorageType,
    /// Cell values, one per row.
    pub values: Vec<Value>,
}

impl Column {
    /// Create a column, inferring its storage type from the cells.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let storage = StorageType::infer(&values);
        Self {
            name: name.into(),
            storage,
            values,
        }
    }

    /// Create a column with an explicit storage type.
    pub fn with_storage(name: impl Into<String>, storage: StorageType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            storage,
            values,
        }
    }

    /// Create a numeric column from optional numbers.
    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        let values = values.into_iter().map(Value::from).collect();
        Self::with_storage(name, StorageType::Numeric, values)
    }

    /// Create a text column from optional strings.
    pub fn text<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.map(|s| Value::Text(s.into())).unwrap_or(Value::Null))
            .collect();
        Self::with_storage(name, StorageType::Text, values)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing cells.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Fraction of missing cells (0.0 for an empty column).
    pub fn missing_fraction(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.null_count() as f64 / self.values.len() as f64
        }
    }

    /// Number of distinct non-missing values.
    pub fn distinct_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| !v.is_null())
            .map(Value::key)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Non-missing numeric values in row order.
    pub fn numbers(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }

    /// Distinct element kinds present among non-missing cells.
    pub fn element_kinds(&self) -> BTreeSet<ElementKind> {
        self.values.iter().filter_map(Value::element_kind).collect()
    }

    /// Returns true if a text column holds more than one element kind.
    pub fn has_mixed_types(&self) -> bool {
        self.storage == StorageType::Text && self.element_kinds().len() > 1
    }

    /// Most frequent non-missing value.
    ///
    /// Ties resolve to the smallest value so the result is stable.
    pub fn mode(&self) -> Option<&Value> {
        let mut counts: HashMap<ValueKey, (usize, &Value)> = HashMap::new();
        for value in self.values.iter().filter(|v| !v.is_null()) {
            counts.entry(value.key()).or_insert((0, value)).0 += 1;
        }
        counts
            .into_iter()
            .max_by(|(ka, (ca, _)), (kb, (cb, _))| ca.cmp(cb).then_with(|| kb.cmp(ka)))
            .map(|(_, (_, value))| value)
    }

    /// Copy of this column with cells in the given row order.
    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            storage: self.storage,
            values: rows.iter().map(|&r| self.values[r].clone()).collect(),
        }
    }

    /// Copy of this column with every non-missing cell rendered as text.
    pub fn to_text(&self) -> Self {
        let values = self
            .values
            .iter()
            .map(|v| {
                if v.is_null() {
                    Value::Null
                } else {
                    Value::Text(v.to_string())
                }
            })
            .collect();
        Self::with_storage(self.name.clone(), StorageType::Text, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_storage() {
        assert_eq!(
            StorageType::infer(&[Value::Number(1.0), Value::Null]),
            StorageType::Numeric
        );
        assert_eq!(StorageType::infer(&[Value::Null]), StorageType::Numeric);
        assert_eq!(
            StorageType::infer(&[Value::Number(1.0), Value::text("a")]),
            StorageType::Text
        );
    }

    #[test]
    fn test_missing_fraction() {
        let col = Column::numeric("x", [Some(1.0), None, None, Some(4.0)]);
        assert_eq!(col.null_count(), 2);
        assert!((col.missing_fraction() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_mode_breaks_ties_by_smallest() {
        let col = Column::text("c", [Some("b"), Some("a"), Some("b"), Some("a"), None]);
        assert_eq!(col.mode(), Some(&Value::text("a")));

        let col = Column::text("c", [Some("z"), Some("z"), Some("a")]);
        assert_eq!(col.mode(), Some(&Value::text("z")));
    }

    #[test]
    fn test_mode_of_all_missing_is_none() {
        let col = Column::text::<&str>("c", [None, None]);
        assert!(col.mode().is_none());
    }

    #[test]
    fn test_mixed_types() {
        let col = Column::with_storage(
            "m",
            StorageType::Text,
            vec![Value::Number(1.0), Value::text("x")],
        );
        assert!(col.has_mixed_types());
        let normalized = col.to_text();
        assert!(!normalized.has_mixed_types());
        assert_eq!(normalized.values[0], Value::text("1"));
    }
}
