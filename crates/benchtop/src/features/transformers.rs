//! Per-column fitted transforms.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::clean::{MISSING_LABEL, NumericImpute};
use crate::error::{BenchtopError, Result};
use crate::profile::{mean, median, population_std};
use crate::table::{Column, Value};

/// Standardization parameters: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: f64,
    /// Population standard deviation, or 1 for constant columns.
    pub scale: f64,
}

impl StandardScaler {
    /// Fit to a set of values.
    pub fn fit(values: &[f64]) -> Self {
        let std = population_std(values);
        Self {
            mean: mean(values),
            scale: if std == 0.0 { 1.0 } else { std },
        }
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// Fitted imputation and optional scaling for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericTransform {
    pub column: String,
    /// Value substituted for missing cells.
    pub fill: f64,
    pub scaler: Option<StandardScaler>,
}

impl NumericTransform {
    /// Fit on a training column.
    ///
    /// Returns the transform and whether the fill had to fall back to 0
    /// because the column had no values or only non-finite ones.
    pub fn fit(column: &Column, strategy: NumericImpute, scale: bool) -> Result<(Self, bool)> {
        let values = numeric_cells(column)?;
        let present: Vec<f64> = values.iter().flatten().copied().collect();

        let fill = match strategy {
            NumericImpute::Median => median(&present),
            NumericImpute::Mean => (!present.is_empty()).then(|| mean(&present)),
            NumericImpute::Constant => Some(0.0),
        };
        let fill = fill.filter(|f| f.is_finite());
        let fell_back = fill.is_none();
        let fill = fill.unwrap_or(0.0);

        let scaler = scale.then(|| {
            let imputed: Vec<f64> = values.iter().map(|v| v.unwrap_or(fill)).collect();
            StandardScaler::fit(&imputed)
        });

        Ok((
            Self {
                column: column.name.clone(),
                fill,
                scaler,
            },
            fell_back,
        ))
    }

    /// Transformed value of every cell.
    pub fn apply(&self, column: &Column) -> Result<Vec<f64>> {
        Ok(numeric_cells(column)?
            .into_iter()
            .map(|v| {
                let x = v.unwrap_or(self.fill);
                match &self.scaler {
                    Some(scaler) => scaler.transform(x),
                    None => x,
                }
            })
            .collect())
    }
}

/// Read numeric cells, accepting numeric text and rejecting anything else.
fn numeric_cells(column: &Column) -> Result<Vec<Option<f64>>> {
    column
        .values
        .iter()
        .enumerate()
        .map(|(row, value)| match value {
            v if v.is_null() => Ok(None),
            Value::Number(n) => Ok(Some(*n)),
            Value::Text(s) => s.trim().parse::<f64>().map(Some).map_err(|_| {
                BenchtopError::SchemaMismatch {
                    missing: Vec::new(),
                    detail: format!(
                        "Column '{}' expects numbers, found '{}' in row {}",
                        column.name,
                        s,
                        row + 1
                    ),
                }
            }),
            other => Err(BenchtopError::SchemaMismatch {
                missing: Vec::new(),
                detail: format!(
                    "Column '{}' expects numbers, found '{}' in row {}",
                    column.name,
                    other,
                    row + 1
                ),
            }),
        })
        .collect()
}

/// One-hot encoding over a fixed, sorted category list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub categories: Vec<String>,
}

impl OneHotEncoder {
    /// Learn the sorted distinct categories.
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let categories: BTreeSet<&str> = values.into_iter().collect();
        Self {
            categories: categories.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Index of a category; `None` for categories unseen during fitting.
    pub fn position(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }
}

/// Fitted imputation and one-hot encoding for one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalTransform {
    pub column: String,
    /// Most frequent training value, substituted for missing cells.
    pub fill: String,
    pub encoder: OneHotEncoder,
}

impl CategoricalTransform {
    /// Fit on a training column. Cells are compared by their text form.
    pub fn fit(column: &Column) -> Self {
        let fill = column
            .to_text()
            .mode()
            .map(|v| v.to_string())
            .unwrap_or_else(|| MISSING_LABEL.to_string());

        let cells = text_cells(column, &fill);
        let encoder = OneHotEncoder::fit(cells.iter().map(String::as_str));
        Self {
            column: column.name.clone(),
            fill,
            encoder,
        }
    }

    /// Output feature names, `<column>_<category>`.
    pub fn feature_names(&self) -> impl Iterator<Item = String> + '_ {
        self.encoder
            .categories
            .iter()
            .map(move |c| format!("{}_{}", self.column, c))
    }

    /// Category index of every cell; unseen categories yield `None`.
    pub fn apply(&self, column: &Column) -> Vec<Option<usize>> {
        text_cells(column, &self.fill)
            .iter()
            .map(|s| self.encoder.position(s))
            .collect()
    }
}

fn text_cells(column: &Column, fill: &str) -> Vec<String> {
    column
        .values
        .iter()
        .map(|v| {
            if v.is_null() {
                fill.to_string()
            } else {
                v.to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_uses_population_std() {
        let scaler = StandardScaler::fit(&[1.0, 3.0]);
        assert_eq!(scaler.mean, 2.0);
        assert_eq!(scaler.scale, 1.0);
        assert_eq!(scaler.transform(3.0), 1.0);

        let constant = StandardScaler::fit(&[5.0, 5.0]);
        assert_eq!(constant.scale, 1.0);
        assert_eq!(constant.transform(5.0), 0.0);
    }

    #[test]
    fn test_numeric_transform_imputes_then_scales() {
        let column = Column::numeric("x", [Some(1.0), None, Some(3.0)]);
        let (transform, fell_back) =
            NumericTransform::fit(&column, NumericImpute::Median, false).unwrap();
        assert!(!fell_back);
        assert_eq!(transform.fill, 2.0);
        assert_eq!(transform.apply(&column).unwrap(), vec![1.0, 2.0, 3.0]);

        let (scaled, _) = NumericTransform::fit(&column, NumericImpute::Median, true).unwrap();
        let out = scaled.apply(&column).unwrap();
        assert!((out[1]).abs() < 1e-12);
        assert!((out[0] + out[2]).abs() < 1e-12);
    }

    #[test]
    fn test_numeric_transform_rejects_text() {
        let column = Column::text("x", [Some("1.5"), Some("oops")]);
        let result = NumericTransform::fit(&column, NumericImpute::Median, true);
        assert!(matches!(result, Err(BenchtopError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_all_missing_numeric_falls_back() {
        let column = Column::numeric("x", [None, None]);
        let (transform, fell_back) =
            NumericTransform::fit(&column, NumericImpute::Mean, true).unwrap();
        assert!(fell_back);
        assert_eq!(transform.apply(&column).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_infinite_fill_falls_back() {
        let column = Column::numeric("x", [Some(f64::INFINITY), None]);
        let (transform, fell_back) =
            NumericTransform::fit(&column, NumericImpute::Median, false).unwrap();
        assert!(fell_back);
        assert_eq!(transform.fill, 0.0);
    }

    #[test]
    fn test_one_hot_sorted_and_unknown_tolerant() {
        let column = Column::text("color", [Some("red"), Some("blue"), None, Some("red")]);
        let transform = CategoricalTransform::fit(&column);
        assert_eq!(transform.fill, "red");
        assert_eq!(transform.encoder.categories, vec!["blue", "red"]);
        assert_eq!(
            transform.feature_names().collect::<Vec<_>>(),
            vec!["color_blue", "color_red"]
        );

        let unseen = Column::text("color", [Some("green"), Some("blue"), None]);
        assert_eq!(transform.apply(&unseen), vec![None, Some(0), Some(1)]);
    }
}
