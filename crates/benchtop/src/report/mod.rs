//! Consolidated HTML report.
//!
//! A report collects whatever stages have run: the raw table and its
//! numeric correlations, the cleaned table with its cleaning summary, and
//! the trained model with its held-out scores. Sections for stages that did not run are left out.

mod html;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::clean::CleaningReport;
use crate::error::Result;
use crate::metrics::EvaluationMetrics;
use crate::model::{ModelArtifact, write_atomic};
use crate::profile::CorrelationMatrix;
use crate::table::Table;

pub use html::escape_html;

/// File name of the consolidated report under `<root>/reports/`.
pub const REPORT_FILE_NAME: &str = "report_consolidated.html";

/// Dimensions and leading rows of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSection {
    pub rows: usize,
    pub columns: usize,
    pub head: Table,
}

impl TableSection {
    pub fn new(table: &Table, head_rows: usize) -> Self {
        Self {
            rows: table.row_count(),
            columns: table.column_count(),
            head: table.head(head_rows),
        }
    }
}

/// What the report says about a trained model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSection {
    pub target: String,
    pub task: String,
    pub model: String,
    pub train_rows: usize,
    pub artifact_path: Option<PathBuf>,
    pub metrics: Option<EvaluationMetrics>,
    /// Up to ten features, most important first.
    pub top_features: Vec<(String, f64)>,
}

impl ModelSection {
    pub fn new(artifact: &ModelArtifact) -> Self {
        let mut top_features = artifact.ranked_importances();
        top_features.truncate(10);
        Self {
            target: artifact.target.clone(),
            task: artifact.task.label().to_string(),
            model: artifact.model.name().to_string(),
            train_rows: artifact.train_rows,
            artifact_path: None,
            metrics: None,
            top_features,
        }
    }

    pub fn with_metrics(mut self, metrics: EvaluationMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = Some(path.into());
        self
    }
}

/// A consolidated report, rendered to a standalone HTML page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub head_rows: usize,
    pub raw: Option<TableSection>,
    pub correlations: Option<CorrelationMatrix>,
    pub cleaned: Option<TableSection>,
    pub cleaning: Option<CleaningReport>,
    pub model: Option<ModelSection>,
}

impl Default for Report {
    fn default() -> Self {
        Self::new("Consolidated report")
    }
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            head_rows: 5,
            raw: None,
            correlations: None,
            cleaned: None,
            cleaning: None,
            model: None,
        }
    }

    /// Number of leading rows shown per table. Applies to tables added
    /// after the call.
    pub fn with_head_rows(mut self, n: usize) -> Self {
        self.head_rows = n;
        self
    }

    pub fn with_raw(mut self, table: &Table) -> Self {
        self.raw = Some(TableSection::new(table, self.head_rows));
        self
    }

    pub fn with_correlations(mut self, matrix: &CorrelationMatrix) -> Self {
        self.correlations = Some(matrix.clone());
        self
    }

    pub fn with_cleaned(mut self, table: &Table) -> Self {
        self.cleaned = Some(TableSection::new(table, self.head_rows));
        self
    }

    pub fn with_cleaning_report(mut self, report: &CleaningReport) -> Self {
        self.cleaning = Some(report.clone());
        self
    }

    pub fn with_model(mut self, model: ModelSection) -> Self {
        self.model = Some(model);
        self
    }

    /// Render the report.
    pub fn to_html(&self) -> String {
        html::render(self)
    }

    /// Write the rendered report to `path`, replacing any previous file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_atomic(path, self.to_html().as_bytes())?;
        info!(path = %path.display(), "wrote report");
        Ok(())
    }

    /// Write to `<root>/reports/report_consolidated.html`.
    pub fn write_to(&self, output_root: impl AsRef<Path>) -> Result<PathBuf> {
        let path = report_path(output_root);
        self.write(&path)?;
        Ok(path)
    }
}

/// Path of the consolidated report under an output root.
pub fn report_path(output_root: impl AsRef<Path>) -> PathBuf {
    output_root.as_ref().join("reports").join(REPORT_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use tempfile::TempDir;

    fn table(n: usize) -> Table {
        Table::new(vec![
            Column::numeric("a", (0..n).map(|i| Some(i as f64))),
            Column::text("b", (0..n).map(|i| Some(format!("v{}", i)))),
        ])
        .unwrap()
    }

    #[test]
    fn test_sections_follow_stages() {
        let html = Report::new("Run").to_html();
        assert!(html.contains("<h1>Run</h1>"));
        assert!(!html.contains("Raw data"));
        assert!(!html.contains("Trained model"));

        let html = Report::new("Run").with_raw(&table(8)).with_cleaned(&table(6)).to_html();
        assert!(html.contains("Raw data"));
        assert!(html.contains("8 rows × 2 columns"));
        assert!(html.contains("6 rows × 2 columns"));
        assert!(html.contains("<td>v4</td>"));
        assert!(!html.contains("<td>v5</td>"));
    }

    #[test]
    fn test_correlation_section() {
        let matrix = CorrelationMatrix {
            columns: vec!["x".to_string(), "y".to_string()],
            values: vec![vec![Some(1.0), None], vec![None, Some(1.0)]],
        };
        let html = Report::new("Run").to_html();
        assert!(!html.contains("Correlations"));

        let html = Report::new("Run").with_correlations(&matrix).to_html();
        assert!(html.contains("<h2>Correlations</h2>"));
        assert!(html.contains("<th>x</th>"));
        assert!(html.contains("<td>1.00</td>"));
        assert!(html.contains("<td>n/a</td>"));
    }

    #[test]
    fn test_head_rows() {
        let report = Report::new("Run").with_head_rows(2).with_raw(&table(8));
        assert_eq!(report.raw.as_ref().unwrap().head.row_count(), 2);
    }

    #[test]
    fn test_title_is_escaped() {
        let html = Report::new("<script>alert(1)</script>").to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_write_to_output_root() {
        let dir = TempDir::new().unwrap();
        let report = Report::default().with_raw(&table(3));
        let path = report.write_to(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("reports").join(REPORT_FILE_NAME));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, report.to_html());
    }
}
