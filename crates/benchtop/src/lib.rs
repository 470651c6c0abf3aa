//! Benchtop: a preprocessing-to-modeling pipeline for tabular datasets.
//!
//! Benchtop takes an uploaded table through profiling, cleaning, feature
//! encoding and model training, and writes a persisted model artifact and a
//! consolidated HTML report.
//!
//! # Core Principles
//!
//! - **Explicit stages**: Each stage takes its inputs and returns a new output
//! - **Non-destructive**: Input tables are never modified
//! - **Reproducible**: Splits and estimators are seeded
//!
//! # Example
//!
//! ```no_run
//! use benchtop::{PipelineConfig, TrainingConfig, Workbench};
//!
//! let workbench = Workbench::new();
//! let pipeline = PipelineConfig {
//!     training: Some(TrainingConfig::new("species")),
//!     ..PipelineConfig::default()
//! };
//! let run = workbench.run("iris.csv", None, &pipeline).unwrap();
//!
//! println!("Rows after cleaning: {}", run.cleaning.table.row_count());
//! println!("Report: {}", run.report_path.display());
//! ```

pub mod clean;
pub mod error;
pub mod features;
pub mod input;
pub mod metrics;
pub mod model;
pub mod profile;
pub mod report;
pub mod table;
pub mod warning;

mod workbench;

pub use crate::workbench::{PipelineConfig, PipelineRun, Workbench, WorkbenchConfig};
pub use clean::{CleaningConfig, CleaningEngine, CleaningOutcome, CleaningReport};
pub use error::{BenchtopError, Result};
pub use features::{FeatureConfig, FeaturePipelineBuilder, FittedFeaturePipeline};
pub use input::{FormatHint, Parser, ParserConfig, SourceMetadata};
pub use metrics::EvaluationMetrics;
pub use model::{
    ModelArtifact, ModelFamily, Predictions, TaskSelection, TaskType, Trainer, TrainingConfig,
    TrainingOutcome,
};
pub use profile::{ColumnKind, Profiler, TableProfile};
pub use report::Report;
pub use table::{Column, StorageType, Table, Value};
pub use warning::{ColumnWarning, WarningKind};
