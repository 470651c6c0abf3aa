//! Workbench facade: every stage with explicit inputs and outputs.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clean::{CleaningConfig, CleaningEngine, CleaningOutcome};
use crate::error::{BenchtopError, Result};
use crate::input::{FormatHint, Parser, ParserConfig, SourceMetadata};
use crate::model::{ModelArtifact, Trainer, TrainingConfig, TrainingOutcome, model_path};
use crate::profile::{Profiler, TableProfile};
use crate::report::{ModelSection, Report};
use crate::table::Table;

/// Configuration for a [`Workbench`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    /// Parser configuration.
    pub parser: ParserConfig,
    /// Root directory for model artifacts and reports.
    pub output_dir: PathBuf,
    /// Rows per table shown in reports.
    pub report_head_rows: usize,
    /// Report heading.
    pub report_title: String,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            output_dir: PathBuf::from("outputs"),
            report_head_rows: 5,
            report_title: "Consolidated report".to_string(),
        }
    }
}

impl WorkbenchConfig {
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_report_head_rows(mut self, n: usize) -> Self {
        self.report_head_rows = n;
        self
    }

    pub fn with_report_title(mut self, title: impl Into<String>) -> Self {
        self.report_title = title.into();
        self
    }
}

/// Stage options for a full run, loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cleaning: CleaningConfig,
    /// Training is skipped when absent.
    pub training: Option<TrainingConfig>,
}

impl PipelineConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| BenchtopError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            BenchtopError::Config(format!(
                "Invalid pipeline configuration '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Check every stage's options.
    pub fn validate(&self) -> Result<()> {
        self.cleaning.validate()?;
        if let Some(training) = &self.training {
            training.validate()?;
        }
        Ok(())
    }
}

/// Everything a full pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub source: SourceMetadata,
    pub raw: Table,
    /// Profile of the raw table.
    pub profile: TableProfile,
    pub cleaning: CleaningOutcome,
    pub training: Option<TrainingOutcome>,
    pub model_path: Option<PathBuf>,
    pub report_path: PathBuf,
}

/// Runs the analysis stages. Holds configuration only; every table, profile
/// and model is passed in and returned explicitly.
pub struct Workbench {
    config: WorkbenchConfig,
    parser: Parser,
    profiler: Profiler,
    cleaner: CleaningEngine,
    trainer: Trainer,
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbench {
    /// Create a workbench with default configuration.
    pub fn new() -> Self {
        Self::with_config(WorkbenchConfig::default())
    }

    /// Create a workbench with custom configuration.
    pub fn with_config(config: WorkbenchConfig) -> Self {
        Self {
            parser: Parser::with_config(config.parser.clone()),
            profiler: Profiler::new(),
            cleaner: CleaningEngine::new(),
            trainer: Trainer::new(),
            config,
        }
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    /// Read a table from a file.
    pub fn ingest(
        &self,
        path: impl AsRef<Path>,
        hint: Option<FormatHint>,
    ) -> Result<(Table, SourceMetadata)> {
        self.parser.parse_file(path, hint)
    }

    /// Read a table from uploaded bytes.
    pub fn ingest_bytes(&self, bytes: &[u8], hint: &FormatHint) -> Result<(Table, SourceMetadata)> {
        self.parser.parse_bytes(bytes, hint)
    }

    /// Profile a table.
    pub fn profile(&self, table: &Table) -> TableProfile {
        self.profiler.profile(table)
    }

    /// Clean a table. The input is left untouched.
    pub fn clean(&self, table: &Table, config: &CleaningConfig) -> Result<CleaningOutcome> {
        self.cleaner.clean(table, config)
    }

    /// Profile and train on a table.
    pub fn train(&self, table: &Table, config: &TrainingConfig) -> Result<TrainingOutcome> {
        let profile = self.profiler.profile(table);
        self.trainer.train(table, &profile, config)
    }

    /// Persist an artifact under the output root, replacing the previous
    /// artifact for its target.
    pub fn save_model(&self, artifact: &ModelArtifact) -> Result<PathBuf> {
        artifact.save_to(&self.config.output_dir)
    }

    /// Load the persisted artifact for a target column.
    pub fn load_model(&self, target: &str) -> Result<ModelArtifact> {
        ModelArtifact::load(model_path(&self.config.output_dir, target))
    }

    /// Assemble a report from the stages that ran.
    pub fn build_report(
        &self,
        raw: Option<&Table>,
        profile: Option<&TableProfile>,
        cleaning: Option<&CleaningOutcome>,
        training: Option<&TrainingOutcome>,
        model_path: Option<&Path>,
    ) -> Report {
        let mut report = Report::new(self.config.report_title.clone())
            .with_head_rows(self.config.report_head_rows);
        if let Some(raw) = raw {
            report = report.with_raw(raw);
        }
        if let Some(matrix) = profile.and_then(|p| p.correlations.as_ref()) {
            report = report.with_correlations(matrix);
        }
        if let Some(cleaning) = cleaning {
            report = report
                .with_cleaned(&cleaning.table)
                .with_cleaning_report(&cleaning.report);
        }
        if let Some(training) = training {
            let mut section =
                ModelSection::new(&training.artifact).with_metrics(training.metrics.clone());
            if let Some(path) = model_path {
                section = section.with_artifact_path(path);
            }
            report = report.with_model(section);
        }
        report
    }

    /// Write a report under the output root.
    pub fn write_report(&self, report: &Report) -> Result<PathBuf> {
        report.write_to(&self.config.output_dir)
    }

    /// Ingest, profile, clean, optionally train and persist, then write the
    /// consolidated report.
    ///
    /// Configuration is validated before anything is read or written.
    pub fn run(
        &self,
        path: impl AsRef<Path>,
        hint: Option<FormatHint>,
        pipeline: &PipelineConfig,
    ) -> Result<PipelineRun> {
        pipeline.validate()?;

        let (raw, source) = self.ingest(path, hint)?;
        let profile = self.profile(&raw);
        let cleaning = self.clean(&raw, &pipeline.cleaning)?;

        let (training, model_path) = match &pipeline.training {
            Some(config) => {
                let outcome = self.train(&cleaning.table, config)?;
                let path = self.save_model(&outcome.artifact)?;
                (Some(outcome), Some(path))
            }
            None => (None, None),
        };

        let report = self.build_report(
            Some(&raw),
            Some(&profile),
            Some(&cleaning),
            training.as_ref(),
            model_path.as_deref(),
        );
        let report_path = self.write_report(&report)?;

        info!(
            rows = raw.row_count(),
            cleaned_rows = cleaning.table.row_count(),
            trained = training.is_some(),
            report = %report_path.display(),
            "pipeline finished"
        );

        Ok(PipelineRun {
            source,
            raw,
            profile,
            cleaning,
            training,
            model_path,
            report_path,
        })
    }
}
