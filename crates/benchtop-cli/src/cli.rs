//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use benchtop::clean::{CategoricalImpute, NumericImpute};
use benchtop::{
    CleaningConfig, FormatHint, ModelFamily, PipelineConfig, TaskSelection, TrainingConfig,
};

/// Benchtop: preprocessing-to-modeling workbench for tabular data
#[derive(Parser)]
#[command(name = "benchtop")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Profile a table: column kinds, missingness, describe statistics
    Profile {
        #[command(flatten)]
        input: InputArgs,

        /// Also try parsing text columns as dates
        #[arg(long)]
        detect_dates: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clean a table and export the result
    Clean {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        cleaning: CleaningArgs,

        /// Output path for the cleaned table (default: <file>.cleaned.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output the cleaning report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clean a table, train a model and save the artifact
    Train {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        cleaning: CleaningArgs,

        #[command(flatten)]
        training: TrainingArgs,

        /// Root directory for model artifacts
        #[arg(long, default_value = "outputs")]
        output_dir: PathBuf,

        /// Output metrics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every stage and write the consolidated HTML report
    Report {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        cleaning: CleaningArgs,

        /// Target column; no model is trained when omitted
        #[arg(short, long)]
        target: Option<String>,

        #[command(flatten)]
        training: TrainingOptions,

        /// Report title
        #[arg(long, default_value = "Consolidated report")]
        title: String,

        /// Rows shown per table in the report
        #[arg(long, default_value = "5")]
        head_rows: usize,

        /// Root directory for model artifacts and reports
        #[arg(long, default_value = "outputs")]
        output_dir: PathBuf,
    },

    /// Predict with a saved model artifact
    Predict {
        #[command(flatten)]
        input: InputArgs,

        /// Path to the model artifact
        #[arg(short, long)]
        model: PathBuf,

        /// Output path for the table with a prediction column (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Input file and how to read it.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the data file (CSV/TSV/XLSX)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Field delimiter for delimited text (auto-detected when omitted)
    #[arg(short, long, conflicts_with = "sheet")]
    pub delimiter: Option<Delimiter>,

    /// Sheet to read from a spreadsheet (first sheet when omitted)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Pipeline configuration JSON; flags override its values
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,
}

impl InputArgs {
    /// Explicit format hint, if any flag asked for one.
    pub fn hint(&self) -> Option<FormatHint> {
        if let Some(sheet) = &self.sheet {
            return Some(FormatHint::sheet(sheet.clone()));
        }
        self.delimiter.map(|d| FormatHint::delimited(d.byte()))
    }

    /// Configuration file contents, or defaults.
    pub fn pipeline_config(&self) -> benchtop::Result<PipelineConfig> {
        match &self.config {
            Some(path) => PipelineConfig::load(path),
            None => Ok(PipelineConfig::default()),
        }
    }
}

/// Cleaning flags. Unset flags keep the configured value.
#[derive(Args, Debug, Clone, Default)]
pub struct CleaningArgs {
    /// Keep duplicate rows
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Drop columns whose missing fraction exceeds this value (0-1)
    #[arg(long)]
    pub missing_threshold: Option<f64>,

    /// Numeric imputation: median, mean or constant
    #[arg(long)]
    pub numeric_impute: Option<NumericImputeChoice>,

    /// Categorical imputation: most-frequent or constant
    #[arg(long)]
    pub categorical_impute: Option<CategoricalImputeChoice>,

    /// Do not try to parse text columns as dates
    #[arg(long)]
    pub no_dates: bool,

    /// Cap numeric values to the IQR fences
    #[arg(long)]
    pub cap_outliers: bool,
}

impl CleaningArgs {
    pub fn apply(&self, mut config: CleaningConfig) -> CleaningConfig {
        if self.keep_duplicates {
            config = config.with_drop_duplicates(false);
        }
        if let Some(threshold) = self.missing_threshold {
            config = config.with_missing_threshold(threshold);
        }
        if let Some(choice) = self.numeric_impute {
            config = config.with_numeric_impute(choice.into());
        }
        if let Some(choice) = self.categorical_impute {
            config = config.with_categorical_impute(choice.into());
        }
        if self.no_dates {
            config = config.with_parse_dates(false);
        }
        if self.cap_outliers {
            config = config.with_cap_outliers(true);
        }
        config
    }
}

/// Training flags with a required target.
#[derive(Args, Debug, Clone)]
pub struct TrainingArgs {
    /// Target column
    #[arg(short, long)]
    pub target: String,

    #[command(flatten)]
    pub options: TrainingOptions,
}

/// Training flags. Unset flags keep the configured value.
#[derive(Args, Debug, Clone, Default)]
pub struct TrainingOptions {
    /// Task: auto, classification or regression
    #[arg(long)]
    pub task: Option<TaskChoice>,

    /// Model family: auto, random-forest or linear
    #[arg(long)]
    pub model: Option<ModelChoice>,

    /// Held-out fraction, in (0, 1)
    #[arg(long)]
    pub test_fraction: Option<f64>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Do not standardize numeric features
    #[arg(long)]
    pub no_scaling: bool,

    /// Trees in a random forest
    #[arg(long)]
    pub n_estimators: Option<usize>,

    /// Maximum tree depth
    #[arg(long)]
    pub max_depth: Option<usize>,
}

impl TrainingOptions {
    /// Overlay flags onto a configuration, setting its target.
    pub fn apply(&self, target: &str, config: Option<TrainingConfig>) -> TrainingConfig {
        let mut config = config.unwrap_or_default();
        config.target = target.to_string();
        if let Some(task) = self.task {
            config = config.with_task(task.into());
        }
        if let Some(model) = self.model {
            config = config.with_model(model.into());
        }
        if let Some(fraction) = self.test_fraction {
            config = config.with_test_fraction(fraction);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if self.no_scaling {
            config = config.with_scaling(false);
        }
        if let Some(n) = self.n_estimators {
            config = config.with_n_estimators(n);
        }
        if self.max_depth.is_some() {
            config = config.with_max_depth(self.max_depth);
        }
        config
    }
}

/// Field delimiter choice
#[derive(Clone, Copy, Debug)]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
    Pipe,
}

impl Delimiter {
    pub fn byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
            Delimiter::Pipe => b'|',
        }
    }
}

impl std::str::FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "," | "comma" => Ok(Delimiter::Comma),
            ";" | "semicolon" => Ok(Delimiter::Semicolon),
            "\t" | "\\t" | "tab" => Ok(Delimiter::Tab),
            "|" | "pipe" => Ok(Delimiter::Pipe),
            _ => Err(format!(
                "Unknown delimiter: {}. Use: comma, semicolon, tab, or pipe.",
                s
            )),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum NumericImputeChoice {
    Median,
    Mean,
    Constant,
}

impl std::str::FromStr for NumericImputeChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "median" => Ok(NumericImputeChoice::Median),
            "mean" => Ok(NumericImputeChoice::Mean),
            "constant" | "zero" => Ok(NumericImputeChoice::Constant),
            _ => Err(format!("Unknown strategy: {}. Use: median, mean, or constant.", s)),
        }
    }
}

impl From<NumericImputeChoice> for NumericImpute {
    fn from(choice: NumericImputeChoice) -> Self {
        match choice {
            NumericImputeChoice::Median => NumericImpute::Median,
            NumericImputeChoice::Mean => NumericImpute::Mean,
            NumericImputeChoice::Constant => NumericImpute::Constant,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum CategoricalImputeChoice {
    MostFrequent,
    Constant,
}

impl std::str::FromStr for CategoricalImputeChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "most-frequent" | "mode" => Ok(CategoricalImputeChoice::MostFrequent),
            "constant" | "missing" => Ok(CategoricalImputeChoice::Constant),
            _ => Err(format!("Unknown strategy: {}. Use: most-frequent or constant.", s)),
        }
    }
}

impl From<CategoricalImputeChoice> for CategoricalImpute {
    fn from(choice: CategoricalImputeChoice) -> Self {
        match choice {
            CategoricalImputeChoice::MostFrequent => CategoricalImpute::MostFrequent,
            CategoricalImputeChoice::Constant => CategoricalImpute::Constant,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TaskChoice {
    Auto,
    Classification,
    Regression,
}

impl std::str::FromStr for TaskChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(TaskChoice::Auto),
            "classification" | "classify" => Ok(TaskChoice::Classification),
            "regression" | "regress" => Ok(TaskChoice::Regression),
            _ => Err(format!("Unknown task: {}. Use: auto, classification, or regression.", s)),
        }
    }
}

impl From<TaskChoice> for TaskSelection {
    fn from(choice: TaskChoice) -> Self {
        match choice {
            TaskChoice::Auto => TaskSelection::Auto,
            TaskChoice::Classification => TaskSelection::Classification,
            TaskChoice::Regression => TaskSelection::Regression,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ModelChoice {
    Auto,
    RandomForest,
    Linear,
}

impl std::str::FromStr for ModelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "auto" => Ok(ModelChoice::Auto),
            "random-forest" | "forest" | "rf" => Ok(ModelChoice::RandomForest),
            "linear" | "logistic" => Ok(ModelChoice::Linear),
            _ => Err(format!("Unknown model: {}. Use: auto, random-forest, or linear.", s)),
        }
    }
}

impl From<ModelChoice> for ModelFamily {
    fn from(choice: ModelChoice) -> Self {
        match choice {
            ModelChoice::Auto => ModelFamily::Auto,
            ModelChoice::RandomForest => ModelFamily::RandomForest,
            ModelChoice::Linear => ModelFamily::Linear,
        }
    }
}
