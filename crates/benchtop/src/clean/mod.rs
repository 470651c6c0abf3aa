//! Table cleaning.

mod config;
mod engine;
mod report;

pub use config::{CategoricalImpute, CleaningConfig, NumericImpute};
pub use engine::{
    CleaningEngine, CleaningOutcome, IQR_MULTIPLIER, MISSING_LABEL, coerce_to_datetime,
};
pub use report::{
    CleaningChange, CleaningReport, CoercedColumn, CoercionFailure, CoercionFailureReason,
};
