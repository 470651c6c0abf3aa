//! Feature pipelines: raw table columns in, numeric matrices out.
//!
//! A [`FeaturePipelineBuilder`] plans which columns are imputed and scaled
//! and which are one-hot encoded. Fitting the plan on a training table
//! yields a [`FittedFeaturePipeline`] that is applied unchanged to any later
//! table with the same columns.

mod pipeline;
mod transformers;

pub use pipeline::{FeatureConfig, FeaturePipeline, FeaturePipelineBuilder, FittedFeaturePipeline};
pub use transformers::{CategoricalTransform, NumericTransform, OneHotEncoder, StandardScaler};
