//! CLI command implementations.

pub mod clean;
pub mod predict;
pub mod profile;
pub mod report;
pub mod train;
