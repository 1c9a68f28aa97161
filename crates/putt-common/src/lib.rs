//! Putting precision common types, datasets, and errors.
//!
//! This crate provides the foundational types shared across the workspace:
//! - Observations, physical constants, and validated datasets
//! - Text and JSON dataset parsing, plus the published reference dataset
//! - Common error types with stable codes
//! - Output format specifications

pub mod dataset;
pub mod error;
pub mod observation;
pub mod output;

pub use dataset::{
    is_json_document, parse_dataset, parse_table, published_dataset, read_dataset, DistanceUnit,
};
pub use error::{DataError, DomainError, Error, ErrorCategory, Result};
pub use observation::{
    Observation, PhysicalConstants, PuttingData, STANDARD_BALL_DIAMETER, STANDARD_HOLE_DIAMETER,
};
pub use output::OutputFormat;

/// Schema version stamped on every emitted report.
pub const SCHEMA_VERSION: &str = "1.0.0";
