//! Tabular input: long-format panel tables read through polars.
//!
//! A table carries one row per (unit, period) with four roles: unit
//! identity, time, dependent `y` and regressor `x`. Rows may arrive in any
//! order; they are stably sorted by (identity, time) before the stacked
//! series and per-unit lengths are extracted.

pub mod columns;
pub mod frame;

pub use columns::{ColumnRef, ColumnRole, ColumnSpec, ResolvedColumns};
pub use frame::{load_panel, PanelFrame};

use polars::prelude::PolarsError;

use crate::error::EstimationError;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("missing {role} column '{name}'")]
    MissingColumn { role: ColumnRole, name: String },

    #[error("invalid column specification: {0}")]
    InvalidColumnSpec(String),

    #[error("column '{column}' is not numeric (dtype {dtype})")]
    NonNumericColumn { column: String, dtype: String },

    /// `row` is the zero-based data row of the input table.
    #[error("null value in column '{column}' at input row {row}")]
    NullValue { column: String, row: usize },

    #[error("duplicate observation for unit '{unit}' at time '{time}'")]
    DuplicateObservation { unit: String, time: String },

    #[error("unsupported input format '{0}': expected .csv or .parquet")]
    UnsupportedFormat(String),

    #[error("polars: {0}")]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Estimation(#[from] EstimationError),
}
