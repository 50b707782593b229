//! IVXJ core: bias-corrected IVX estimation of predictive slopes on
//! unbalanced panels.
//!
//! This crate contains the estimator and everything it needs:
//! - Panel types and per-unit plumbing (segmentation, lag windows, within transform)
//! - IVX instrument generation
//! - Split-half jackknife estimate of the regressor's AR coefficient
//! - The IVXJ orchestrator: slope, Nickell-type bias correction, standard error
//! - Tabular loading through polars, TOML configuration, seeded simulation

pub mod config;
pub mod data;
pub mod error;
pub mod estimator;
pub mod fingerprint;
pub mod instrument;
pub mod jackknife;
pub mod panel;
pub mod simulate;

pub use config::{ConfigError, EstimatorConfig};
pub use data::{load_panel, ColumnRef, ColumnRole, ColumnSpec, DataError, PanelFrame};
pub use error::{Degeneracy, EstimationError, LengthShortfall};
pub use estimator::{nickell_lambda, EstimationResult, Inference, IvxjEstimator};
pub use fingerprint::{dataset_hash, DatasetHash};
pub use instrument::InstrumentGenerator;
pub use jackknife::{JackknifeRhoEstimator, RhoEstimate, MIN_JACKKNIFE_LENGTH};
pub use panel::{
    LagWindowDeleter, Panel, PanelLengths, PanelSegmenter, WindowEdge, WithinTransformer,
};
pub use simulate::PanelDgp;
