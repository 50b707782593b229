//! IVXJ estimator: jackknife AR coefficient, IVX slope, Nickell-type bias
//! correction, and standard error.
//!
//! Pipeline for a panel `(y, x)` with lengths `T_i`:
//! 1. `rho_hat` from the split-half jackknife on `x`.
//! 2. Lag alignment: `y'` and `x'` drop each unit's first period, `x_lag`
//!    drops its last.
//! 3. IVX instrument `z_lag` from `x_lag` on the decremented lengths.
//! 4. Within transformation of `x'`, `x_lag`, `z_lag`, `y'`.
//! 5. `beta_hat = <z~, y'> / <z~, x_lag>`, residual moments, bias term
//!    (on the original `T_i`), standard error.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, info};

use crate::error::{Degeneracy, EstimationError};
use crate::instrument::InstrumentGenerator;
use crate::jackknife::JackknifeRhoEstimator;
use crate::panel::{
    dot, LagWindowDeleter, Panel, PanelLengths, WindowEdge, WithinTransformer,
};

/// Exponent of the finite-sample correction applied to the standard error
/// when `rho_hat >= 1`.
const UNIT_MEAN_SQUARE_EXPONENT: f64 = 0.95;

/// `|ZX|` at or below this fraction of `|z~| |x_lag|` counts as zero.
const VANISHING_MOMENT_TOLERANCE: f64 = 1e-12;

/// The four scalars produced by one estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    /// IVX estimate of the slope.
    pub beta_hat: f64,
    /// Bias-corrected slope.
    pub beta_hat_debias: f64,
    /// Standard error of the slope.
    pub se: f64,
    /// Jackknife estimate of the AR coefficient.
    pub rho_hat: f64,
}

/// Normal-approximation inference on the bias-corrected slope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inference {
    pub t_stat: f64,
    /// Two-sided p-value for `beta = 0`.
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub level: f64,
}

impl EstimationResult {
    /// t-statistic, two-sided p-value and confidence interval at `level`
    /// (e.g. `0.95`) for the debiased slope.
    pub fn inference(&self, level: f64) -> Result<Inference, EstimationError> {
        if !(level > 0.0 && level < 1.0) {
            return Err(EstimationError::InvalidParameter {
                name: "level",
                value: level,
            });
        }
        let normal = Normal::new(0.0, 1.0).map_err(|_| {
            EstimationError::NumericalDegeneracy(Degeneracy::NonFiniteResult {
                quantity: "standard normal",
            })
        })?;
        let t_stat = self.beta_hat_debias / self.se;
        let p_value = 2.0 * (1.0 - normal.cdf(t_stat.abs()));
        let critical = normal.inverse_cdf(0.5 + level / 2.0);
        Ok(Inference {
            t_stat,
            p_value,
            ci_lower: self.beta_hat_debias - critical * self.se,
            ci_upper: self.beta_hat_debias + critical * self.se,
            level,
        })
    }
}

/// Orchestrates the estimation components.
#[derive(Debug, Clone, Copy, Default)]
pub struct IvxjEstimator {
    jackknife: JackknifeRhoEstimator,
    deleter: LagWindowDeleter,
    instrument: InstrumentGenerator,
    within: WithinTransformer,
}

impl IvxjEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle rayon parallelism in the jackknife stage.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.jackknife = self.jackknife.with_parallelism(parallel);
        self
    }

    /// Estimate from raw stacked series and a length vector.
    pub fn estimate_slices(
        &self,
        y: &[f64],
        x: &[f64],
        rhoz: f64,
        lengths: &[usize],
    ) -> Result<EstimationResult, EstimationError> {
        let lengths = PanelLengths::new(lengths.to_vec())?;
        let panel = Panel::new(y.to_vec(), x.to_vec(), lengths)?;
        self.estimate(&panel, rhoz)
    }

    /// Full pipeline: jackknife `rho_hat`, then the IVX slope.
    pub fn estimate(&self, panel: &Panel, rhoz: f64) -> Result<EstimationResult, EstimationError> {
        check_rhoz(rhoz)?;
        let rho = self
            .jackknife
            .estimate(panel.x(), panel.lengths().as_slice())?;
        self.estimate_with_rho(panel, rhoz, rho.rho)
    }

    /// Slope estimation given an externally supplied AR coefficient.
    pub fn estimate_with_rho(
        &self,
        panel: &Panel,
        rhoz: f64,
        rho_hat: f64,
    ) -> Result<EstimationResult, EstimationError> {
        check_rhoz(rhoz)?;
        if !rho_hat.is_finite() {
            return Err(EstimationError::InvalidParameter {
                name: "rho_hat",
                value: rho_hat,
            });
        }

        let lengths = panel.lengths();
        let t = lengths.as_slice();

        // Lose one period per unit to the lag.
        let y_lead = self.deleter.delete_window(panel.y(), t, 1, WindowEdge::Start)?;
        let x_lag = self.deleter.delete_window(panel.x(), t, 1, WindowEdge::End)?;
        let x_lead = self.deleter.delete_window(panel.x(), t, 1, WindowEdge::Start)?;

        let trimmed = lengths.shrunk_by(1)?;
        let t_trim = trimmed.as_slice();
        let obs_total = trimmed.total() as f64;

        let z_lag = self.instrument.generate(&x_lag, rhoz, t_trim)?;

        let x_tilde = self.within.demean(&x_lead, t_trim)?;
        let x_lag_tilde = self.within.demean(&x_lag, t_trim)?;
        let z_lag_tilde = self.within.demean(&z_lag, t_trim)?;
        let y_tilde = self.within.demean(&y_lead, t_trim)?;

        let zx = dot(&z_lag_tilde, &x_lag);
        if is_vanishing_moment(zx, &z_lag_tilde, &x_lag) {
            return Err(EstimationError::NumericalDegeneracy(
                Degeneracy::ZeroInstrumentMoment,
            ));
        }

        let beta_hat = dot(&z_lag_tilde, &y_lead) / zx;

        let u_tilde: Vec<f64> = y_tilde
            .iter()
            .zip(&x_lag_tilde)
            .map(|(y, x)| y - beta_hat * x)
            .collect();
        let v_tilde: Vec<f64> = x_tilde
            .iter()
            .zip(&x_lag_tilde)
            .map(|(x, xl)| x - rho_hat * xl)
            .collect();

        let omega11 = dot(&u_tilde, &u_tilde) / obs_total;
        let omega12 = dot(&v_tilde, &u_tilde) / obs_total;

        let bias_sum: f64 = t
            .iter()
            .map(|&ti| nickell_lambda(rhoz, rho_hat, ti).map(|lam| lam / ti as f64))
            .sum::<Result<f64, EstimationError>>()?;
        let bias = omega12 * bias_sum / zx;

        let unit_root_correction = if rho_hat >= 1.0 {
            self.sum_of_unit_mean_squares(&z_lag, t_trim)?
        } else {
            0.0
        };
        let se = (omega11 * (dot(&z_lag, &z_lag) - unit_root_correction)).sqrt() / zx.abs();

        let result = EstimationResult {
            beta_hat,
            beta_hat_debias: beta_hat + bias,
            se,
            rho_hat,
        };
        debug!(zx, omega11, omega12, bias, "ivx moments");
        ensure_finite(&result)?;

        info!(
            beta_hat = result.beta_hat,
            beta_hat_debias = result.beta_hat_debias,
            se = result.se,
            rho_hat = result.rho_hat,
            units = lengths.units(),
            observations = trimmed.total(),
            "ivxj estimate"
        );
        Ok(result)
    }

    /// `sum_i mean_i(a)^2 * T_i^0.95`.
    fn sum_of_unit_mean_squares(&self, a: &[f64], lengths: &[usize]) -> Result<f64, EstimationError> {
        let means = self.within.unit_means(a, lengths)?;
        Ok(means
            .iter()
            .zip(lengths)
            .map(|(m, &t)| m * m * (t as f64).powf(UNIT_MEAN_SQUARE_EXPONENT))
            .sum())
    }
}

/// Per-unit Nickell bias weight
/// `((rhoz - rhoz^T)/(1 - rhoz) - (rho - rho^T)/(1 - rho)) / (rhoz - rho)`.
pub fn nickell_lambda(rhoz: f64, rho_hat: f64, t: usize) -> Result<f64, EstimationError> {
    if rhoz == 1.0 {
        return Err(EstimationError::NumericalDegeneracy(
            Degeneracy::UnitRootDenominator { parameter: "rhoz" },
        ));
    }
    if rho_hat == 1.0 {
        return Err(EstimationError::NumericalDegeneracy(
            Degeneracy::UnitRootDenominator {
                parameter: "rho_hat",
            },
        ));
    }
    if rhoz == rho_hat {
        return Err(EstimationError::NumericalDegeneracy(
            Degeneracy::RhozEqualsRhoHat { rho: rho_hat },
        ));
    }
    let t = t as f64;
    let z_part = (rhoz - rhoz.powf(t)) / (1.0 - rhoz);
    let r_part = (rho_hat - rho_hat.powf(t)) / (1.0 - rho_hat);
    Ok((z_part - r_part) / (rhoz - rho_hat))
}

fn check_rhoz(rhoz: f64) -> Result<(), EstimationError> {
    if rhoz.is_finite() {
        Ok(())
    } else {
        Err(EstimationError::InvalidParameter {
            name: "rhoz",
            value: rhoz,
        })
    }
}

/// True when `<a, b>` is zero relative to `|a| |b|` (Cauchy-Schwarz bound).
fn is_vanishing_moment(value: f64, a: &[f64], b: &[f64]) -> bool {
    let scale = (dot(a, a) * dot(b, b)).sqrt();
    value.abs() <= VANISHING_MOMENT_TOLERANCE * scale
}

fn ensure_finite(result: &EstimationResult) -> Result<(), EstimationError> {
    let checks = [
        ("beta_hat", result.beta_hat),
        ("beta_hat_debias", result.beta_hat_debias),
        ("se", result.se),
    ];
    for (quantity, value) in checks {
        if !value.is_finite() {
            return Err(EstimationError::NumericalDegeneracy(
                Degeneracy::NonFiniteResult { quantity },
            ));
        }
    }
    Ok(())
}
