//! Seeded synthetic panels from the predictive-regression model.
//!
//! ```text
//! x[i,t] = (1 - rho) a_i + rho x[i,t-1] + u[i,t]
//! y[i,t] = m_i + beta x[i,t-1] + e[i,t]
//! corr(u, e) = correlation
//! ```
//!
//! Each unit draws from its own `StdRng`, seeded by hashing the master seed
//! with the unit index, so a unit's series does not depend on how many
//! units precede it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::EstimationError;
use crate::panel::{Panel, PanelLengths};

/// Data-generating process for a simulated panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelDgp {
    /// AR coefficient of the regressor.
    pub rho: f64,
    /// Predictive slope.
    pub beta: f64,
    /// Correlation between regressor and outcome innovations.
    pub correlation: f64,
    /// Periods simulated and discarded before each unit's sample.
    pub burn_in: usize,
    /// Standard deviation of the unit fixed effects.
    pub fixed_effect_scale: f64,
}

impl Default for PanelDgp {
    fn default() -> Self {
        Self {
            rho: 0.9,
            beta: 0.5,
            correlation: -0.5,
            burn_in: 50,
            fixed_effect_scale: 1.0,
        }
    }
}

impl PanelDgp {
    pub fn new(rho: f64, beta: f64, correlation: f64) -> Self {
        Self {
            rho,
            beta,
            correlation,
            ..Self::default()
        }
    }

    pub fn with_burn_in(mut self, burn_in: usize) -> Self {
        self.burn_in = burn_in;
        self
    }

    pub fn with_fixed_effect_scale(mut self, scale: f64) -> Self {
        self.fixed_effect_scale = scale;
        self
    }

    fn validate(&self) -> Result<(), EstimationError> {
        let invalid = |name: &'static str, value: f64| EstimationError::InvalidParameter { name, value };
        if !self.rho.is_finite() {
            return Err(invalid("rho", self.rho));
        }
        if !self.beta.is_finite() {
            return Err(invalid("beta", self.beta));
        }
        if !(-1.0..=1.0).contains(&self.correlation) {
            return Err(invalid("correlation", self.correlation));
        }
        if !self.fixed_effect_scale.is_finite() || self.fixed_effect_scale < 0.0 {
            return Err(invalid("fixed_effect_scale", self.fixed_effect_scale));
        }
        Ok(())
    }

    /// Simulate a panel with the given unit lengths.
    pub fn generate(&self, lengths: &PanelLengths, seed: u64) -> Result<Panel, EstimationError> {
        self.validate()?;
        let mut y = Vec::with_capacity(lengths.total());
        let mut x = Vec::with_capacity(lengths.total());
        for (unit, t) in lengths.iter().enumerate() {
            let mut rng = unit_rng(seed, unit as u64);
            self.simulate_unit(&mut rng, t, &mut y, &mut x)?;
        }
        Panel::new(y, x, lengths.clone())
    }

    /// Simulate a balanced panel of `units` units with `periods` each.
    pub fn generate_balanced(
        &self,
        units: usize,
        periods: usize,
        seed: u64,
    ) -> Result<Panel, EstimationError> {
        let lengths = PanelLengths::new(vec![periods; units])?;
        self.generate(&lengths, seed)
    }

    fn simulate_unit(
        &self,
        rng: &mut StdRng,
        periods: usize,
        y: &mut Vec<f64>,
        x: &mut Vec<f64>,
    ) -> Result<(), EstimationError> {
        let effects = Normal::new(0.0, self.fixed_effect_scale).map_err(|_| {
            EstimationError::InvalidParameter {
                name: "fixed_effect_scale",
                value: self.fixed_effect_scale,
            }
        })?;
        let x_effect = effects.sample(rng);
        let y_effect = effects.sample(rng);
        let orthogonal = (1.0 - self.correlation * self.correlation).sqrt();

        let mut x_prev = x_effect;
        for step in 0..self.burn_in + periods {
            let u: f64 = StandardNormal.sample(rng);
            let v: f64 = StandardNormal.sample(rng);
            let e = self.correlation * u + orthogonal * v;

            let x_now = (1.0 - self.rho) * x_effect + self.rho * x_prev + u;
            if step >= self.burn_in {
                y.push(y_effect + self.beta * x_prev + e);
                x.push(x_now);
            }
            x_prev = x_now;
        }
        Ok(())
    }
}

/// Unit lengths drawn uniformly from `min..=max`.
pub fn random_lengths(
    units: usize,
    min: usize,
    max: usize,
    seed: u64,
) -> Result<PanelLengths, EstimationError> {
    if min == 0 || min > max {
        return Err(EstimationError::InvalidParameter {
            name: "min_periods",
            value: min as f64,
        });
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let lengths = (0..units).map(|_| rng.gen_range(min..=max)).collect();
    PanelLengths::new(lengths)
}

/// Independent generator for one unit.
fn unit_rng(seed: u64, unit: u64) -> StdRng {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(&unit.to_le_bytes());
    StdRng::from_seed(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_panel() {
        let lengths = PanelLengths::new(vec![30, 12, 45]).unwrap();
        let dgp = PanelDgp::default();
        let a = dgp.generate(&lengths, 42).unwrap();
        let b = dgp.generate(&lengths, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.observations(), 87);
    }

    #[test]
    fn different_seeds_differ() {
        let dgp = PanelDgp::default();
        let a = dgp.generate_balanced(3, 20, 1).unwrap();
        let b = dgp.generate_balanced(3, 20, 2).unwrap();
        assert_ne!(a.x(), b.x());
    }

    #[test]
    fn unit_series_independent_of_preceding_units() {
        let dgp = PanelDgp::default();
        let short = dgp
            .generate(&PanelLengths::new(vec![10, 25]).unwrap(), 9)
            .unwrap();
        let long = dgp
            .generate(&PanelLengths::new(vec![40, 25]).unwrap(), 9)
            .unwrap();
        assert_eq!(&short.x()[10..], &long.x()[40..]);
    }

    #[test]
    fn zero_slope_and_no_effects_leave_noise() {
        let dgp = PanelDgp::new(0.0, 0.0, 0.0)
            .with_burn_in(0)
            .with_fixed_effect_scale(0.0);
        let panel = dgp.generate_balanced(1, 2000, 5).unwrap();
        let m = crate::panel::mean(panel.y());
        assert!(m.abs() < 0.1, "mean {m}");
    }

    #[test]
    fn correlation_outside_unit_interval_is_rejected() {
        let err = PanelDgp::new(0.9, 0.5, 1.5)
            .generate_balanced(2, 10, 0)
            .unwrap_err();
        assert!(matches!(
            err,
            EstimationError::InvalidParameter { name: "correlation", .. }
        ));
    }

    #[test]
    fn random_lengths_stay_in_range() {
        let lengths = random_lengths(50, 8, 40, 3).unwrap();
        assert_eq!(lengths.units(), 50);
        assert!(lengths.iter().all(|t| (8..=40).contains(&t)));
        assert!(random_lengths(5, 10, 9, 0).is_err());
    }
}
