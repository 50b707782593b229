//! Self-generated (IVX) instrument construction.
//!
//! For a unit of length `T` the instrument is the persistence-weighted
//! partial sum of the differenced regressor
//!
//! ```text
//! dx[0] = x[0],  dx[t] = x[t] - x[t-1]
//! z[t]  = sum_{s<=t} rhoz^(T-1-s) dx[s] / rhoz^(T-1-t)
//!       = sum_{s<=t} rhoz^(t-s) dx[s]
//! ```
//!
//! The second form is evaluated by the recursion `z[t] = rhoz * z[t-1] + dx[t]`,
//! which uses `0^0 = 1`: at `rhoz = 0` the instrument is `dx` itself, and at
//! `rhoz = 1` it telescopes back to the level `x`.

use crate::error::EstimationError;
use crate::panel::PanelSegmenter;

/// Builds the IVX instrument per unit and re-stacks it.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstrumentGenerator {
    segmenter: PanelSegmenter,
}

impl InstrumentGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(
        &self,
        x: &[f64],
        rhoz: f64,
        lengths: &[usize],
    ) -> Result<Vec<f64>, EstimationError> {
        if !rhoz.is_finite() {
            return Err(EstimationError::InvalidParameter {
                name: "rhoz",
                value: rhoz,
            });
        }
        let units = self.segmenter.segment(x, lengths)?;
        let mut out = Vec::with_capacity(x.len());
        for values in units {
            out.extend(unit_instrument(values, rhoz));
        }
        Ok(out)
    }
}

/// Instrument for a single unit's series.
pub fn unit_instrument(x: &[f64], rhoz: f64) -> Vec<f64> {
    let mut z = Vec::with_capacity(x.len());
    let mut prev_x = 0.0;
    let mut acc = 0.0;
    for (t, &level) in x.iter().enumerate() {
        let dx = if t == 0 { level } else { level - prev_x };
        acc = if t == 0 { dx } else { rhoz * acc + dx };
        z.push(acc);
        prev_x = level;
    }
    z
}
