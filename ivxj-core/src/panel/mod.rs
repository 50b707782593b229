//! Panel data types and the per-unit plumbing components.
//!
//! A panel is a set of stacked series (unit-major, time-ascending) that
//! share one length vector. The components here never mutate their inputs:
//! each returns a freshly stacked series.

pub mod segment;
pub mod window;
pub mod within;

pub use segment::PanelSegmenter;
pub use window::{LagWindowDeleter, WindowEdge};
pub use within::WithinTransformer;

use serde::{Deserialize, Serialize};

use crate::error::{EstimationError, LengthShortfall};

/// Per-unit observation counts, in unit order.
///
/// Invariant: non-empty and every entry is strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct PanelLengths(Vec<usize>);

impl PanelLengths {
    pub fn new(lengths: Vec<usize>) -> Result<Self, EstimationError> {
        if lengths.is_empty() {
            return Err(EstimationError::EmptyPanel);
        }
        if let Some(unit) = lengths.iter().position(|&t| t == 0) {
            return Err(EstimationError::ZeroLengthUnit { unit });
        }
        Ok(Self(lengths))
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn units(&self) -> usize {
        self.0.len()
    }

    /// Total number of stacked observations.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Start offset of every unit in the stacked series.
    pub fn offsets(&self) -> Vec<usize> {
        prefix_offsets(&self.0)
    }

    /// Lengths after removing `h` observations from every unit.
    ///
    /// Fails if any unit would be left empty.
    pub fn shrunk_by(&self, h: usize) -> Result<Self, EstimationError> {
        let shrunk = self
            .0
            .iter()
            .enumerate()
            .map(|(unit, &length)| {
                if length > h {
                    Ok(length - h)
                } else {
                    Err(EstimationError::InsufficientLength(
                        LengthShortfall::Window {
                            unit,
                            length,
                            window: h,
                        },
                    ))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(shrunk))
    }

    /// Check that a stacked series matches these lengths.
    pub fn check_series(&self, series: &'static str, data: &[f64]) -> Result<(), EstimationError> {
        let expected = self.total();
        if data.len() != expected {
            return Err(EstimationError::ShapeMismatch {
                series,
                expected,
                actual: data.len(),
            });
        }
        Ok(())
    }
}

impl TryFrom<Vec<usize>> for PanelLengths {
    type Error = EstimationError;

    fn try_from(lengths: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(lengths)
    }
}

impl From<PanelLengths> for Vec<usize> {
    fn from(lengths: PanelLengths) -> Self {
        lengths.0
    }
}

/// Dependent and regressor series paired with their length vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    y: Vec<f64>,
    x: Vec<f64>,
    lengths: PanelLengths,
}

impl Panel {
    /// Build a panel, validating shapes and finiteness.
    pub fn new(y: Vec<f64>, x: Vec<f64>, lengths: PanelLengths) -> Result<Self, EstimationError> {
        if y.len() != x.len() {
            return Err(EstimationError::ShapeMismatch {
                series: "x (against y)",
                expected: y.len(),
                actual: x.len(),
            });
        }
        lengths.check_series("y", &y)?;
        lengths.check_series("x", &x)?;
        check_finite("y", &y)?;
        check_finite("x", &x)?;
        Ok(Self { y, x, lengths })
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn lengths(&self) -> &PanelLengths {
        &self.lengths
    }

    pub fn units(&self) -> usize {
        self.lengths.units()
    }

    pub fn observations(&self) -> usize {
        self.y.len()
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>, PanelLengths) {
        (self.y, self.x, self.lengths)
    }
}

fn check_finite(series: &'static str, data: &[f64]) -> Result<(), EstimationError> {
    match data.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(EstimationError::NonFiniteInput { series, index }),
        None => Ok(()),
    }
}

pub(crate) fn prefix_offsets(lengths: &[usize]) -> Vec<usize> {
    lengths
        .iter()
        .scan(0usize, |acc, &t| {
            let start = *acc;
            *acc += t;
            Some(start)
        })
        .collect()
}

/// Inner product of two equal-length slices, summed in index order.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(p, q)| p * q).sum()
}

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(a: &[f64]) -> f64 {
    a.iter().sum::<f64>() / a.len() as f64
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
