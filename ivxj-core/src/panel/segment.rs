//! Split a stacked series into per-unit slices.

use super::prefix_offsets;
use crate::error::EstimationError;

/// Splits stacked series by a length vector.
///
/// Unit `i` occupies `[offset[i], offset[i] + lengths[i])`. Zero-length
/// units are rejected unless the segmenter is built with
/// [`PanelSegmenter::allowing_empty_units`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelSegmenter {
    allow_empty_units: bool,
}

impl PanelSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allowing_empty_units() -> Self {
        Self {
            allow_empty_units: true,
        }
    }

    /// Borrow one slice per unit, in length-vector order.
    pub fn segment<'a>(
        &self,
        a: &'a [f64],
        lengths: &[usize],
    ) -> Result<Vec<&'a [f64]>, EstimationError> {
        let expected: usize = lengths.iter().sum();
        if expected != a.len() {
            return Err(EstimationError::ShapeMismatch {
                series: "stacked series",
                expected,
                actual: a.len(),
            });
        }
        if !self.allow_empty_units {
            if let Some(unit) = lengths.iter().position(|&t| t == 0) {
                return Err(EstimationError::ZeroLengthUnit { unit });
            }
        }

        Ok(prefix_offsets(lengths)
            .into_iter()
            .zip(lengths)
            .map(|(start, &t)| &a[start..start + t])
            .collect())
    }

    /// Re-stack per-unit parts in order.
    pub fn concat<S: AsRef<[f64]>>(parts: &[S]) -> Vec<f64> {
        let total = parts.iter().map(|p| p.as_ref().len()).sum();
        let mut out = Vec::with_capacity(total);
        for part in parts {
            out.extend_from_slice(part.as_ref());
        }
        out
    }
}
