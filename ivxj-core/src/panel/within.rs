//! Within (fixed-effects) transformation.

use super::segment::PanelSegmenter;
use super::mean;
use crate::error::EstimationError;

/// Subtracts each unit's own mean from its observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithinTransformer {
    segmenter: PanelSegmenter,
}

impl WithinTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demean every unit by its own sample mean and re-stack.
    pub fn demean(&self, a: &[f64], lengths: &[usize]) -> Result<Vec<f64>, EstimationError> {
        let units = self.segmenter.segment(a, lengths)?;
        let mut out = Vec::with_capacity(a.len());
        for values in units {
            let m = mean(values);
            out.extend(values.iter().map(|v| v - m));
        }
        Ok(out)
    }

    /// Sample mean of every unit, in unit order.
    pub fn unit_means(&self, a: &[f64], lengths: &[usize]) -> Result<Vec<f64>, EstimationError> {
        Ok(self
            .segmenter
            .segment(a, lengths)?
            .into_iter()
            .map(mean)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::assert_approx;

    #[test]
    fn demeans_each_unit_independently() {
        let a = [1.0, 2.0, 3.0, 10.0, 20.0];
        let out = WithinTransformer::new().demean(&a, &[3, 2]).unwrap();
        let expected = [-1.0, 0.0, 1.0, -5.0, 5.0];
        for (got, want) in out.iter().zip(expected) {
            assert_approx(*got, want, 1e-12);
        }
    }

    #[test]
    fn single_observation_unit_becomes_zero() {
        let out = WithinTransformer::new().demean(&[7.5, 1.0, 3.0], &[1, 2]).unwrap();
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn unit_means_in_order() {
        let means = WithinTransformer::new()
            .unit_means(&[1.0, 3.0, 10.0], &[2, 1])
            .unwrap();
        assert_eq!(means, vec![2.0, 10.0]);
    }
}
