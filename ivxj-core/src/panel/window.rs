//! Per-unit lag/lead alignment: drop a fixed window from every unit.

use super::segment::PanelSegmenter;
use crate::error::{EstimationError, LengthShortfall};

/// Which end of each unit the window is removed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEdge {
    /// Drop the first `h` observations (aligns to the post-lag sample).
    Start,
    /// Drop the last `h` observations (produces the `h`-period lag).
    End,
}

/// Removes `h` leading or trailing observations from each unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct LagWindowDeleter {
    segmenter: PanelSegmenter,
}

impl LagWindowDeleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop `h` observations from `edge` of every unit and re-stack.
    ///
    /// Every unit must be strictly longer than `h`; a unit that would be
    /// consumed entirely is an error, never a silently shorter output.
    pub fn delete_window(
        &self,
        a: &[f64],
        lengths: &[usize],
        h: usize,
        edge: WindowEdge,
    ) -> Result<Vec<f64>, EstimationError> {
        let units = self.segmenter.segment(a, lengths)?;
        if h == 0 {
            return Ok(a.to_vec());
        }

        let mut out = Vec::with_capacity(a.len().saturating_sub(h * units.len()));
        for (unit, values) in units.iter().enumerate() {
            let length = values.len();
            if length <= h {
                return Err(EstimationError::InsufficientLength(
                    LengthShortfall::Window {
                        unit,
                        length,
                        window: h,
                    },
                ));
            }
            let kept = match edge {
                WindowEdge::Start => &values[h..],
                WindowEdge::End => &values[..length - h],
            };
            out.extend_from_slice(kept);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_one_from_either_edge() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let deleter = LagWindowDeleter::new();
        assert_eq!(
            deleter.delete_window(&a, &[3, 3], 1, WindowEdge::Start).unwrap(),
            vec![2.0, 3.0, 5.0, 6.0]
        );
        assert_eq!(
            deleter.delete_window(&a, &[3, 3], 1, WindowEdge::End).unwrap(),
            vec![1.0, 2.0, 4.0, 5.0]
        );
    }

    #[test]
    fn unbalanced_units_keep_order() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let out = LagWindowDeleter::new()
            .delete_window(&a, &[4, 3], 2, WindowEdge::Start)
            .unwrap();
        assert_eq!(out, vec![3.0, 4.0, 7.0]);
    }

    #[test]
    fn zero_window_is_identity() {
        let a = [1.0, 2.0, 3.0];
        for edge in [WindowEdge::Start, WindowEdge::End] {
            let out = LagWindowDeleter::new()
                .delete_window(&a, &[1, 2], 0, edge)
                .unwrap();
            assert_eq!(out, a.to_vec());
        }
    }

    #[test]
    fn window_consuming_a_unit_fails() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let err = LagWindowDeleter::new()
            .delete_window(&a, &[3, 1], 1, WindowEdge::End)
            .unwrap_err();
        assert_eq!(
            err,
            EstimationError::InsufficientLength(LengthShortfall::Window {
                unit: 1,
                length: 1,
                window: 1,
            })
        );
    }

    #[test]
    fn shape_mismatch_is_reported_before_window() {
        let err = LagWindowDeleter::new()
            .delete_window(&[1.0, 2.0], &[3], 1, WindowEdge::Start)
            .unwrap_err();
        assert!(matches!(err, EstimationError::ShapeMismatch { .. }));
    }
}
