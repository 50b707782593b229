//! Error taxonomy for the estimation core.
//!
//! Every failure carries enough context (unit index, lengths, offending
//! parameter) to trace it back to the input panel. Nothing in the core
//! substitutes a default value for a failed computation.

use std::fmt;

use thiserror::Error;

/// Errors raised by the estimation components.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("shape mismatch in {series}: expected {expected} observations, got {actual}")]
    ShapeMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unit {unit} has zero observations")]
    ZeroLengthUnit { unit: usize },

    #[error("panel has no units")]
    EmptyPanel,

    #[error("insufficient length: {0}")]
    InsufficientLength(LengthShortfall),

    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(Degeneracy),

    #[error("non-finite value in {series} at stacked index {index}")]
    NonFiniteInput { series: &'static str, index: usize },

    #[error("invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// Why a panel is too short for the requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthShortfall {
    /// A lag-window deletion would consume a whole unit.
    Window {
        unit: usize,
        length: usize,
        window: usize,
    },
    /// No unit is long enough to enter the jackknife aggregation.
    NoEligibleUnit { units: usize, threshold: usize },
}

impl fmt::Display for LengthShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window {
                unit,
                length,
                window,
            } => write!(
                f,
                "unit {unit} has {length} observations, cannot delete a window of {window}"
            ),
            Self::NoEligibleUnit { units, threshold } => write!(
                f,
                "none of the {units} units has more than {threshold} observations"
            ),
        }
    }
}

/// Which quantity degenerated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Degeneracy {
    /// The instrument/regressor cross moment ZX vanished.
    ZeroInstrumentMoment,
    /// The jackknife denominator summed to zero over eligible units.
    ZeroJackknifeDenominator,
    /// `rhoz == rho_hat` in the Nickell bias term.
    RhozEqualsRhoHat { rho: f64 },
    /// `1 - rho` vanishes for the named persistence parameter.
    UnitRootDenominator { parameter: &'static str },
    /// A final quantity came out NaN or infinite.
    NonFiniteResult { quantity: &'static str },
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroInstrumentMoment => {
                write!(f, "instrument-regressor moment ZX is zero")
            }
            Self::ZeroJackknifeDenominator => {
                write!(f, "jackknife denominator is zero (constant regressor?)")
            }
            Self::RhozEqualsRhoHat { rho } => {
                write!(f, "rhoz equals estimated rho ({rho}) in the bias term")
            }
            Self::UnitRootDenominator { parameter } => {
                write!(f, "{parameter} equals 1, bias term denominator vanishes")
            }
            Self::NonFiniteResult { quantity } => {
                write!(f, "{quantity} is not finite")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_shortfall_names_unit_and_lengths() {
        let err = EstimationError::InsufficientLength(LengthShortfall::Window {
            unit: 3,
            length: 1,
            window: 1,
        });
        let msg = err.to_string();
        assert!(msg.contains("unit 3"), "{msg}");
        assert!(msg.contains("1 observations"), "{msg}");
    }

    #[test]
    fn degeneracy_message_mentions_quantity() {
        let err = EstimationError::NumericalDegeneracy(Degeneracy::NonFiniteResult {
            quantity: "se",
        });
        assert_eq!(err.to_string(), "numerical degeneracy: se is not finite");
    }
}
