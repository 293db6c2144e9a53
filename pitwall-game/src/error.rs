use thiserror::Error;

use crate::race::FinishReason;

/// Errors raised by vehicles, tracks, and the race engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RaceError {
    #[error("{field} must be {requirement} (got {value})")]
    InvalidArgument {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },
    #[error("refuelling {amount:.2} would overfill the tank ({current:.2}/{capacity:.2})")]
    Overfill {
        amount: f64,
        current: f64,
        capacity: f64,
    },
    #[error("driving {distance:.3} needs {needed:.3} fuel but only {available:.3} remains")]
    InsufficientFuel {
        distance: f64,
        needed: f64,
        available: f64,
    },
    #[error("race has already finished ({reason})")]
    RaceAlreadyFinished { reason: FinishReason },
}

impl RaceError {
    pub(crate) const fn invalid(field: &'static str, requirement: &'static str, value: f64) -> Self {
        Self::InvalidArgument {
            field,
            requirement,
            value,
        }
    }

    /// Recoverable errors leave every piece of state untouched and may be retried
    /// with different input.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Overfill { .. } | Self::InvalidArgument { .. })
    }
}

/// Require a finite value strictly above zero.
pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<f64, RaceError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RaceError::invalid(field, "a positive finite number", value))
    }
}

/// Require a finite value at or above zero.
pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<f64, RaceError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(RaceError::invalid(field, "a non-negative finite number", value))
    }
}
