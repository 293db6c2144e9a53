//! Lap layout of a circuit.
use crate::error::{RaceError, ensure_positive};

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    name: Option<String>,
    total_laps: u32,
    lap_length: f64,
}

impl Track {
    /// # Errors
    ///
    /// Returns `RaceError::InvalidArgument` when either value is not positive.
    pub fn new(total_laps: u32, lap_length: f64) -> Result<Self, RaceError> {
        if total_laps == 0 {
            return Err(RaceError::invalid(
                "track.total_laps",
                "a positive integer",
                0.0,
            ));
        }
        let lap_length = ensure_positive("track.lap_length", lap_length)?;
        Ok(Self {
            name: None,
            total_laps,
            lap_length,
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn total_laps(&self) -> u32 {
        self.total_laps
    }

    #[must_use]
    pub const fn lap_length(&self) -> f64 {
        self.lap_length
    }

    #[must_use]
    pub fn total_distance(&self) -> f64 {
        f64::from(self.total_laps) * self.lap_length
    }

    /// Percentage of one lap that `current_distance` represents.
    #[must_use]
    pub fn lap_progress_percent(&self, current_distance: f64) -> f64 {
        (current_distance / self.lap_length) * 100.0
    }
}
