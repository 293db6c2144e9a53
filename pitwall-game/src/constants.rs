//! Centralized timing and tuning constants for Pitwall race logic.
//!
//! These values seed [`crate::RaceConfig::default`]. Races read them through
//! the config so tests and hosts can shrink or stretch any of them.

// Turn timing --------------------------------------------------------------
/// In-race time that elapses on every non pit-stop turn.
pub(crate) const TURN_TIME_STEP: f64 = 10.0;
/// Time units in one speed unit's denominator (seconds per hour for km/h).
pub(crate) const TIME_UNITS_PER_SPEED_UNIT: f64 = 3_600.0;
/// Total time budget a race starts with.
pub(crate) const RACE_TIME_BUDGET: f64 = 1_800.0;

// Pit lane -----------------------------------------------------------------
pub(crate) const PIT_STOP_TIME_COST: f64 = 30.0;

// Throttle -----------------------------------------------------------------
pub(crate) const SPEED_UP_INCREMENT: f64 = 10.0;
pub(crate) const ROLLING_START_RATIO: f64 = 0.0;

// Lap accounting -----------------------------------------------------------
pub(crate) const FIRST_LAP: u32 = 1;

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_TURN: &str = "pitwall::turn";
pub(crate) const LOG_TARGET_RACE: &str = "pitwall::race";
