//! Race tuning: turn timing, pit costs, throttle, and lap-completion rules.
use serde::{Deserialize, Serialize};

use crate::constants::{
    PIT_STOP_TIME_COST, RACE_TIME_BUDGET, ROLLING_START_RATIO, SPEED_UP_INCREMENT,
    TIME_UNITS_PER_SPEED_UNIT, TURN_TIME_STEP,
};
use crate::error::{RaceError, ensure_non_negative, ensure_positive};

/// How much a `SpeedUp` turn adds to the car's speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum SpeedUpRule {
    /// Add a fixed number of speed units.
    Fixed(f64),
    /// Add a fraction of the car's top speed.
    FractionOfMax(f64),
}

impl SpeedUpRule {
    #[must_use]
    pub fn increment_for(self, max_speed: f64) -> f64 {
        match self {
            Self::Fixed(units) => units,
            Self::FractionOfMax(ratio) => max_speed * ratio,
        }
    }

    fn validate(self) -> Result<(), RaceError> {
        match self {
            Self::Fixed(units) => ensure_non_negative("speed_up.fixed", units).map(drop),
            Self::FractionOfMax(ratio) => {
                if (0.0..=1.0).contains(&ratio) {
                    Ok(())
                } else {
                    Err(RaceError::invalid(
                        "speed_up.fraction_of_max",
                        "between 0 and 1",
                        ratio,
                    ))
                }
            }
        }
    }
}

impl Default for SpeedUpRule {
    fn default() -> Self {
        Self::Fixed(SPEED_UP_INCREMENT)
    }
}

/// When a completed lap ends the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LapRule {
    /// Finish once the lap counter moves past the final lap.
    #[default]
    Strict,
    /// Finish as soon as the lap counter reaches the final lap.
    Inclusive,
}

impl LapRule {
    #[must_use]
    pub const fn race_complete(self, current_lap: u32, total_laps: u32) -> bool {
        match self {
            Self::Strict => current_lap > total_laps,
            Self::Inclusive => current_lap >= total_laps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Time that elapses on every driving turn.
    #[serde(default = "RaceConfig::default_time_step")]
    pub time_step: f64,
    /// Converts speed into distance per unit of time (3600 for km/h and seconds).
    #[serde(default = "RaceConfig::default_time_units_per_speed_unit")]
    pub time_units_per_speed_unit: f64,
    #[serde(default = "RaceConfig::default_pit_stop_time_cost")]
    pub pit_stop_time_cost: f64,
    #[serde(default = "RaceConfig::default_race_time_budget")]
    pub race_time_budget: f64,
    #[serde(default)]
    pub speed_up: SpeedUpRule,
    /// Fraction of top speed the car carries over the start line.
    #[serde(default = "RaceConfig::default_rolling_start_ratio")]
    pub rolling_start_ratio: f64,
    #[serde(default)]
    pub lap_rule: LapRule,
}

impl RaceConfig {
    const fn default_time_step() -> f64 {
        TURN_TIME_STEP
    }

    const fn default_time_units_per_speed_unit() -> f64 {
        TIME_UNITS_PER_SPEED_UNIT
    }

    const fn default_pit_stop_time_cost() -> f64 {
        PIT_STOP_TIME_COST
    }

    const fn default_race_time_budget() -> f64 {
        RACE_TIME_BUDGET
    }

    const fn default_rolling_start_ratio() -> f64 {
        ROLLING_START_RATIO
    }

    /// Parse a config from JSON; omitted fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the payload is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Distance a car at `speed` covers on one driving turn.
    #[must_use]
    pub fn distance_per_turn(&self, speed: f64) -> f64 {
        speed * (self.time_step / self.time_units_per_speed_unit)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `RaceError::InvalidArgument` naming the first field out of bounds.
    pub fn validate(&self) -> Result<(), RaceError> {
        ensure_positive("config.time_step", self.time_step)?;
        ensure_positive(
            "config.time_units_per_speed_unit",
            self.time_units_per_speed_unit,
        )?;
        let step_ratio = self.time_step / self.time_units_per_speed_unit;
        if !step_ratio.is_finite() {
            return Err(RaceError::invalid(
                "config.time_step",
                "finite when divided by time_units_per_speed_unit",
                step_ratio,
            ));
        }
        ensure_non_negative("config.pit_stop_time_cost", self.pit_stop_time_cost)?;
        ensure_positive("config.race_time_budget", self.race_time_budget)?;
        self.speed_up.validate()?;
        if !(0.0..=1.0).contains(&self.rolling_start_ratio) {
            return Err(RaceError::invalid(
                "config.rolling_start_ratio",
                "between 0 and 1",
                self.rolling_start_ratio,
            ));
        }
        Ok(())
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            time_step: Self::default_time_step(),
            time_units_per_speed_unit: Self::default_time_units_per_speed_unit(),
            pit_stop_time_cost: Self::default_pit_stop_time_cost(),
            race_time_budget: Self::default_race_time_budget(),
            speed_up: SpeedUpRule::default(),
            rolling_start_ratio: Self::default_rolling_start_ratio(),
            lap_rule: LapRule::default(),
        }
    }
}
