//! Turn-stepped race engine.
//!
//! A [`RaceEngine`] owns one [`Vehicle`] and one [`Track`] and advances them a
//! turn at a time until laps, time, or fuel run out. Running dry is a normal
//! ending: the engine turns `InsufficientFuel` from the car into a finished
//! race instead of an error.
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RaceConfig;
use crate::constants::{FIRST_LAP, LOG_TARGET_RACE, LOG_TARGET_TURN};
use crate::error::RaceError;
use crate::track::Track;
use crate::vehicle::{CarCategory, Vehicle};

/// Action chosen for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnAction {
    SpeedUp,
    MaintainSpeed,
    PitStop,
}

impl TurnAction {
    pub const ALL: [Self; 3] = [Self::SpeedUp, Self::MaintainSpeed, Self::PitStop];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SpeedUp => "speed up",
            Self::MaintainSpeed => "maintain speed",
            Self::PitStop => "pit stop",
        }
    }
}

impl fmt::Display for TurnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a race reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    LapsCompleted,
    TimeExpired,
    FuelExhausted,
}

impl FinishReason {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LapsCompleted => "laps completed",
            Self::TimeExpired => "time expired",
            Self::FuelExhausted => "fuel exhausted",
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Point-in-time view of everything a presentation layer may render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub car_name: String,
    pub car_category: CarCategory,
    pub track_name: Option<String>,
    pub current_lap: u32,
    pub total_laps: u32,
    pub lap_progress_distance: f64,
    pub lap_progress_percent: f64,
    pub lap_length: f64,
    pub time_remaining: f64,
    pub elapsed_time: f64,
    pub current_fuel: f64,
    pub max_fuel_capacity: f64,
    pub current_speed: f64,
    pub max_speed: f64,
    pub turns_taken: u32,
    pub pit_stops: u32,
    pub total_distance: f64,
    pub race_finished: bool,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone)]
pub struct RaceEngine {
    vehicle: Vehicle,
    track: Track,
    config: RaceConfig,
    current_lap: u32,
    lap_progress_distance: f64,
    time_remaining: f64,
    turns_taken: u32,
    pit_stops: u32,
    total_distance: f64,
    finish_reason: Option<FinishReason>,
}

impl RaceEngine {
    /// Put `vehicle` on the grid of `track`.
    ///
    /// # Errors
    ///
    /// Returns `RaceError::InvalidArgument` when `config` fails validation.
    pub fn new(vehicle: Vehicle, track: Track, config: RaceConfig) -> Result<Self, RaceError> {
        config.validate()?;
        let mut vehicle = vehicle;
        if config.rolling_start_ratio > 0.0 {
            let target = vehicle.max_speed() * config.rolling_start_ratio;
            vehicle.speed_up(target - vehicle.current_speed());
        }
        let time_remaining = config.race_time_budget;
        debug!(
            target: LOG_TARGET_RACE,
            "grid: {} on {} laps x {:.3}, budget {time_remaining}",
            vehicle.name(),
            track.total_laps(),
            track.lap_length()
        );
        Ok(Self {
            vehicle,
            track,
            config,
            current_lap: FIRST_LAP,
            lap_progress_distance: 0.0,
            time_remaining,
            turns_taken: 0,
            pit_stops: 0,
            total_distance: 0.0,
            finish_reason: None,
        })
    }

    /// Same as [`RaceEngine::new`] with the default timing.
    ///
    /// # Errors
    ///
    /// Never fails with the default config; kept fallible for signature parity.
    pub fn with_defaults(vehicle: Vehicle, track: Track) -> Result<Self, RaceError> {
        Self::new(vehicle, track, RaceConfig::default())
    }

    /// Advance the race by one turn.
    ///
    /// # Errors
    ///
    /// Returns `RaceError::RaceAlreadyFinished` once the race is over, or
    /// `RaceError::InvalidArgument` when the turn's distance is not finite.
    /// State is left untouched on error.
    pub fn execute_turn(&mut self, action: TurnAction) -> Result<(), RaceError> {
        if let Some(reason) = self.finish_reason {
            return Err(RaceError::RaceAlreadyFinished { reason });
        }

        let speed_before = self.vehicle.current_speed();
        match action {
            TurnAction::PitStop => {
                self.pit_stop_turn();
                return Ok(());
            }
            TurnAction::SpeedUp => {
                let increment = self.config.speed_up.increment_for(self.vehicle.max_speed());
                self.vehicle.speed_up(increment);
            }
            TurnAction::MaintainSpeed => self.vehicle.maintain_speed(),
        }

        let distance = self.distance_per_turn();
        match self.vehicle.drive(distance) {
            Ok(()) => self.turns_taken += 1,
            Err(RaceError::InsufficientFuel { needed, available, .. }) => {
                self.turns_taken += 1;
                debug!(
                    target: LOG_TARGET_TURN,
                    "turn {}: {action} stalls, needs {needed:.3} fuel with {available:.3} left",
                    self.turns_taken
                );
                self.finish(FinishReason::FuelExhausted);
                return Ok(());
            }
            Err(err) => {
                // Surfaced errors leave the race exactly as it was.
                self.vehicle.restore_speed(speed_before);
                return Err(err);
            }
        }

        self.lap_progress_distance += distance;
        self.total_distance += distance;
        self.time_remaining -= self.config.time_step;
        debug!(
            target: LOG_TARGET_TURN,
            "turn {}: {action} at {:.1}, covered {distance:.4}, fuel {:.3}, time {:.1}",
            self.turns_taken,
            self.vehicle.current_speed(),
            self.vehicle.current_fuel(),
            self.time_remaining
        );

        self.evaluate_termination();
        Ok(())
    }

    /// Shorthand for `execute_turn(TurnAction::SpeedUp)`.
    ///
    /// # Errors
    ///
    /// See [`RaceEngine::execute_turn`].
    pub fn speed_up(&mut self) -> Result<(), RaceError> {
        self.execute_turn(TurnAction::SpeedUp)
    }

    /// # Errors
    ///
    /// See [`RaceEngine::execute_turn`].
    pub fn maintain_speed(&mut self) -> Result<(), RaceError> {
        self.execute_turn(TurnAction::MaintainSpeed)
    }

    /// # Errors
    ///
    /// See [`RaceEngine::execute_turn`].
    pub fn pit_stop(&mut self) -> Result<(), RaceError> {
        self.execute_turn(TurnAction::PitStop)
    }

    fn pit_stop_turn(&mut self) {
        let amount = self.vehicle.top_off();
        self.turns_taken += 1;
        self.pit_stops += 1;
        self.time_remaining -= self.config.pit_stop_time_cost;
        debug!(
            target: LOG_TARGET_TURN,
            "turn {}: pit stop added {amount:.3} fuel, time {:.1}",
            self.turns_taken,
            self.time_remaining
        );
        self.evaluate_termination();
    }

    fn evaluate_termination(&mut self) {
        if self.time_remaining <= 0.0 {
            self.finish(FinishReason::TimeExpired);
            return;
        }
        if self.vehicle.current_fuel() <= 0.0 {
            self.finish(FinishReason::FuelExhausted);
            return;
        }
        if self.lap_progress_distance >= self.track.lap_length() {
            self.lap_progress_distance = 0.0;
            let closed_lap = self.current_lap;
            self.current_lap = self.current_lap.saturating_add(1);
            info!(
                target: LOG_TARGET_RACE,
                "lap {closed_lap} complete after {} turns",
                self.turns_taken
            );
            if self
                .config
                .lap_rule
                .race_complete(self.current_lap, self.track.total_laps())
            {
                self.finish(FinishReason::LapsCompleted);
            }
        }
    }

    fn finish(&mut self, reason: FinishReason) {
        if self.finish_reason.is_none() {
            info!(
                target: LOG_TARGET_RACE,
                "race finished: {reason} (lap {}, {:.1} time left, {:.3} fuel)",
                self.current_lap,
                self.time_remaining,
                self.vehicle.current_fuel()
            );
            self.finish_reason = Some(reason);
        }
    }

    #[must_use]
    pub const fn current_lap(&self) -> u32 {
        self.current_lap
    }

    #[must_use]
    pub const fn lap_progress_distance(&self) -> f64 {
        self.lap_progress_distance
    }

    #[must_use]
    pub const fn time_remaining(&self) -> f64 {
        self.time_remaining
    }

    #[must_use]
    pub const fn race_finished(&self) -> bool {
        self.finish_reason.is_some()
    }

    #[must_use]
    pub const fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    #[must_use]
    pub const fn turns_taken(&self) -> u32 {
        self.turns_taken
    }

    #[must_use]
    pub const fn pit_stops(&self) -> u32 {
        self.pit_stops
    }

    /// Distance driven over the whole race, including laps already closed.
    #[must_use]
    pub const fn total_distance(&self) -> f64 {
        self.total_distance
    }

    #[must_use]
    pub fn elapsed_time(&self) -> f64 {
        self.config.race_time_budget - self.time_remaining
    }

    #[must_use]
    pub fn lap_progress_percent(&self) -> f64 {
        self.track.lap_progress_percent(self.lap_progress_distance)
    }

    /// Distance the next driving turn covers at the current speed.
    #[must_use]
    pub fn distance_per_turn(&self) -> f64 {
        self.config.distance_per_turn(self.vehicle.current_speed())
    }

    /// Fuel a `MaintainSpeed` turn would burn right now.
    #[must_use]
    pub fn fuel_for_next_turn(&self) -> f64 {
        self.vehicle.fuel_needed(self.distance_per_turn())
    }

    #[must_use]
    pub const fn current_fuel(&self) -> f64 {
        self.vehicle.current_fuel()
    }

    #[must_use]
    pub const fn current_speed(&self) -> f64 {
        self.vehicle.current_speed()
    }

    #[must_use]
    pub const fn max_fuel_capacity(&self) -> f64 {
        self.vehicle.max_fuel_capacity()
    }

    #[must_use]
    pub const fn max_speed(&self) -> f64 {
        self.vehicle.max_speed()
    }

    #[must_use]
    pub const fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    #[must_use]
    pub const fn track(&self) -> &Track {
        &self.track
    }

    #[must_use]
    pub const fn config(&self) -> &RaceConfig {
        &self.config
    }

    #[must_use]
    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            car_name: self.vehicle.name().to_string(),
            car_category: self.vehicle.category(),
            track_name: self.track.name().map(str::to_string),
            current_lap: self.current_lap,
            total_laps: self.track.total_laps(),
            lap_progress_distance: self.lap_progress_distance,
            lap_progress_percent: self.lap_progress_percent(),
            lap_length: self.track.lap_length(),
            time_remaining: self.time_remaining,
            elapsed_time: self.elapsed_time(),
            current_fuel: self.vehicle.current_fuel(),
            max_fuel_capacity: self.vehicle.max_fuel_capacity(),
            current_speed: self.vehicle.current_speed(),
            max_speed: self.vehicle.max_speed(),
            turns_taken: self.turns_taken,
            pit_stops: self.pit_stops,
            total_distance: self.total_distance,
            race_finished: self.race_finished(),
            finish_reason: self.finish_reason,
        }
    }

    /// Consume the engine, handing back the car and circuit.
    #[must_use]
    pub fn into_parts(self) -> (Vehicle, Track) {
        (self.vehicle, self.track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LapRule, SpeedUpRule};
    use crate::vehicle::CarCategory;

    fn vehicle(max_fuel: f64, rate: f64, max_speed: f64) -> Vehicle {
        Vehicle::new("Test", CarCategory::Sport, max_fuel, rate, max_speed).expect("valid")
    }

    /// One lap of the 5-unit track per turn at 300 speed.
    fn lap_per_turn_config() -> RaceConfig {
        RaceConfig {
            time_step: 60.0,
            ..RaceConfig::default()
        }
    }

    #[test]
    fn fresh_engine_starts_on_lap_one_with_full_budget() {
        let engine =
            RaceEngine::with_defaults(vehicle(50.0, 0.05, 60.0), Track::new(2, 5.0).unwrap())
                .expect("engine");
        assert_eq!(engine.current_lap(), 1);
        assert!(engine.lap_progress_distance().abs() < f64::EPSILON);
        assert!((engine.time_remaining() - 1_800.0).abs() < f64::EPSILON);
        assert!(!engine.race_finished());
        assert!(engine.elapsed_time().abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = RaceConfig {
            race_time_budget: 0.0,
            ..RaceConfig::default()
        };
        let result = RaceEngine::new(vehicle(50.0, 0.05, 60.0), Track::new(1, 1.0).unwrap(), cfg);
        assert!(matches!(result, Err(RaceError::InvalidArgument { .. })));
    }

    #[test]
    fn speed_up_turn_applies_increment_then_drives() {
        let mut engine =
            RaceEngine::with_defaults(vehicle(50.0, 0.05, 60.0), Track::new(2, 5.0).unwrap())
                .expect("engine");
        engine.speed_up().expect("turn");
        assert!((engine.current_speed() - 10.0).abs() < f64::EPSILON);
        let expected = 10.0 * (10.0 / 3_600.0);
        assert!((engine.lap_progress_distance() - expected).abs() < 1e-12);
        assert!((engine.time_remaining() - 1_790.0).abs() < f64::EPSILON);
        assert!(engine.current_fuel() < 50.0);
    }

    #[test]
    fn fraction_of_max_rule_uses_top_speed() {
        let cfg = RaceConfig {
            speed_up: SpeedUpRule::FractionOfMax(0.1),
            ..RaceConfig::default()
        };
        let mut engine =
            RaceEngine::new(vehicle(100.0, 0.1, 300.0), Track::new(5, 5.0).unwrap(), cfg)
                .expect("engine");
        engine.speed_up().expect("turn");
        assert!((engine.current_speed() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn rolling_start_sets_initial_speed() {
        let cfg = RaceConfig {
            rolling_start_ratio: 0.5,
            ..RaceConfig::default()
        };
        let engine = RaceEngine::new(vehicle(100.0, 0.1, 300.0), Track::new(5, 5.0).unwrap(), cfg)
            .expect("engine");
        assert!((engine.current_speed() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn exact_lap_length_completes_the_lap() {
        let car = vehicle(100.0, 0.1, 300.0).with_current_speed(300.0);
        let mut engine = RaceEngine::new(car, Track::new(5, 5.0).unwrap(), lap_per_turn_config())
            .expect("engine");
        assert!((engine.distance_per_turn() - 5.0).abs() < 1e-12);
        engine.maintain_speed().expect("turn");
        assert_eq!(engine.current_lap(), 2);
        assert!(engine.lap_progress_distance().abs() < f64::EPSILON);
        assert!((engine.total_distance() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn at_most_one_lap_per_turn() {
        let car = vehicle(100.0, 0.0, 300.0).with_current_speed(300.0);
        let mut engine =
            RaceEngine::new(car, Track::new(10, 1.0).unwrap(), lap_per_turn_config())
                .expect("engine");
        engine.maintain_speed().expect("turn");
        assert_eq!(engine.current_lap(), 2);
        assert!(engine.lap_progress_distance().abs() < f64::EPSILON);
    }

    #[test]
    fn inclusive_lap_rule_finishes_one_lap_early() {
        let cfg = RaceConfig {
            lap_rule: LapRule::Inclusive,
            ..lap_per_turn_config()
        };
        let car = vehicle(100.0, 0.1, 300.0).with_current_speed(300.0);
        let mut engine = RaceEngine::new(car, Track::new(2, 5.0).unwrap(), cfg).expect("engine");
        engine.maintain_speed().expect("turn");
        assert!(engine.race_finished());
        assert_eq!(engine.finish_reason(), Some(FinishReason::LapsCompleted));
    }

    #[test]
    fn time_budget_expiry_finishes_race() {
        let cfg = RaceConfig {
            race_time_budget: 25.0,
            ..RaceConfig::default()
        };
        let mut engine =
            RaceEngine::new(vehicle(50.0, 0.05, 60.0), Track::new(3, 5.0).unwrap(), cfg)
                .expect("engine");
        engine.maintain_speed().expect("turn");
        engine.maintain_speed().expect("turn");
        assert!(!engine.race_finished());
        engine.maintain_speed().expect("turn");
        assert_eq!(engine.finish_reason(), Some(FinishReason::TimeExpired));
    }

    #[test]
    fn pit_stop_can_run_out_the_clock() {
        let cfg = RaceConfig {
            race_time_budget: 30.0,
            ..RaceConfig::default()
        };
        let mut engine =
            RaceEngine::new(vehicle(50.0, 0.05, 60.0), Track::new(3, 5.0).unwrap(), cfg)
                .expect("engine");
        engine.pit_stop().expect("turn");
        assert_eq!(engine.finish_reason(), Some(FinishReason::TimeExpired));
        assert_eq!(engine.pit_stops(), 1);
    }

    #[test]
    fn time_expiry_takes_precedence_over_lap_completion() {
        let cfg = RaceConfig {
            race_time_budget: 60.0,
            ..lap_per_turn_config()
        };
        let car = vehicle(100.0, 0.1, 300.0).with_current_speed(300.0);
        let mut engine = RaceEngine::new(car, Track::new(1, 5.0).unwrap(), cfg).expect("engine");
        engine.maintain_speed().expect("turn");
        assert_eq!(engine.finish_reason(), Some(FinishReason::TimeExpired));
        assert_eq!(engine.current_lap(), 1);
    }

    #[test]
    fn draining_the_tank_exactly_finishes_race() {
        // 300 speed * 60/3600 = 5 units, at rate 0.1 and full ratio burns 0.5.
        let car = vehicle(100.0, 0.1, 300.0)
            .with_current_speed(300.0)
            .with_current_fuel(0.5);
        let mut engine = RaceEngine::new(car, Track::new(5, 50.0).unwrap(), lap_per_turn_config())
            .expect("engine");
        engine.maintain_speed().expect("turn");
        assert_eq!(engine.finish_reason(), Some(FinishReason::FuelExhausted));
        assert!((engine.lap_progress_distance() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn finished_race_rejects_further_turns_without_mutation() {
        let car = vehicle(100.0, 0.1, 300.0).with_current_speed(300.0);
        let mut engine = RaceEngine::new(car, Track::new(1, 5.0).unwrap(), lap_per_turn_config())
            .expect("engine");
        engine.maintain_speed().expect("turn");
        assert!(engine.race_finished());
        let before = engine.snapshot();
        for action in TurnAction::ALL {
            let err = engine.execute_turn(action).unwrap_err();
            assert_eq!(
                err,
                RaceError::RaceAlreadyFinished {
                    reason: FinishReason::LapsCompleted
                }
            );
        }
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn rejected_drive_leaves_turn_count_and_speed_untouched() {
        // A valid config can still overflow the distance for an absurd top speed.
        let cfg = RaceConfig {
            time_step: 1e10,
            time_units_per_speed_unit: 1.0,
            speed_up: SpeedUpRule::FractionOfMax(0.1),
            ..RaceConfig::default()
        };
        let car = vehicle(100.0, 0.1, 1e300).with_current_speed(5e299);
        let mut engine = RaceEngine::new(car, Track::new(5, 5.0).unwrap(), cfg).expect("engine");
        let before = engine.snapshot();

        let err = engine.speed_up().unwrap_err();

        assert!(matches!(err, RaceError::InvalidArgument { field: "drive.distance", .. }));
        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.turns_taken(), 0);
        assert!(!engine.race_finished());
    }

    #[test]
    fn lap_counter_saturates_on_huge_lap_counts() {
        let car = vehicle(100.0, 0.0, 300.0).with_current_speed(300.0);
        let mut engine = RaceEngine::new(
            car,
            Track::new(u32::MAX, 5.0).unwrap(),
            lap_per_turn_config(),
        )
        .expect("engine");
        engine.current_lap = u32::MAX;
        engine.maintain_speed().expect("turn");
        assert_eq!(engine.current_lap(), u32::MAX);
        assert!(!engine.race_finished());
    }

    #[test]
    fn snapshot_serializes_observable_state() {
        let track = Track::new(2, 5.0).unwrap().with_name("Test Ring");
        let engine = RaceEngine::with_defaults(vehicle(50.0, 0.05, 60.0), track).expect("engine");
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.track_name.as_deref(), Some("Test Ring"));
        let json = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(json["current_lap"], 1);
        assert_eq!(json["race_finished"], false);
        assert!(json["finish_reason"].is_null());
    }

    #[test]
    fn fuel_for_next_turn_predicts_burn() {
        let car = vehicle(50.0, 0.05, 60.0).with_current_speed(60.0);
        let mut engine =
            RaceEngine::with_defaults(car, Track::new(2, 5.0).unwrap()).expect("engine");
        let predicted = engine.fuel_for_next_turn();
        let before = engine.current_fuel();
        engine.maintain_speed().expect("turn");
        assert!((before - engine.current_fuel() - predicted).abs() < 1e-12);
    }
}
