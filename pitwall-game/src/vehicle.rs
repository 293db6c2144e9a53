//! Car physics: throttle, refuelling, and fuel burn over a driven distance.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RaceError, ensure_non_negative, ensure_positive};
use crate::numbers::unit_ratio;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarCategory {
    /// Fuel-efficient but slower
    Eco,
    /// Fast but thirsty
    Sport,
    /// Balanced speed and fuel
    Muscle,
}

impl CarCategory {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Eco => "Eco",
            Self::Sport => "Sport",
            Self::Muscle => "Muscle",
        }
    }
}

impl fmt::Display for CarCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How fuel burn scales with distance.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelModel {
    /// `distance * rate * (current_speed / max_speed)`
    #[default]
    SpeedScaled,
    /// `distance * rate`
    Constant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    name: String,
    category: CarCategory,
    max_fuel_capacity: f64,
    fuel_consumption_per_unit: f64,
    max_speed: f64,
    current_fuel: f64,
    current_speed: f64,
    fuel_model: FuelModel,
}

impl Vehicle {
    /// Build a car with a full tank, standing still.
    ///
    /// # Errors
    ///
    /// Returns `RaceError::InvalidArgument` when capacity or top speed is not
    /// positive, or the consumption rate is negative.
    pub fn new(
        name: impl Into<String>,
        category: CarCategory,
        max_fuel_capacity: f64,
        fuel_consumption_per_unit: f64,
        max_speed: f64,
    ) -> Result<Self, RaceError> {
        let max_fuel_capacity = ensure_positive("vehicle.max_fuel_capacity", max_fuel_capacity)?;
        let fuel_consumption_per_unit =
            ensure_non_negative("vehicle.fuel_consumption_per_unit", fuel_consumption_per_unit)?;
        let max_speed = ensure_positive("vehicle.max_speed", max_speed)?;
        Ok(Self {
            name: name.into(),
            category,
            max_fuel_capacity,
            fuel_consumption_per_unit,
            max_speed,
            current_fuel: max_fuel_capacity,
            current_speed: 0.0,
            fuel_model: FuelModel::default(),
        })
    }

    /// Start with a specific fuel level, clamped into `0..=capacity`.
    #[must_use]
    pub fn with_current_fuel(mut self, fuel: f64) -> Self {
        self.current_fuel = clamp_level(fuel, self.max_fuel_capacity);
        self
    }

    /// Start with a specific speed, clamped into `0..=max_speed`.
    #[must_use]
    pub fn with_current_speed(mut self, speed: f64) -> Self {
        self.current_speed = clamp_level(speed, self.max_speed);
        self
    }

    #[must_use]
    pub const fn with_fuel_model(mut self, fuel_model: FuelModel) -> Self {
        self.fuel_model = fuel_model;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn category(&self) -> CarCategory {
        self.category
    }

    #[must_use]
    pub const fn max_fuel_capacity(&self) -> f64 {
        self.max_fuel_capacity
    }

    #[must_use]
    pub const fn fuel_consumption_per_unit(&self) -> f64 {
        self.fuel_consumption_per_unit
    }

    #[must_use]
    pub const fn max_speed(&self) -> f64 {
        self.max_speed
    }

    #[must_use]
    pub const fn current_fuel(&self) -> f64 {
        self.current_fuel
    }

    #[must_use]
    pub const fn current_speed(&self) -> f64 {
        self.current_speed
    }

    #[must_use]
    pub const fn fuel_model(&self) -> FuelModel {
        self.fuel_model
    }

    #[must_use]
    pub fn fuel_ratio(&self) -> f64 {
        unit_ratio(self.current_fuel, self.max_fuel_capacity)
    }

    #[must_use]
    pub fn speed_ratio(&self) -> f64 {
        unit_ratio(self.current_speed, self.max_speed)
    }

    /// Fuel needed to top the tank off; never negative.
    #[must_use]
    pub fn fuel_to_full(&self) -> f64 {
        (self.max_fuel_capacity - self.current_fuel).max(0.0)
    }

    /// Raise speed by `increment`, clamping at the top speed.
    pub fn speed_up(&mut self, increment: f64) {
        if !increment.is_finite() || increment <= 0.0 {
            return;
        }
        self.current_speed = (self.current_speed + increment).min(self.max_speed);
    }

    /// Put the speed back to a value read earlier from this car.
    pub(crate) fn restore_speed(&mut self, speed: f64) {
        self.current_speed = clamp_level(speed, self.max_speed);
    }

    /// Hold the current speed.
    pub const fn maintain_speed(&mut self) {}

    /// Add `amount` of fuel. Overfilling is rejected rather than clamped.
    ///
    /// # Errors
    ///
    /// Returns `RaceError::Overfill` when the tank cannot hold `amount` more, or
    /// `RaceError::InvalidArgument` for a negative amount. Fuel is unchanged on error.
    pub fn refuel(&mut self, amount: f64) -> Result<(), RaceError> {
        let amount = ensure_non_negative("refuel.amount", amount)?;
        if self.current_fuel + amount > self.max_fuel_capacity {
            return Err(RaceError::Overfill {
                amount,
                current: self.current_fuel,
                capacity: self.max_fuel_capacity,
            });
        }
        self.current_fuel += amount;
        Ok(())
    }

    /// Fill the tank to capacity, returning how much went in.
    pub fn top_off(&mut self) -> f64 {
        let amount = self.fuel_to_full();
        if amount > 0.0 {
            self.current_fuel = self.max_fuel_capacity;
        }
        amount
    }

    /// Fuel burned covering `distance` at the current speed.
    #[must_use]
    pub fn fuel_needed(&self, distance: f64) -> f64 {
        let base = distance * self.fuel_consumption_per_unit;
        match self.fuel_model {
            FuelModel::SpeedScaled => base * (self.current_speed / self.max_speed),
            FuelModel::Constant => base,
        }
    }

    /// Cover `distance`, burning the fuel it needs. All or nothing.
    ///
    /// # Errors
    ///
    /// Returns `RaceError::InvalidArgument` for a negative distance and
    /// `RaceError::InsufficientFuel` when the tank cannot cover it. Fuel is
    /// unchanged on error.
    pub fn drive(&mut self, distance: f64) -> Result<(), RaceError> {
        let distance = ensure_non_negative("drive.distance", distance)?;
        let needed = self.fuel_needed(distance);
        if needed > self.current_fuel {
            return Err(RaceError::InsufficientFuel {
                distance,
                needed,
                available: self.current_fuel,
            });
        }
        self.current_fuel -= needed;
        Ok(())
    }
}

fn clamp_level(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}
