//! Preset cars and circuits.
use serde::{Deserialize, Serialize};

use crate::error::RaceError;
use crate::track::Track;
use crate::vehicle::{CarCategory, FuelModel, Vehicle};

const DEFAULT_CATALOG_DATA: &str = include_str!("../data/catalog.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarSpec {
    pub id: String,
    pub name: String,
    pub category: CarCategory,
    pub max_fuel_capacity: f64,
    pub fuel_consumption_per_unit: f64,
    pub max_speed: f64,
    #[serde(default)]
    pub fuel_model: FuelModel,
}

impl CarSpec {
    /// # Errors
    ///
    /// Returns `RaceError::InvalidArgument` when the preset's numbers are out of range.
    pub fn build(&self) -> Result<Vehicle, RaceError> {
        Vehicle::new(
            self.name.clone(),
            self.category,
            self.max_fuel_capacity,
            self.fuel_consumption_per_unit,
            self.max_speed,
        )
        .map(|vehicle| vehicle.with_fuel_model(self.fuel_model))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSpec {
    pub id: String,
    pub name: String,
    pub total_laps: u32,
    pub lap_length: f64,
}

impl TrackSpec {
    /// # Errors
    ///
    /// Returns `RaceError::InvalidArgument` when laps or lap length are not positive.
    pub fn build(&self) -> Result<Track, RaceError> {
        Track::new(self.total_laps, self.lap_length).map(|track| track.with_name(self.name.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Catalog {
    #[serde(default)]
    pub cars: Vec<CarSpec>,
    #[serde(default)]
    pub tracks: Vec<TrackSpec>,
}

impl Catalog {
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into catalog data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Presets bundled with the crate.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CATALOG_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn car(&self, id: &str) -> Option<&CarSpec> {
        self.cars.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn track(&self, id: &str) -> Option<&TrackSpec> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn car_ids(&self) -> impl Iterator<Item = &str> {
        self.cars.iter().map(|c| c.id.as_str())
    }

    pub fn track_ids(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|t| t.id.as_str())
    }
}
