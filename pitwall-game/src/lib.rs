//! Pitwall Race Engine
//!
//! Platform-agnostic core logic for a turn-based racing game: a car burns fuel
//! and covers distance one turn at a time against a lap count and a time
//! budget. This crate provides the mechanics without any UI dependencies;
//! hosts construct a [`RaceEngine`] and call [`RaceEngine::execute_turn`]
//! until [`RaceEngine::race_finished`] reports true.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod numbers;
pub mod race;
pub mod track;
pub mod vehicle;

// Re-export commonly used types
pub use catalog::{CarSpec, Catalog, TrackSpec};
pub use config::{LapRule, RaceConfig, SpeedUpRule};
pub use error::RaceError;
pub use race::{FinishReason, RaceEngine, RaceSnapshot, TurnAction};
pub use track::Track;
pub use vehicle::{CarCategory, FuelModel, Vehicle};
