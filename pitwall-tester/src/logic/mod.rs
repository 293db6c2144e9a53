pub mod interactive;
pub mod policy;
pub mod reports;
pub mod runner;

pub use policy::DriverStrategy;
pub use runner::{DEFAULT_MAX_TURNS, RacePlan, RaceSummary, run_race};
