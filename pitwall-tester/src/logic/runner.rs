use log::{debug, warn};
use pitwall_game::{
    CarSpec, FinishReason, RaceConfig, RaceEngine, RaceSnapshot, TrackSpec, TurnAction,
};
use serde::Serialize;

use crate::logic::policy::{DriverPolicy, DriverStrategy};

pub const DEFAULT_MAX_TURNS: u32 = 500;

/// Everything needed to run one automated race.
#[derive(Debug, Clone)]
pub struct RacePlan {
    pub car: CarSpec,
    pub track: TrackSpec,
    pub config: RaceConfig,
    pub strategy: DriverStrategy,
    pub seed: u64,
    pub max_turns: u32,
}

impl RacePlan {
    #[must_use]
    pub fn new(car: CarSpec, track: TrackSpec, strategy: DriverStrategy, seed: u64) -> Self {
        Self {
            car,
            track,
            config: RaceConfig::default(),
            strategy,
            seed,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RaceConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// One executed turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnRecord {
    pub turn: u32,
    pub action: TurnAction,
    pub lap: u32,
    pub lap_progress_percent: f64,
    pub fuel: f64,
    pub speed: f64,
    pub time_remaining: f64,
    pub rationale: Option<String>,
}

/// Outcome of a race driven to completion or to the turn cap.
#[derive(Debug, Clone, Serialize)]
pub struct RaceSummary {
    pub car_id: String,
    pub track_id: String,
    pub strategy: DriverStrategy,
    pub seed: u64,
    pub finished: bool,
    pub finish_reason: Option<FinishReason>,
    pub laps_completed: u32,
    pub turns: u32,
    pub pit_stops: u32,
    pub total_distance: f64,
    pub elapsed_time: f64,
    pub fuel_left: f64,
    pub final_state: RaceSnapshot,
    pub turn_log: Vec<TurnRecord>,
    pub errors: Vec<String>,
}

impl RaceSummary {
    /// True when the car took the chequered flag rather than stalling or timing out.
    #[must_use]
    pub fn completed_distance(&self) -> bool {
        self.finish_reason == Some(FinishReason::LapsCompleted)
    }

    #[must_use]
    pub fn outcome_label(&self) -> &'static str {
        match self.finish_reason {
            Some(reason) => reason.label(),
            None => "turn cap reached",
        }
    }
}

/// Drive `plan` with its strategy until the race ends or the turn cap trips.
///
/// # Errors
///
/// Returns the engine's construction error when a preset or config is invalid.
pub fn run_race(plan: &RacePlan) -> anyhow::Result<RaceSummary> {
    let vehicle = plan.car.build()?;
    let track = plan.track.build()?;
    let mut engine = RaceEngine::new(vehicle, track, plan.config.clone())?;
    let mut policy = plan.strategy.create_policy(plan.seed);
    Ok(drive(&mut engine, policy.as_mut(), plan))
}

fn drive(engine: &mut RaceEngine, policy: &mut dyn DriverPolicy, plan: &RacePlan) -> RaceSummary {
    let mut turn_log = Vec::new();
    let mut errors = Vec::new();

    while !engine.race_finished() && engine.turns_taken() < plan.max_turns {
        let decision = policy.choose(engine);
        if let Err(err) = engine.execute_turn(decision.action) {
            warn!("{} turn {} rejected: {err}", policy.name(), engine.turns_taken());
            errors.push(err.to_string());
            break;
        }
        debug!(
            "{} chose {} -> lap {} ({:.1}%)",
            policy.name(),
            decision.action,
            engine.current_lap(),
            engine.lap_progress_percent()
        );
        turn_log.push(TurnRecord {
            turn: engine.turns_taken(),
            action: decision.action,
            lap: engine.current_lap(),
            lap_progress_percent: engine.lap_progress_percent(),
            fuel: engine.current_fuel(),
            speed: engine.current_speed(),
            time_remaining: engine.time_remaining(),
            rationale: decision.rationale,
        });
    }

    let final_state = engine.snapshot();
    // Laps actually driven; under the inclusive rule this stops one short of total_laps.
    let laps_completed = final_state
        .current_lap
        .saturating_sub(1)
        .min(final_state.total_laps);
    RaceSummary {
        car_id: plan.car.id.clone(),
        track_id: plan.track.id.clone(),
        strategy: plan.strategy,
        seed: plan.seed,
        finished: final_state.race_finished,
        finish_reason: final_state.finish_reason,
        laps_completed,
        turns: final_state.turns_taken,
        pit_stops: final_state.pit_stops,
        total_distance: final_state.total_distance,
        elapsed_time: final_state.elapsed_time,
        fuel_left: final_state.current_fuel,
        final_state,
        turn_log,
        errors,
    }
}
