use std::fmt;

use pitwall_game::{RaceEngine, TurnAction};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Decision returned by a [`DriverPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub action: TurnAction,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(action: TurnAction, rationale: Option<String>) -> Self {
        Self { action, rationale }
    }
}

/// Policy interface for automated drivers.
pub trait DriverPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick the action for the next turn.
    fn choose(&mut self, engine: &RaceEngine) -> PolicyDecision;
}

/// Built-in driving strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStrategy {
    Cautious,
    Aggressive,
    Balanced,
    Random,
}

impl DriverStrategy {
    pub const ALL: [Self; 4] = [
        Self::Cautious,
        Self::Aggressive,
        Self::Balanced,
        Self::Random,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Aggressive => "Aggressive",
            Self::Balanced => "Balanced",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "cautious" => Some(Self::Cautious),
            "aggressive" => Some(Self::Aggressive),
            "balanced" => Some(Self::Balanced),
            "random" => Some(Self::Random),
            _ => None,
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn DriverPolicy + Send> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Aggressive => Box::new(AggressivePolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for DriverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const CAUTIOUS_SPEED_RATIO: f64 = 0.75;
const CAUTIOUS_PIT_FUEL_RATIO: f64 = 0.35;
const BALANCED_RESERVE_TURNS: f64 = 3.0;

struct CautiousPolicy;
struct AggressivePolicy;
struct BalancedPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

/// Fuel the next turn would burn if `action` were taken.
#[must_use]
pub fn projected_burn(engine: &RaceEngine, action: TurnAction) -> f64 {
    match action {
        TurnAction::PitStop => 0.0,
        TurnAction::MaintainSpeed => engine.fuel_for_next_turn(),
        TurnAction::SpeedUp => {
            let mut probe = engine.vehicle().clone();
            probe.speed_up(engine.config().speed_up.increment_for(probe.max_speed()));
            probe.fuel_needed(engine.config().distance_per_turn(probe.current_speed()))
        }
    }
}

/// Drive when the tank covers the turn, otherwise pit.
fn drive_or_pit(engine: &RaceEngine, action: TurnAction) -> PolicyDecision {
    let burn = projected_burn(engine, action);
    if burn > engine.current_fuel() && engine.vehicle().fuel_to_full() > 0.0 {
        return PolicyDecision::new(
            TurnAction::PitStop,
            Some(format!("needs {burn:.3} fuel, has {:.3}", engine.current_fuel())),
        );
    }
    PolicyDecision::new(action, None)
}

impl DriverPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn choose(&mut self, engine: &RaceEngine) -> PolicyDecision {
        let fuel_ratio = engine.vehicle().fuel_ratio();
        if fuel_ratio < CAUTIOUS_PIT_FUEL_RATIO {
            return PolicyDecision::new(
                TurnAction::PitStop,
                Some(format!("fuel at {:.0}%", fuel_ratio * 100.0)),
            );
        }
        let action = if engine.vehicle().speed_ratio() < CAUTIOUS_SPEED_RATIO {
            TurnAction::SpeedUp
        } else {
            TurnAction::MaintainSpeed
        };
        drive_or_pit(engine, action)
    }
}

impl DriverPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "Aggressive"
    }

    fn choose(&mut self, engine: &RaceEngine) -> PolicyDecision {
        let action = if engine.current_speed() < engine.max_speed() {
            TurnAction::SpeedUp
        } else {
            TurnAction::MaintainSpeed
        };
        drive_or_pit(engine, action)
    }
}

impl DriverPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn choose(&mut self, engine: &RaceEngine) -> PolicyDecision {
        let action = if engine.current_speed() < engine.max_speed() {
            TurnAction::SpeedUp
        } else {
            TurnAction::MaintainSpeed
        };
        let reserve = projected_burn(engine, action) * BALANCED_RESERVE_TURNS;
        if reserve > engine.current_fuel() && engine.vehicle().fuel_to_full() > 0.0 {
            return PolicyDecision::new(
                TurnAction::PitStop,
                Some(format!("reserve {reserve:.3} above tank")),
            );
        }
        PolicyDecision::new(action, None)
    }
}

impl DriverPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn choose(&mut self, engine: &RaceEngine) -> PolicyDecision {
        let roll = self.rng.gen_range(0..100_u32);
        let action = match roll {
            0..=44 => TurnAction::SpeedUp,
            45..=89 => TurnAction::MaintainSpeed,
            _ if engine.vehicle().fuel_to_full() > 0.0 => TurnAction::PitStop,
            _ => TurnAction::MaintainSpeed,
        };
        PolicyDecision::new(action, Some(format!("roll {roll}")))
    }
}
