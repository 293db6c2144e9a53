//! Line-oriented driver for a single race: one command per turn from a reader,
//! status lines to a writer.

use anyhow::Result;
use log::info;
use pitwall_game::{RaceEngine, RaceSnapshot, TurnAction};
use std::io::{BufRead, Write};

use crate::util::{PROGRESS_BAR_WIDTH, progress_bar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Turn(TurnAction),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "s" | "speed" | "speed_up" => Some(Command::Turn(TurnAction::SpeedUp)),
        "m" | "maintain" => Some(Command::Turn(TurnAction::MaintainSpeed)),
        "p" | "pit" | "pit_stop" => Some(Command::Turn(TurnAction::PitStop)),
        "?" | "h" | "help" => Some(Command::Help),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

/// One status line for the current race state.
#[must_use]
pub fn status_line(snapshot: &RaceSnapshot) -> String {
    format!(
        "Lap {}/{} {} {:>5.1}% | Speed {:>6.1}/{:.0} | Fuel {:>7.3}/{:.0} | Time left {:>6.1}",
        snapshot.current_lap.min(snapshot.total_laps),
        snapshot.total_laps,
        progress_bar(snapshot.lap_progress_percent, PROGRESS_BAR_WIDTH),
        snapshot.lap_progress_percent,
        snapshot.current_speed,
        snapshot.max_speed,
        snapshot.current_fuel,
        snapshot.max_fuel_capacity,
        snapshot.time_remaining
    )
}

fn write_help<W: Write + ?Sized>(out: &mut W) -> std::io::Result<()> {
    writeln!(
        out,
        "Commands: [s]peed up, [m]aintain speed, [p]it stop, [q]uit, ? for help"
    )
}

/// Play `engine` from `input` until the race ends, the user quits, or input runs out.
///
/// Rejected commands are reported and leave the race untouched.
///
/// # Errors
///
/// Returns an error when reading input or writing output fails.
pub fn play<R: BufRead, W: Write + ?Sized>(
    engine: &mut RaceEngine,
    input: R,
    out: &mut W,
) -> Result<RaceSnapshot> {
    let snapshot = engine.snapshot();
    writeln!(
        out,
        "{} ({}) on {}: {} laps of {:.2}",
        snapshot.car_name,
        snapshot.car_category,
        snapshot.track_name.as_deref().unwrap_or("unnamed track"),
        snapshot.total_laps,
        snapshot.lap_length
    )?;
    write_help(out)?;
    writeln!(out, "{}", status_line(&snapshot))?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Some(Command::Turn(action)) => match engine.execute_turn(action) {
                Ok(()) => writeln!(out, "{action}: {}", status_line(&engine.snapshot()))?,
                Err(err) => writeln!(out, "Cannot {action}: {err}")?,
            },
            Some(Command::Help) => write_help(out)?,
            Some(Command::Quit) => {
                info!("driver retired after {} turns", engine.turns_taken());
                writeln!(out, "Retired after {} turns.", engine.turns_taken())?;
                break;
            }
            None => writeln!(out, "Unknown command '{}'", line.trim())?,
        }
        if engine.race_finished() {
            break;
        }
    }

    let final_state = engine.snapshot();
    if let Some(reason) = final_state.finish_reason {
        writeln!(
            out,
            "Race over ({reason}) after {} turns, {} pit stops, {:.2} distance.",
            final_state.turns_taken, final_state.pit_stops, final_state.total_distance
        )?;
    }
    out.flush()?;
    Ok(final_state)
}
