use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use pitwall_game::RaceConfig;
use pitwall_game::numbers::usize_to_f64;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::policy::DriverStrategy;
use super::runner::RaceSummary;

/// Per-strategy rollup across every car, track, and seed it raced.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyAggregate {
    pub strategy: DriverStrategy,
    pub races: usize,
    pub laps_completed_races: usize,
    pub unfinished: usize,
    pub mean_turns: f64,
    pub mean_pit_stops: f64,
    pub mean_distance: f64,
}

#[must_use]
pub fn aggregate_by_strategy(results: &[RaceSummary]) -> Vec<StrategyAggregate> {
    DriverStrategy::ALL
        .iter()
        .filter_map(|&strategy| {
            let races: Vec<&RaceSummary> =
                results.iter().filter(|r| r.strategy == strategy).collect();
            if races.is_empty() {
                return None;
            }
            let count = usize_to_f64(races.len());
            let mean = |f: fn(&RaceSummary) -> f64| races.iter().map(|r| f(r)).sum::<f64>() / count;
            Some(StrategyAggregate {
                strategy,
                races: races.len(),
                laps_completed_races: races.iter().filter(|r| r.completed_distance()).count(),
                unfinished: races.iter().filter(|r| !r.finished).count(),
                mean_turns: mean(|r| f64::from(r.turns)),
                mean_pit_stops: mean(|r| f64::from(r.pit_stops)),
                mean_distance: mean(|r| r.total_distance),
            })
        })
        .collect()
}

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[RaceSummary],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "🏁 Race Results Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "=======================".cyan())?;

    let total = results.len();
    let flagged = results.iter().filter(|r| r.completed_distance()).count();
    let unfinished = results.iter().filter(|r| !r.finished).count();
    writeln!(writer, "Total races: {total}")?;
    writeln!(writer, "Laps completed: {}", flagged.to_string().green())?;
    writeln!(
        writer,
        "Stopped early: {}",
        (total - flagged - unfinished).to_string().yellow()
    )?;
    writeln!(writer, "Hit turn cap: {}", unfinished.to_string().red())?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for result in results {
        let status = if result.completed_distance() {
            "✅ FLAG".green()
        } else if result.finished {
            "⚠️  OUT ".yellow()
        } else {
            "❌ CAP ".red()
        };
        writeln!(
            writer,
            "{} {} on {} ({}, seed {})",
            status,
            result.car_id.bold(),
            result.track_id.bold(),
            result.strategy,
            result.seed
        )?;
        writeln!(
            writer,
            "   {}: {}/{} laps in {} turns, {} pit stops, {:.2} distance, {:.3} fuel left",
            result.outcome_label(),
            result.laps_completed,
            result.final_state.total_laps,
            result.turns,
            result.pit_stops,
            result.total_distance,
            result.fuel_left
        )?;
        for error in &result.errors {
            writeln!(writer, "     • {}", error.red())?;
        }
    }

    let aggregates = aggregate_by_strategy(results);
    if !aggregates.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", "📈 Strategy Summary".bright_yellow().bold())?;
        writeln!(writer, "{}", "===================".yellow())?;
        for agg in &aggregates {
            writeln!(
                writer,
                "{:<10} races {:>3} | flagged {:>3} | capped {:>3} | turns {:>6.1} | pits {:>4.1} | distance {:>7.2}",
                agg.strategy.label(),
                agg.races,
                agg.laps_completed_races,
                agg.unfinished,
                agg.mean_turns,
                agg.mean_pit_stops,
                agg.mean_distance
            )?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    config: &'a RaceConfig,
    aggregates: Vec<StrategyAggregate>,
    races: &'a [RaceSummary],
}

pub fn generate_json_report<W: Write + ?Sized>(
    writer: &mut W,
    config: &RaceConfig,
    results: &[RaceSummary],
) -> Result<()> {
    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        config,
        aggregates: aggregate_by_strategy(results),
        races: results,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[RaceSummary],
) -> Result<()> {
    writeln!(writer, "# Pitwall Race Results\n")?;

    let total = results.len();
    let flagged = results.iter().filter(|r| r.completed_distance()).count();
    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Total races**: {total}")?;
    writeln!(writer, "- **Laps completed**: {flagged}")?;
    writeln!(
        writer,
        "- **Hit turn cap**: {}\n",
        results.iter().filter(|r| !r.finished).count()
    )?;

    writeln!(writer, "## Races\n")?;
    writeln!(
        writer,
        "| Car | Track | Strategy | Seed | Outcome | Laps | Turns | Pits | Distance | Fuel left |"
    )?;
    writeln!(
        writer,
        "|-----|-------|----------|------|---------|------|-------|------|----------|-----------|"
    )?;
    for r in results {
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} | {}/{} | {} | {} | {:.2} | {:.3} |",
            r.car_id,
            r.track_id,
            r.strategy,
            r.seed,
            r.outcome_label(),
            r.laps_completed,
            r.final_state.total_laps,
            r.turns,
            r.pit_stops,
            r.total_distance,
            r.fuel_left
        )?;
    }
    Ok(())
}

pub fn generate_csv_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[RaceSummary],
) -> Result<()> {
    writeln!(
        writer,
        "car,track,strategy,seed,finished,outcome,laps_completed,total_laps,turns,pit_stops,total_distance,elapsed_time,fuel_left"
    )?;
    for r in results {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{:.4},{:.1},{:.4}",
            r.car_id,
            r.track_id,
            r.strategy.label(),
            r.seed,
            r.finished,
            r.outcome_label(),
            r.laps_completed,
            r.final_state.total_laps,
            r.turns,
            r.pit_stops,
            r.total_distance,
            r.elapsed_time,
            r.fuel_left
        )?;
    }
    Ok(())
}
