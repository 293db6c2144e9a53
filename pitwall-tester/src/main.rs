mod logic;
mod util;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::info;
use pitwall_game::{Catalog, LapRule, RaceConfig, RaceEngine};
use std::fs::File;
use std::io::{BufWriter, Write, stdin, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{DEFAULT_MAX_TURNS, DriverStrategy, RacePlan, RaceSummary, run_race};
use util::split_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Race every car/track/strategy combination with automated drivers
    Auto,
    /// Drive one race yourself from stdin
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LapRuleArg {
    /// Finish once the lap counter passes the lap count
    Strict,
    /// Finish as soon as the lap counter reaches the lap count
    Inclusive,
}

impl From<LapRuleArg> for LapRule {
    fn from(value: LapRuleArg) -> Self {
        match value {
            LapRuleArg::Strict => Self::Strict,
            LapRuleArg::Inclusive => Self::Inclusive,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "pitwall-tester", version = "0.1.0")]
#[command(about = "Race simulator driver: automated strategy sweeps or an interactive race")]
struct Args {
    /// Run mode: auto (strategy sweep) or interactive (stdin driver)
    #[arg(long, value_enum, default_value_t = RunMode::Auto)]
    mode: RunMode,

    /// Car presets to race (comma-separated ids or "all")
    #[arg(long, default_value = "all")]
    cars: String,

    /// Track presets to race on (comma-separated ids or "all")
    #[arg(long, default_value = "all")]
    tracks: String,

    /// Driver strategies (comma-separated or "all")
    #[arg(long, default_value = "all")]
    strategies: String,

    /// Seeds for the random strategy (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Safety cap on turns per automated race
    #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
    max_turns: u32,

    /// List car and track presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Race config JSON file; the flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Time units consumed by each driving turn
    #[arg(long)]
    time_step: Option<f64>,

    /// Time units consumed by a pit stop
    #[arg(long)]
    pit_cost: Option<f64>,

    /// Total time units available for the race
    #[arg(long)]
    time_budget: Option<f64>,

    /// When the final lap counts as complete
    #[arg(long, value_enum)]
    lap_rule: Option<LapRuleArg>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output (debug-level engine logs)
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let catalog = Catalog::load_from_static();

    if maybe_list_presets(&args, &catalog)? {
        return Ok(());
    }

    let config = resolve_config(&args)?;

    if args.mode == RunMode::Interactive {
        return run_interactive(&args, &catalog, config);
    }

    if args.report == "console" {
        announce_banner();
    }
    let start_time = Instant::now();
    let plans = build_plans(&args, &catalog, &config)?;
    info!("running {} races", plans.len());
    let results = plans
        .iter()
        .map(run_race)
        .collect::<Result<Vec<RaceSummary>>>()?;

    write_reports(&args, &config, &results, start_time)?;

    if results.iter().any(|r| !r.finished) {
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn announce_banner() {
    println!("{}", "🏎️  Pitwall Race Tester".bright_cyan().bold());
    println!("{}", "=======================".cyan());
}

fn maybe_list_presets(args: &Args, catalog: &Catalog) -> Result<bool> {
    if !args.list_presets {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available cars:")?;
    for car in &catalog.cars {
        writeln!(
            output_target.writer(),
            "  {:15} - {} ({}, tank {}, burn {}/unit, top speed {})",
            car.id,
            car.name,
            car.category,
            car.max_fuel_capacity,
            car.fuel_consumption_per_unit,
            car.max_speed
        )?;
    }
    writeln!(output_target.writer(), "Available tracks:")?;
    for track in &catalog.tracks {
        writeln!(
            output_target.writer(),
            "  {:15} - {} ({} laps x {})",
            track.id,
            track.name,
            track.total_laps,
            track.lap_length
        )?;
    }
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in DriverStrategy::ALL {
        writeln!(output_target.writer(), "  {}", strategy.label().to_lowercase())?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn resolve_config(args: &Args) -> Result<RaceConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            RaceConfig::from_json(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => RaceConfig::default(),
    };
    if let Some(time_step) = args.time_step {
        config.time_step = time_step;
    }
    if let Some(pit_cost) = args.pit_cost {
        config.pit_stop_time_cost = pit_cost;
    }
    if let Some(budget) = args.time_budget {
        config.race_time_budget = budget;
    }
    if let Some(rule) = args.lap_rule {
        config.lap_rule = rule.into();
    }
    config.validate().context("invalid race config")?;
    Ok(config)
}

fn expand_ids<'a>(
    arg: &str,
    known: impl Iterator<Item = &'a str>,
    kind: &str,
) -> Result<Vec<String>> {
    let known: Vec<&str> = known.collect();
    let requested = split_csv(arg);
    if requested.iter().any(|id| id == "all") {
        return Ok(known.iter().map(ToString::to_string).collect());
    }
    for id in &requested {
        if !known.contains(&id.as_str()) {
            bail!("unknown {kind} '{id}' (known: {})", known.join(", "));
        }
    }
    if requested.is_empty() {
        bail!("no {kind} selected");
    }
    Ok(requested)
}

fn expand_strategies(arg: &str) -> Result<Vec<DriverStrategy>> {
    let tokens = split_csv(arg);
    if tokens.iter().any(|t| t == "all") {
        return Ok(DriverStrategy::ALL.to_vec());
    }
    let strategies = tokens
        .iter()
        .map(|t| DriverStrategy::parse(t).with_context(|| format!("unknown strategy '{t}'")))
        .collect::<Result<Vec<_>>>()?;
    if strategies.is_empty() {
        bail!("no strategy selected");
    }
    Ok(strategies)
}

fn parse_seeds(arg: &str) -> Result<Vec<u64>> {
    let seeds = split_csv(arg)
        .iter()
        .map(|s| s.parse::<u64>().with_context(|| format!("invalid seed '{s}'")))
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        bail!("no seed given");
    }
    Ok(seeds)
}

/// Every car x track x strategy combination. Only the random strategy fans
/// out across seeds; the others are deterministic and run once.
fn build_plans(args: &Args, catalog: &Catalog, config: &RaceConfig) -> Result<Vec<RacePlan>> {
    let cars = expand_ids(&args.cars, catalog.car_ids(), "car")?;
    let tracks = expand_ids(&args.tracks, catalog.track_ids(), "track")?;
    let strategies = expand_strategies(&args.strategies)?;
    let seeds = parse_seeds(&args.seeds)?;

    let mut plans = Vec::new();
    for car_id in &cars {
        let car = catalog.car(car_id).with_context(|| format!("car '{car_id}'"))?;
        for track_id in &tracks {
            let track = catalog
                .track(track_id)
                .with_context(|| format!("track '{track_id}'"))?;
            for &strategy in &strategies {
                let strategy_seeds = if strategy == DriverStrategy::Random {
                    &seeds[..]
                } else {
                    &seeds[..1]
                };
                for &seed in strategy_seeds {
                    plans.push(
                        RacePlan::new(car.clone(), track.clone(), strategy, seed)
                            .with_config(config.clone())
                            .with_max_turns(args.max_turns),
                    );
                }
            }
        }
    }
    Ok(plans)
}

fn run_interactive(args: &Args, catalog: &Catalog, config: RaceConfig) -> Result<()> {
    let car_id = expand_ids(&args.cars, catalog.car_ids(), "car")?
        .into_iter()
        .next()
        .context("no car presets available")?;
    let track_id = expand_ids(&args.tracks, catalog.track_ids(), "track")?
        .into_iter()
        .next()
        .context("no track presets available")?;
    let car = catalog.car(&car_id).with_context(|| format!("car '{car_id}'"))?;
    let track = catalog
        .track(&track_id)
        .with_context(|| format!("track '{track_id}'"))?;
    let mut engine = RaceEngine::new(car.build()?, track.build()?, config)?;

    let mut output_target = OutputTarget::new(args.output.clone())?;
    let final_state = logic::interactive::play(&mut engine, stdin().lock(), &mut output_target)?;
    info!(
        "interactive race ended after {} turns (finished: {})",
        final_state.turns_taken, final_state.race_finished
    );
    Ok(())
}

fn write_reports(
    args: &Args,
    config: &RaceConfig,
    results: &[RaceSummary],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, config, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Pitwall Race Results\n\n_No races executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        "csv" => logic::reports::generate_csv_report(&mut output_target, results)?,
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No races executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            mode: RunMode::Auto,
            cars: "speedster".to_string(),
            tracks: "sprint_oval".to_string(),
            strategies: "all".to_string(),
            seeds: "1337".to_string(),
            max_turns: DEFAULT_MAX_TURNS,
            list_presets: false,
            config: None,
            time_step: None,
            pit_cost: None,
            time_budget: None,
            lap_rule: None,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pitwall-{}-{name}", std::process::id()))
    }

    fn sample_results(args: &Args) -> Vec<RaceSummary> {
        let catalog = Catalog::load_from_static();
        let config = resolve_config(args).unwrap();
        build_plans(args, &catalog, &config)
            .unwrap()
            .iter()
            .map(|plan| run_race(plan).unwrap())
            .collect()
    }

    #[test]
    fn expands_all_keyword_for_ids() {
        let catalog = Catalog::load_from_static();
        let cars = expand_ids("all", catalog.car_ids(), "car").unwrap();
        assert_eq!(cars, vec!["speedster", "eco_racer", "heavyweight"]);
        assert!(expand_ids("speedster,bogus", catalog.car_ids(), "car").is_err());
        assert!(expand_ids(" , ", catalog.car_ids(), "car").is_err());
    }

    #[test]
    fn expands_strategies_and_seeds() {
        assert_eq!(expand_strategies("all").unwrap().len(), 4);
        assert_eq!(
            expand_strategies("balanced, random").unwrap(),
            vec![DriverStrategy::Balanced, DriverStrategy::Random]
        );
        assert!(expand_strategies("reckless").is_err());
        assert_eq!(parse_seeds("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_seeds("x").is_err());
    }

    #[test]
    fn only_random_strategy_fans_out_over_seeds() {
        let args = Args {
            seeds: "1,2,3".to_string(),
            ..base_args()
        };
        let catalog = Catalog::load_from_static();
        let plans = build_plans(&args, &catalog, &RaceConfig::default()).unwrap();
        assert_eq!(plans.len(), 3 + 3);
        assert_eq!(
            plans
                .iter()
                .filter(|p| p.strategy == DriverStrategy::Random)
                .count(),
            3
        );
    }

    #[test]
    fn config_flags_override_defaults() {
        let args = Args {
            time_step: Some(60.0),
            pit_cost: Some(45.0),
            time_budget: Some(600.0),
            lap_rule: Some(LapRuleArg::Inclusive),
            ..base_args()
        };
        let config = resolve_config(&args).unwrap();
        assert!((config.time_step - 60.0).abs() < f64::EPSILON);
        assert!((config.pit_stop_time_cost - 45.0).abs() < f64::EPSILON);
        assert!((config.race_time_budget - 600.0).abs() < f64::EPSILON);
        assert_eq!(config.lap_rule, LapRule::Inclusive);
    }

    #[test]
    fn config_file_is_loaded_then_overridden() {
        let path = temp_path("config.json");
        std::fs::write(&path, r#"{"time_step": 30.0, "pit_stop_time_cost": 5.0}"#).unwrap();
        let args = Args {
            config: Some(path),
            pit_cost: Some(12.0),
            ..base_args()
        };
        let config = resolve_config(&args).unwrap();
        assert!((config.time_step - 30.0).abs() < f64::EPSILON);
        assert!((config.pit_stop_time_cost - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let args = Args {
            time_step: Some(0.0),
            ..base_args()
        };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn maybe_list_presets_writes_output() {
        let temp = temp_path("presets.txt");
        let args = Args {
            list_presets: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_presets(&args, &Catalog::load_from_static()).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available cars"));
        assert!(content.contains("grand_prix"));
        assert!(content.contains("balanced"));
    }

    #[test]
    fn maybe_list_presets_returns_false_when_disabled() {
        assert!(!maybe_list_presets(&base_args(), &Catalog::load_from_static()).unwrap());
    }

    #[test]
    fn write_reports_emits_json_output() {
        let temp = temp_path("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        let results = sample_results(&args);
        write_reports(&args, &RaceConfig::default(), &results, Instant::now()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(temp).unwrap()).unwrap();
        assert_eq!(value["races"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_path("report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &RaceConfig::default(), &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("No races executed"));
    }

    #[test]
    fn write_reports_emits_console_and_csv() {
        let args = base_args();
        let results = sample_results(&args);

        let console = temp_path("report.txt");
        let console_args = Args {
            report: "console".to_string(),
            output: Some(console.clone()),
            ..base_args()
        };
        write_reports(&console_args, &RaceConfig::default(), &results, Instant::now()).unwrap();
        let content = std::fs::read_to_string(console).unwrap();
        assert!(content.contains("Race Results Summary"));
        assert!(content.contains("Total time"));

        let csv = temp_path("report.csv");
        let csv_args = Args {
            report: "csv".to_string(),
            output: Some(csv.clone()),
            ..base_args()
        };
        write_reports(&csv_args, &RaceConfig::default(), &results, Instant::now()).unwrap();
        let content = std::fs::read_to_string(csv).unwrap();
        assert!(content.starts_with("car,track,strategy"));
        assert!(content.contains("speedster,sprint_oval"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
