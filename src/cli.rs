use std::io;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::analysis::{max_deviation, tally_outcomes, BattleAnalysis, OutcomeRow, SimulationPlan};
use crate::combat::catalog::StateId;
use crate::combat::duel::Duel;
use crate::combat::exciting::ExcitingBattle;
use crate::combat::scenario::Battle;
use crate::config::AnalysisConfig;
use crate::markov::rational::{round_to, to_f64, zero};

const USAGE: &str = "usage: spacebattle <matrix|solve|simulate|validate> <duel|exciting> \
[--table|--csv] [state] [trials] [seed] [--config <path>]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Matrix,
    Solve,
    Simulate,
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Duel,
    Exciting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixFormat {
    Json,
    Table,
    Csv,
}

/// Arguments after flags are pulled out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub scenario: Scenario,
    pub format: MatrixFormat,
    pub config_path: Option<PathBuf>,
    pub positional: Vec<String>,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("matrix") => Some(Command::Matrix),
        Some("solve") => Some(Command::Solve),
        Some("simulate") => Some(Command::Simulate),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn parse_scenario(raw: Option<&str>) -> Option<Scenario> {
    match raw {
        Some("duel") => Some(Scenario::Duel),
        Some("exciting") => Some(Scenario::Exciting),
        _ => None,
    }
}

/// `None` on any usage error.
pub fn parse_invocation(args: &[String]) -> Option<Invocation> {
    let command = parse_command(args)?;
    let mut format = MatrixFormat::Json;
    let mut config_path = None;
    let mut rest = Vec::new();

    let mut iter = args.iter().skip(2);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--table" => format = MatrixFormat::Table,
            "--csv" => format = MatrixFormat::Csv,
            "--config" => config_path = Some(PathBuf::from(iter.next()?)),
            flag if flag.starts_with("--") => return None,
            _ => rest.push(arg.clone()),
        }
    }

    let mut rest = rest.into_iter();
    let scenario = parse_scenario(rest.next().as_deref())?;
    Some(Invocation {
        command,
        scenario,
        format,
        config_path,
        positional: rest.collect(),
    })
}

pub fn run_with_args(args: &[String]) -> i32 {
    let Some(invocation) = parse_invocation(args) else {
        eprintln!("{USAGE}");
        return 2;
    };

    let config = match AnalysisConfig::load(invocation.config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return 1;
        }
    };

    let result = match invocation.scenario {
        Scenario::Duel => Duel::new().map(|battle| dispatch(&battle, &invocation, &config)),
        Scenario::Exciting => ExcitingBattle::new().map(|battle| dispatch(&battle, &invocation, &config)),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            error!(%err, "failed to build battle");
            eprintln!("battle error: {err}");
            1
        }
    }
}

fn dispatch<B: Battle>(battle: &B, invocation: &Invocation, config: &AnalysisConfig) -> i32 {
    match invocation.command {
        Command::Matrix => handle_matrix(battle, invocation.format),
        Command::Solve => handle_solve(battle),
        Command::Simulate => handle_simulate(battle, &invocation.positional, config),
        Command::Validate => handle_validate(battle),
    }
}

fn print_json<T: Serialize>(value: &T, what: &str) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize {what}: {err}");
            1
        }
    }
}

fn handle_matrix<B: Battle>(battle: &B, format: MatrixFormat) -> i32 {
    let p = match battle.transition_matrix() {
        Ok(p) => p,
        Err(err) => {
            eprintln!("transition matrix failed: {err}");
            return 1;
        }
    };

    match format {
        MatrixFormat::Json => print_json(
            &json!({
                "battle": battle.name(),
                "states": p.rows(),
                "transient": battle.transient_count(),
                "p": p.to_string_rows(),
            }),
            "transition matrix",
        ),
        MatrixFormat::Table => {
            let header: Vec<String> = (1..=p.cols()).map(|s| format!("{s:>8}")).collect();
            println!("state\t{}", header.join(""));
            for (row, values) in p.to_f64_rows().iter().enumerate() {
                let cells: Vec<String> = values.iter().map(|v| format!("{:>8.4}", round_to(*v, 4))).collect();
                println!("{}\t{}", row + 1, cells.join(""));
            }
            0
        }
        MatrixFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            let header: Vec<String> = std::iter::once("state".to_string())
                .chain((1..=p.cols()).map(|s| s.to_string()))
                .collect();
            let mut result = writer.write_record(&header);
            for (row, values) in p.to_string_rows().into_iter().enumerate() {
                if result.is_err() {
                    break;
                }
                let record: Vec<String> = std::iter::once((row + 1).to_string()).chain(values).collect();
                result = writer.write_record(&record);
            }
            match result.and_then(|()| writer.flush().map_err(csv::Error::from)) {
                Ok(()) => 0,
                Err(err) => {
                    eprintln!("failed to write csv: {err}");
                    1
                }
            }
        }
    }
}

fn handle_solve<B: Battle>(battle: &B) -> i32 {
    match BattleAnalysis::analyze(battle) {
        Ok(analysis) => print_json(&analysis.report(), "solve report"),
        Err(err) => {
            eprintln!("solve failed: {err}");
            1
        }
    }
}

#[derive(Debug, Serialize)]
struct SimulateReport {
    battle: &'static str,
    start: StateId,
    trials: usize,
    seed: u64,
    outcomes: Vec<OutcomeRow>,
    mean_rounds: f64,
    expected_rounds: f64,
    max_deviation: f64,
}

fn handle_simulate<B: Battle>(battle: &B, positional: &[String], config: &AnalysisConfig) -> i32 {
    let parsed = (
        parse_arg::<usize>(positional.first(), "state", 1),
        parse_arg::<usize>(positional.get(1), "trials", config.trials),
    );
    let (Some(start), Some(trials)) = parsed else {
        eprintln!("{USAGE}");
        return 2;
    };
    let Some(start) = StateId::new(start) else {
        eprintln!("state must be at least 1");
        return 2;
    };
    let seed = match positional.get(2) {
        Some(raw) => match parse_arg::<u64>(Some(raw), "seed", 0) {
            Some(seed) => seed,
            None => {
                eprintln!("{USAGE}");
                return 2;
            }
        },
        None => config.resolve_seed(),
    };
    let plan = SimulationPlan {
        trials,
        ..SimulationPlan::from_config(config, seed)
    };
    if let Err(err) = plan.check() {
        eprintln!("invalid simulation: {err}");
        return 2;
    }
    info!(battle = battle.name(), %start, trials, seed, "simulating");

    let analysis = match BattleAnalysis::analyze(battle) {
        Ok(analysis) => analysis,
        Err(err) => {
            eprintln!("solve failed: {err}");
            return 1;
        }
    };
    let (exact, expected_rounds) = match (
        analysis.outcome_distribution(start),
        analysis.expected_rounds_from(start),
    ) {
        (Ok(exact), Ok(rounds)) => (exact, rounds),
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("invalid start state: {err}");
            return 1;
        }
    };
    let tally = match tally_outcomes(battle, start, &plan) {
        Ok(tally) => tally,
        Err(err) => {
            eprintln!("simulation failed: {err}");
            return 1;
        }
    };

    let observed = tally.frequencies();
    let mut states: Vec<StateId> = exact.keys().chain(observed.keys()).copied().collect();
    states.sort();
    states.dedup();
    let outcomes = states
        .into_iter()
        .map(|state| {
            let p = exact.get(&state).cloned().unwrap_or_else(zero);
            OutcomeRow {
                state,
                exact: p.to_string(),
                exact_approx: to_f64(&p),
                observed: observed.get(&state).copied().unwrap_or(0.0),
            }
        })
        .collect();

    print_json(
        &SimulateReport {
            battle: battle.name(),
            start,
            trials,
            seed,
            outcomes,
            mean_rounds: tally.mean_rounds(),
            expected_rounds,
            max_deviation: max_deviation(&observed, &exact),
        },
        "simulation report",
    )
}

fn handle_validate<B: Battle>(battle: &B) -> i32 {
    let mut issues = Vec::new();
    if !battle.catalog().covers_exactly(battle.damage_space()) {
        issues.push("state catalog does not partition the damage space".to_string());
    }
    for state in battle.catalog().states() {
        if let Err(err) = battle.transition_distribution(state) {
            issues.push(format!("state {state}: {err}"));
        }
    }
    if issues.is_empty() {
        if let Err(err) = BattleAnalysis::analyze(battle) {
            issues.push(format!("absorbing chain: {err}"));
        }
    }

    if issues.is_empty() {
        println!("validation passed: {} ({} states)", battle.name(), battle.state_count());
        0
    } else {
        eprintln!("validation failed: {} issue(s)", issues.len());
        for issue in issues {
            eprintln!("- {issue}");
        }
        1
    }
}

/// `default` when the argument is absent, `None` when it is malformed.
fn parse_arg<T: std::str::FromStr>(raw: Option<&String>, name: &str, default: T) -> Option<T> {
    match raw {
        None => Some(default),
        Some(value) => match value.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                eprintln!("invalid {name} '{value}'");
                None
            }
        },
    }
}
