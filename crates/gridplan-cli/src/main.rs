//! CLI for gridplan.
//!
//! `solve` runs policy iteration on an environment file and prints the
//! progress of every round together with the extracted path, or a JSON
//! report. `check` only validates the file.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use gridplan_core::{Environment, EnvironmentConfig, Placement, Position};
use gridplan_solver::{HistoryObserver, PolicyIteration, SolveReport, SolverSettings};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an environment file with policy iteration
    Solve(SolveArgs),
    /// Validate an environment file and print a summary
    Check {
        /// Environment file
        config: PathBuf,
    },
}

#[derive(clap::Args)]
struct SolveArgs {
    /// Environment file
    config: PathBuf,

    /// Discount factor (default: 0.9)
    #[arg(long, allow_negative_numbers = true)]
    discount: Option<f64>,

    /// Fixed value of the goal cell (default: 200.0)
    #[arg(long, allow_negative_numbers = true)]
    terminal_value: Option<f64>,

    /// Give up after this many evaluate/improve rounds (default: 100)
    #[arg(long)]
    max_iterations: Option<usize>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

impl SolveArgs {
    fn settings(&self) -> SolverSettings {
        let mut settings = SolverSettings::default();
        if let Some(discount) = self.discount {
            settings = settings.with_discount(discount);
        }
        if let Some(terminal_value) = self.terminal_value {
            settings = settings.with_terminal_value(terminal_value);
        }
        if let Some(max_iterations) = self.max_iterations {
            settings = settings.with_max_iterations(max_iterations);
        }
        settings
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load(path: &Path) -> Result<(EnvironmentConfig, Environment)> {
    let config = EnvironmentConfig::from_path(path)
        .with_context(|| format!("Failed to load environment from {}", path.display()))?;
    let env = Environment::from_config(&config)
        .with_context(|| format!("Invalid environment in {}", path.display()))?;
    info!(
        path = %path.display(),
        rows = env.rows(),
        cols = env.cols(),
        obstacles = env.obstacles().len(),
        "loaded environment"
    );
    Ok((config, env))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) => {
            let file =
                File::create(p).with_context(|| format!("Failed to create {}", p.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn solve(args: &SolveArgs) -> Result<()> {
    let (_, env) = load(&args.config)?;
    let settings = args.settings();
    debug!(?settings, "solver settings");

    let failed = || format!("Cannot solve {}", args.config.display());
    let mut solver = PolicyIteration::new(Rc::new(env), settings).with_context(failed)?;
    let mut history = HistoryObserver::default();
    let outcome = solver.run(&mut history);

    match args.format {
        Format::Text => {
            let mut out = open_output(args.output.as_deref())?;
            write_progress(&mut out, &history)?;
            out.flush()?;
            let path = outcome.with_context(failed)?;
            write_solution(&mut out, &solver, &path)?;
            out.flush()?;
        }
        Format::Json => {
            let path = outcome.with_context(failed)?;
            let mut out = open_output(args.output.as_deref())?;
            SolveReport::new(&solver, &history, &path)
                .write_json(&mut out)
                .context("Failed to write report")?;
            out.flush()?;
        }
    }
    Ok(())
}

fn write_progress(out: &mut dyn Write, history: &HistoryObserver) -> io::Result<()> {
    for row in &history.iterations {
        writeln!(
            out,
            "iteration {}: sweeps={} delta={:.6} changed={}",
            row.iteration, row.sweeps, row.final_delta, row.policy_changes
        )?;
    }
    Ok(())
}

fn write_solution(
    out: &mut dyn Write,
    solver: &PolicyIteration,
    path: &[Position],
) -> io::Result<()> {
    writeln!(out, "converged after {} iterations", solver.iterations())?;
    let cells: Vec<String> = path.iter().map(ToString::to_string).collect();
    writeln!(
        out,
        "path ({} steps): {}",
        path.len().saturating_sub(1),
        cells.join(" -> ")
    )?;
    writeln!(out, "return: {:.2}", solver.path_return(path))?;
    for line in render_policy(solver) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// One string per grid row: `G` goal, `#` obstacle, otherwise the policy's
/// arrow.
fn render_policy(solver: &PolicyIteration) -> Vec<String> {
    let env = solver.environment();
    let policy = solver.policy();
    (0..env.rows())
        .map(|row| {
            (0..env.cols())
                .map(|column| {
                    let cell = Position::new(row, column);
                    if env.is_goal(&cell) {
                        'G'
                    } else if env.is_obstacle(&cell) {
                        '#'
                    } else {
                        policy
                            .and_then(|p| p.get(&cell))
                            .map_or('?', |action| action.arrow())
                    }
                })
                .collect()
        })
        .collect()
}

fn describe(placement: &Placement) -> String {
    match placement.heading {
        Some(heading) => format!("{} facing {heading:?}", placement.position),
        None => placement.position.to_string(),
    }
}

fn check(config_path: &Path, out: &mut dyn Write) -> Result<()> {
    let (config, env) = load(config_path)?;
    writeln!(out, "grid: {}x{}", env.rows(), env.cols())?;
    writeln!(out, "start: {}", describe(&config.start))?;
    writeln!(out, "goal: {}", describe(&config.goal))?;
    writeln!(out, "obstacles: {}", env.obstacles().len())?;
    writeln!(out, "states: {}", env.state_space().len())?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve(args) => solve(&args),
        Commands::Check { config } => check(&config, &mut io::stdout().lock()),
    }
}
