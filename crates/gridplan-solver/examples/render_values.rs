use gridplan_core::{Environment, EnvironmentConfig, Position};
use gridplan_solver::{IterationReport, PolicyIteration, SolverSettings};
use std::error::Error;
use std::io::{self, Read};
use std::rc::Rc;

fn main() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => EnvironmentConfig::from_path(path)?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text.parse()?
        }
    };
    let env = Rc::new(Environment::from_config(&config)?);
    let mut solver = PolicyIteration::new(Rc::clone(&env), SolverSettings::default())?;

    let mut frame = |s: &PolicyIteration, report: &IterationReport| {
        println!(
            "-- iteration {} ({} sweeps, {} changed)",
            report.iteration,
            report.evaluation.sweeps(),
            report.improvement.changed
        );
        for row in 0..env.rows() {
            let cells: Vec<String> = (0..env.cols())
                .map(|column| {
                    let cell = Position::new(row, column);
                    match s.values().and_then(|v| v.get(&cell)) {
                        _ if env.is_obstacle(&cell) => format!("{:>8}", "#"),
                        Some(value) => format!("{value:>8.2}"),
                        None => format!("{:>8}", "?"),
                    }
                })
                .collect();
            println!("{}", cells.join(""));
        }
    };
    let path = solver.run(&mut frame)?;

    let steps: Vec<String> = path.iter().map(ToString::to_string).collect();
    println!("{}", steps.join(" -> "));
    Ok(())
}
