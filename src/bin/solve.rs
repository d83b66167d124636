use std::path::PathBuf;

use adc2019_solver::encoder::Encoder;
use adc2019_solver::parser;
use adc2019_solver::sat_driver::SatDriver;
use anyhow::{Context, Result};
use clap::Parser;
use log::info;

/// Solves an ADC2019-style placement-and-routing puzzle via an external
/// SAT solver binary.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the problem file
    problem: PathBuf,
    /// Board width to solve for
    width: usize,
    /// Board height to solve for
    height: usize,
    /// Path to the external SAT solver binary (reads/writes DIMACS files)
    satprog: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.problem)
        .with_context(|| format!("reading problem file {}", cli.problem.display()))?;
    let problem = parser::read_problem(&text)
        .map_err(|errors| anyhow::anyhow!("{} error(s) in {}", errors.len(), cli.problem.display()))?;

    info!(
        "solving {} block(s) on a {}x{} board via {}",
        problem.block_num(),
        cli.width,
        cli.height,
        cli.satprog.display()
    );

    let mut encoder = Encoder::new(&problem, cli.width, cli.height);
    let mut driver = SatDriver::new();
    encoder.gen_placement_constraint(&mut driver);
    encoder.gen_routing_constraint(&mut driver);

    info!("encoded {} variable(s), {} clause(s)", driver.num_vars(), driver.num_clauses());

    match driver.solve(&cli.satprog).context("running the SAT solver")? {
        Some(model) => {
            let answer = encoder.get_answer(&model);
            print!("{answer}");
        }
        None => println!("UNSAT"),
    }

    Ok(())
}
