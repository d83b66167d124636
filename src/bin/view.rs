use std::path::PathBuf;

use adc2019_solver::answer::Answer;
use adc2019_solver::parser;
use adc2019_solver::position::Position;
use adc2019_solver::problem::Problem;
use anyhow::{Context, Result};
use clap::Parser;

/// Renders a problem file, or a problem with one of its answers overlaid,
/// as a text board. A stand-in for the reference tool's GUI viewer.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the problem file
    problem: PathBuf,
    /// Path to a matching answer file
    #[arg(long)]
    answer: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let problem_text = std::fs::read_to_string(&cli.problem)
        .with_context(|| format!("reading problem file {}", cli.problem.display()))?;
    let problem = parser::read_problem(&problem_text)
        .map_err(|errors| anyhow::anyhow!("{} error(s) in {}", errors.len(), cli.problem.display()))?;

    match &cli.answer {
        None => {
            print!("{problem}");
        }
        Some(answer_path) => {
            let answer_text = std::fs::read_to_string(answer_path)
                .with_context(|| format!("reading answer file {}", answer_path.display()))?;
            let answer = parser::read_answer(&answer_text, problem.block_num()).map_err(|errors| {
                anyhow::anyhow!("{} error(s) in {}", errors.len(), answer_path.display())
            })?;
            println!("{}", render_board(&problem, &answer));
        }
    }

    Ok(())
}

/// A `.`-for-empty, block-type-letter-for-unlabeled-cell, digit-for-label
/// ASCII rendering of a solved board.
fn render_board(problem: &Problem, answer: &Answer) -> String {
    let mut out = String::new();
    for y in 0..answer.height() {
        for x in 0..answer.width() {
            if x > 0 {
                out.push(' ');
            }
            let pos = Position::from_xy(x, y);
            out.push(cell_glyph(problem, answer, pos));
        }
        out.push('\n');
    }
    out
}

fn cell_glyph(problem: &Problem, answer: &Answer, pos: Position) -> char {
    let label = answer.label(pos);
    if label > 0 {
        return char::from_digit(label as u32 % 10, 10).unwrap_or('#');
    }
    for block in problem.block_list() {
        let origin = answer.block_pos(block.block_id());
        let rel = pos - origin;
        if rel.is_in_range(block.width(), block.height()) && block.label(rel) >= 0 {
            return block.block_type().to_string().chars().next().unwrap_or('#');
        }
    }
    '.'
}
