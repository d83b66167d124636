//! Drives an external SAT solver binary over DIMACS CNF files.
//!
//! The encoder only ever allocates variables and pushes clauses; this
//! module owns turning that buffer into a `.cnf` file, invoking the
//! solver as a subprocess, and turning its output back into a model.

use std::io::Write as _;
use std::path::Path;
use std::process::Command;

use log::{error, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("i/o error talking to the SAT solver: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to launch solver binary {program:?}: {source}")]
    SolverSpawnFailed { program: String, #[source] source: std::io::Error },

    #[error("solver exited with status {0}")]
    SolverFailed(std::process::ExitStatus),

    #[error("could not parse solver output: {0}")]
    UnparseableOutput(String),
}

/// A growable CNF instance: a variable counter plus a clause buffer, in
/// DIMACS's 1-based, sign-encodes-negation convention.
#[derive(Debug, Default)]
pub struct SatDriver {
    num_vars: i32,
    clauses: Vec<Vec<i32>>,
}

/// A satisfying assignment, 1-indexed to match DIMACS variable numbers.
/// `model.value(v)` is the truth value assigned to variable `v`.
#[derive(Debug, Clone)]
pub struct Model {
    assignment: Vec<bool>,
}

impl Model {
    pub fn value(&self, var: i32) -> bool {
        self.assignment[(var - 1) as usize]
    }

    /// Builds a model directly from a raw assignment vector, bypassing a
    /// real solver run. Used by encoder tests to exercise the decoder
    /// against a hand-picked satisfying assignment.
    #[cfg(test)]
    pub(crate) fn from_raw(assignment: Vec<bool>) -> Self {
        Model { assignment }
    }
}

impl SatDriver {
    pub fn new() -> Self {
        SatDriver { num_vars: 0, clauses: Vec::new() }
    }

    /// Allocates a fresh variable and returns its (positive) DIMACS id.
    pub fn new_var(&mut self) -> i32 {
        self.num_vars += 1;
        self.num_vars
    }

    pub fn add_clause(&mut self, clause: Vec<i32>) {
        self.clauses.push(clause);
    }

    pub fn num_vars(&self) -> i32 {
        self.num_vars
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    fn write_dimacs<W: std::io::Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "p cnf {} {}", self.num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            for lit in clause {
                write!(w, "{lit} ")?;
            }
            writeln!(w, "0")?;
        }
        Ok(())
    }

    /// Writes the CNF to a temp file, runs `sat_program <input> <output>`,
    /// and parses the result. `Ok(None)` means the instance is UNSAT.
    pub fn solve(&self, sat_program: &Path) -> Result<Option<Model>, DriverError> {
        let mut input_file = tempfile::Builder::new().suffix(".cnf").tempfile()?;
        self.write_dimacs(&mut input_file)?;
        input_file.flush()?;

        let output_file = tempfile::Builder::new().suffix(".out").tempfile()?;

        info!(
            "invoking {} on {} vars / {} clauses",
            sat_program.display(),
            self.num_vars,
            self.clauses.len()
        );

        let status = Command::new(sat_program)
            .arg(input_file.path())
            .arg(output_file.path())
            .status()
            .map_err(|source| DriverError::SolverSpawnFailed {
                program: sat_program.display().to_string(),
                source,
            })?;

        if !status.success() {
            error!("solver exited with {status}");
            return Err(DriverError::SolverFailed(status));
        }

        let output = std::fs::read_to_string(output_file.path())?;
        self.parse_output(&output)
    }

    fn parse_output(&self, output: &str) -> Result<Option<Model>, DriverError> {
        let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
        let verdict =
            lines.next().ok_or_else(|| DriverError::UnparseableOutput("empty output".into()))?;

        if verdict.eq_ignore_ascii_case("UNSAT") {
            return Ok(None);
        }
        if !verdict.eq_ignore_ascii_case("SAT") {
            return Err(DriverError::UnparseableOutput(format!("unexpected verdict line: {verdict}")));
        }

        let mut assignment = vec![false; self.num_vars as usize];
        for line in lines {
            for token in line.split_whitespace() {
                let token = token.strip_prefix('v').unwrap_or(token);
                let lit: i32 = token
                    .parse()
                    .map_err(|_| DriverError::UnparseableOutput(format!("bad literal: {token}")))?;
                if lit == 0 {
                    continue;
                }
                let var = lit.unsigned_abs() as usize;
                if var == 0 || var > assignment.len() {
                    return Err(DriverError::UnparseableOutput(format!(
                        "literal {lit} out of range for {} variables",
                        self.num_vars
                    )));
                }
                assignment[var - 1] = lit > 0;
            }
        }
        Ok(Some(Model { assignment }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_dimacs_header_and_clauses() {
        let mut driver = SatDriver::new();
        let a = driver.new_var();
        let b = driver.new_var();
        driver.add_clause(vec![a, -b]);
        let mut buf = Vec::new();
        driver.write_dimacs(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "p cnf 2 1\n1 -2 0\n");
    }

    #[test]
    fn parses_sat_output() {
        let mut driver = SatDriver::new();
        driver.new_var();
        driver.new_var();
        driver.new_var();
        let model = driver.parse_output("SAT\n1 -2 3 0\n").unwrap().unwrap();
        assert!(model.value(1));
        assert!(!model.value(2));
        assert!(model.value(3));
    }

    #[test]
    fn parses_unsat_output() {
        let driver = SatDriver::new();
        assert!(driver.parse_output("UNSAT\n").unwrap().is_none());
    }

    #[test]
    fn rejects_garbage_output() {
        let driver = SatDriver::new();
        assert!(driver.parse_output("MAYBE\n").is_err());
    }
}
