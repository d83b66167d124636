//! Placement-and-routing puzzle solver: places polyomino blocks with
//! labeled terminal cells onto a board, routes a simple path between
//! every pair of matching terminals, and emits the labeled solution grid.
//!
//! The puzzle is reduced to a Boolean satisfiability instance ([`encoder`])
//! and handed to an external SAT solver binary ([`sat_driver`]); a
//! satisfying model is decoded back into an [`answer::Answer`].

pub mod answer;
pub mod block;
pub mod encoder;
pub mod parser;
pub mod position;
pub mod problem;
pub mod sat_driver;
