//! Encodes a placement-and-routing [`Problem`] into CNF clauses, and
//! decodes a satisfying [`Model`] back into an [`Answer`].
//!
//! The encoder owns no variables directly solvable on its own — every
//! clause it builds is pushed straight into a [`SatDriver`], which is
//! also where new variables are allocated from. Call
//! [`Encoder::gen_placement_constraint`] then
//! [`Encoder::gen_routing_constraint`] exactly once each before handing
//! the driver to a solver.

use std::collections::HashMap;

use crate::answer::Answer;
use crate::position::{Direction, Position};
use crate::problem::Problem;
use crate::sat_driver::{Model, SatDriver};

pub struct Encoder<'a> {
    problem: &'a Problem,
    width: usize,
    height: usize,
    gridpos_list: Vec<Position>,
    x_vars: HashMap<(u32, usize), i32>,
    y_vars: HashMap<(u32, usize), i32>,
    g_vars: HashMap<(Position, u32), i32>,
    b_vars: HashMap<Position, i32>,
    l_vars: HashMap<(Position, i32), i32>,
    t_vars: HashMap<Position, i32>,
    e_vars: HashMap<(Position, Direction), i32>,
}

impl<'a> Encoder<'a> {
    pub fn new(problem: &'a Problem, width: usize, height: usize) -> Self {
        let mut gridpos_list = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                gridpos_list.push(Position::from_xy(x, y));
            }
        }
        Encoder {
            problem,
            width,
            height,
            gridpos_list,
            x_vars: HashMap::new(),
            y_vars: HashMap::new(),
            g_vars: HashMap::new(),
            b_vars: HashMap::new(),
            l_vars: HashMap::new(),
            t_vars: HashMap::new(),
            e_vars: HashMap::new(),
        }
    }

    /// Every legal top-left placement of every block, one-hot per axis,
    /// plus the per-cell occupancy variables it implies.
    pub fn gen_placement_constraint(&mut self, driver: &mut SatDriver) {
        for block in self.problem.block_list() {
            let mut x_candidates = Vec::new();
            for x in 0..self.width {
                let var = driver.new_var();
                self.x_vars.insert((block.block_id(), x), var);
                if x + block.width() > self.width {
                    driver.add_clause(vec![-var]);
                } else {
                    x_candidates.push(var);
                }
            }
            one_hot(driver, &x_candidates);

            let mut y_candidates = Vec::new();
            for y in 0..self.height {
                let var = driver.new_var();
                self.y_vars.insert((block.block_id(), y), var);
                if y + block.height() > self.height {
                    driver.add_clause(vec![-var]);
                } else {
                    y_candidates.push(var);
                }
            }
            one_hot(driver, &y_candidates);
        }

        let gridpos_list = self.gridpos_list.clone();
        for pos in gridpos_list.iter().copied() {
            let mut var_list = Vec::new();
            let b_var = driver.new_var();
            self.b_vars.insert(pos, b_var);
            for block in self.problem.block_list() {
                let var = driver.new_var();
                self.g_vars.insert((pos, block.block_id()), var);
                for pos1 in block.pos_list() {
                    let pos0 = pos - pos1;
                    if pos0.is_in_range(self.width, self.height) {
                        let x_var = self.block_x_var(block.block_id(), pos0.x as usize);
                        let y_var = self.block_y_var(block.block_id(), pos0.y as usize);
                        driver.add_clause(vec![-x_var, -y_var, var]);
                        driver.add_clause(vec![-x_var, -y_var, b_var]);
                    }
                }
                var_list.push(var);
            }
            at_most_one(driver, &var_list);
            let mut clause = vec![-b_var];
            clause.extend(&var_list);
            driver.add_clause(clause);
        }

        for pos in gridpos_list.iter().copied() {
            for block in self.problem.block_list() {
                for pos1 in block.pos_list() {
                    let pos0 = pos - pos1;
                    if pos0.is_in_range(self.width, self.height) {
                        let x_var = self.block_x_var(block.block_id(), pos0.x as usize);
                        let y_var = self.block_y_var(block.block_id(), pos0.y as usize);
                        let g_var = self.grid_var(pos, block.block_id());
                        driver.add_clause(vec![-x_var, -y_var, g_var]);
                    }
                }
            }
        }
    }

    /// The per-cell line labels, the terminal-presence flags they feed,
    /// the inter-cell edge variables a route walks across, and the
    /// corner rule that keeps two crossing routes from touching diagonally.
    pub fn gen_routing_constraint(&mut self, driver: &mut SatDriver) {
        let line_ids: Vec<i32> = self.problem.line_id_list().collect();
        let gridpos_list = self.gridpos_list.clone();

        for pos in gridpos_list.iter().copied() {
            let mut var_list = Vec::new();
            for &line_id in &line_ids {
                let var = driver.new_var();
                self.l_vars.insert((pos, line_id), var);
                var_list.push(var);
            }
            at_most_one(driver, &var_list);

            let b_var = self.b_vars[&pos];

            let t_all_var = driver.new_var();
            self.t_vars.insert(pos, t_all_var);
            let mut t_var_list = Vec::new();
            for &line_id in &line_ids {
                let t1_var = driver.new_var();
                let mut xy_list = Vec::new();
                for &(block_id, pos1) in self.problem.terminals(line_id) {
                    let pos0 = pos - pos1;
                    if pos0.is_in_range(self.width, self.height) {
                        let x_var = self.block_x_var(block_id, pos0.x as usize);
                        let y_var = self.block_y_var(block_id, pos0.y as usize);
                        xy_list.push((x_var, y_var));
                    }
                }

                match xy_list.len() {
                    0 => driver.add_clause(vec![-t1_var]),
                    1 => {
                        let (x_var, y_var) = xy_list[0];
                        driver.add_clause(vec![-x_var, -y_var, t1_var]);
                        driver.add_clause(vec![x_var, -t1_var]);
                        driver.add_clause(vec![y_var, -t1_var]);
                    }
                    2 => {
                        let mut vs = Vec::with_capacity(2);
                        for (x_var, y_var) in xy_list {
                            let v = driver.new_var();
                            driver.add_clause(vec![-x_var, -y_var, v]);
                            driver.add_clause(vec![x_var, -v]);
                            driver.add_clause(vec![y_var, -v]);
                            vs.push(v);
                        }
                        driver.add_clause(vec![-vs[0], t1_var]);
                        driver.add_clause(vec![-vs[1], t1_var]);
                        driver.add_clause(vec![vs[0], vs[1], -t1_var]);
                    }
                    n => unreachable!(
                        "a block may offer at most 2 terminal candidates for one cell, got {n}"
                    ),
                }

                let l_var = self.line_var(pos, line_id);
                driver.add_clause(vec![-t1_var, l_var]);
                driver.add_clause(vec![-t1_var, t_all_var]);
                t_var_list.push(t1_var);
            }
            let mut clause = vec![-t_all_var];
            clause.extend(&t_var_list);
            driver.add_clause(clause);

            for &line_id in &line_ids {
                let l_var = self.line_var(pos, line_id);
                driver.add_clause(vec![t_all_var, -b_var, -l_var]);
            }
        }

        for x in 0..self.width {
            for y in 0..self.height.saturating_sub(1) {
                let var = driver.new_var();
                self.e_vars.insert((Position::from_xy(x, y), Direction::S), var);
                self.e_vars.insert((Position::from_xy(x, y + 1), Direction::N), var);
            }
        }
        for y in 0..self.height {
            for x in 0..self.width.saturating_sub(1) {
                let var = driver.new_var();
                self.e_vars.insert((Position::from_xy(x, y), Direction::E), var);
                self.e_vars.insert((Position::from_xy(x + 1, y), Direction::W), var);
            }
        }

        for pos in gridpos_list.iter().copied() {
            let var_list: Vec<i32> =
                Direction::ALL.iter().filter_map(|&d| self.e_vars.get(&(pos, d)).copied()).collect();

            let t_var = self.t_vars[&pos];
            let b_var = self.b_vars[&pos];

            one_hot_with_cond(driver, &var_list, t_var);

            for &var in &var_list {
                driver.add_clause(vec![-b_var, t_var, -var]);
            }

            zero_or_two_hot_with_cond(driver, &var_list, -b_var);
        }

        for pos1 in gridpos_list.iter().copied() {
            for &dir in &Direction::ALL {
                let Some(&e_var) = self.e_vars.get(&(pos1, dir)) else { continue };
                let pos2 = pos1.adjacent(dir);
                for &line_id in &line_ids {
                    let l1_var = self.line_var(pos1, line_id);
                    let l2_var = self.line_var(pos2, line_id);
                    driver.add_clause(vec![-e_var, l1_var, -l2_var]);
                    driver.add_clause(vec![-e_var, -l1_var, l2_var]);
                }
            }
        }

        // Forbids a route from cutting the inside corner of another: of
        // the south/east edges out of `pos` and the mirrored edges out of
        // its south and east neighbors, at most two may be selected.
        for pos in gridpos_list.iter().copied() {
            let Some(&e1_var) = self.e_vars.get(&(pos, Direction::S)) else { continue };
            let Some(&e2_var) = self.e_vars.get(&(pos, Direction::E)) else { continue };
            let pos2 = pos + Position::new(0, 1);
            let e3_var = self.e_vars[&(pos2, Direction::E)];
            let pos3 = pos + Position::new(1, 0);
            let e4_var = self.e_vars[&(pos3, Direction::S)];

            driver.add_clause(vec![-e1_var, -e2_var, -e3_var]);
            driver.add_clause(vec![-e1_var, -e2_var, -e4_var]);
            driver.add_clause(vec![-e1_var, -e3_var, -e4_var]);
            driver.add_clause(vec![-e2_var, -e3_var, -e4_var]);
        }
    }

    /// Reconstructs block placements and routed lines from a satisfying
    /// model produced against the clauses this encoder generated.
    pub fn get_answer(&self, model: &Model) -> Answer {
        let mut ans = Answer::new(self.width, self.height);

        for block_id in self.problem.block_id_list() {
            let x = (0..self.width)
                .find(|&x| model.value(self.block_x_var(block_id, x)))
                .expect("exactly one x-placement variable is true for a placed block");
            let y = (0..self.height)
                .find(|&y| model.value(self.block_y_var(block_id, y)))
                .expect("exactly one y-placement variable is true for a placed block");
            ans.set_block_pos(block_id, Position::from_xy(x, y));
        }

        for line_id in self.problem.line_id_list() {
            let terminals = self.problem.terminals(line_id);
            let (block_id1, pos1) = terminals[0];
            let (block_id2, pos2) = terminals[1];
            let gpos1 = ans.block_pos(block_id1) + pos1;
            let gpos2 = ans.block_pos(block_id2) + pos2;
            for pos in self.get_route(model, gpos1, gpos2, line_id) {
                debug_assert!(model.value(self.line_var(pos, line_id)));
                ans.set_label(pos, line_id);
            }
        }

        ans
    }

    /// Walks the edge variables between two routed terminals, never
    /// stepping back the way it came.
    fn get_route(&self, model: &Model, pos1: Position, pos2: Position, line_id: i32) -> Vec<Position> {
        debug_assert!(model.value(self.line_var(pos1, line_id)));
        debug_assert!(model.value(self.line_var(pos2, line_id)));

        let mut pos = pos1;
        let mut route = Vec::new();
        let mut prev_pos: Option<Position> = None;
        loop {
            route.push(pos);
            if pos == pos2 {
                break;
            }
            let mut next_pos = None;
            for &dir in &Direction::ALL {
                let Some(&e_var) = self.e_vars.get(&(pos, dir)) else { continue };
                if !model.value(e_var) {
                    continue;
                }
                let candidate = pos.adjacent(dir);
                if Some(candidate) == prev_pos {
                    continue;
                }
                next_pos = Some(candidate);
                break;
            }
            let next_pos =
                next_pos.expect("a routed cell always has an outgoing edge toward its destination");
            prev_pos = Some(pos);
            pos = next_pos;
        }
        route
    }

    fn block_x_var(&self, block_id: u32, x: usize) -> i32 {
        self.x_vars[&(block_id, x)]
    }

    fn block_y_var(&self, block_id: u32, y: usize) -> i32 {
        self.y_vars[&(block_id, y)]
    }

    fn grid_var(&self, pos: Position, block_id: u32) -> i32 {
        self.g_vars[&(pos, block_id)]
    }

    fn line_var(&self, pos: Position, line_id: i32) -> i32 {
        self.l_vars[&(pos, line_id)]
    }
}

fn at_most_one(driver: &mut SatDriver, vars: &[i32]) {
    for i in 0..vars.len() {
        for &v2 in &vars[i + 1..] {
            driver.add_clause(vec![-vars[i], -v2]);
        }
    }
}

fn one_hot(driver: &mut SatDriver, vars: &[i32]) {
    at_most_one(driver, vars);
    driver.add_clause(vars.to_vec());
}

fn one_hot_with_cond(driver: &mut SatDriver, vars: &[i32], cond: i32) {
    for i in 0..vars.len() {
        for &v2 in &vars[i + 1..] {
            driver.add_clause(vec![-cond, -vars[i], -v2]);
        }
    }
    let mut clause = vec![-cond];
    clause.extend(vars);
    driver.add_clause(clause);
}

/// At most 4 edge variables ever meet at one cell, so every case is
/// enumerated directly rather than via a general cardinality encoding.
fn zero_or_two_hot_with_cond(driver: &mut SatDriver, vars: &[i32], cond: i32) {
    match vars.len() {
        2 => {
            let (v1, v2) = (vars[0], vars[1]);
            driver.add_clause(vec![-cond, -v1, v2]);
            driver.add_clause(vec![-cond, v1, -v2]);
        }
        3 => {
            let (v1, v2, v3) = (vars[0], vars[1], vars[2]);
            driver.add_clause(vec![-cond, -v1, v2, v3]);
            driver.add_clause(vec![-cond, v1, -v2, v3]);
            driver.add_clause(vec![-cond, v1, v2, -v3]);
            driver.add_clause(vec![-cond, -v1, -v2, -v3]);
        }
        4 => {
            let (v1, v2, v3, v4) = (vars[0], vars[1], vars[2], vars[3]);
            driver.add_clause(vec![-cond, -v1, v2, v3, v4]);
            driver.add_clause(vec![-cond, v1, -v2, v3, v4]);
            driver.add_clause(vec![-cond, v1, v2, -v3, v4]);
            driver.add_clause(vec![-cond, v1, v2, v3, -v4]);
            driver.add_clause(vec![-cond, -v1, -v2, -v3]);
            driver.add_clause(vec![-cond, -v1, -v2, -v4]);
            driver.add_clause(vec![-cond, -v1, -v3, -v4]);
            driver.add_clause(vec![-cond, -v2, -v3, -v4]);
        }
        n => unreachable!(
            "a cell has between 2 and 4 adjacent edges on any board with more than one cell, got {n}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn straight_line_problem() -> Problem {
        let mut problem = Problem::new(3, 1);
        let mut labels1 = Map::new();
        labels1.insert(Position::from_xy(0, 0), 1);
        problem.add_block(1, vec![Position::from_xy(0, 0)], labels1);
        let mut labels2 = Map::new();
        labels2.insert(Position::from_xy(0, 0), 1);
        problem.add_block(2, vec![Position::from_xy(0, 0)], labels2);
        problem
    }

    // A block may only occupy columns/rows where it fits entirely on the
    // board: `x + block.width() > width` is the first column that would
    // overhang, so it (and everything past it) is forced false, while the
    // last column a block can still flush against (`x == width -
    // block.width()`) stays a free one-hot candidate.

    #[test]
    fn placement_constraint_allows_flush_edge_placement() {
        let problem = straight_line_problem();
        let mut encoder = Encoder::new(&problem, 3, 1);
        let mut driver = SatDriver::new();
        encoder.gen_placement_constraint(&mut driver);

        // width=3, block width=1: every column 0..=2 fits, none overhangs.
        assert!(encoder.x_vars.contains_key(&(1, 0)));
        assert!(encoder.x_vars.contains_key(&(1, 2)));
        assert!(encoder.y_vars.contains_key(&(1, 0)));
    }

    #[test]
    fn decodes_a_hand_built_model_into_the_expected_answer() {
        let problem = straight_line_problem();
        let mut encoder = Encoder::new(&problem, 4, 2);
        let mut driver = SatDriver::new();
        encoder.gen_placement_constraint(&mut driver);
        encoder.gen_routing_constraint(&mut driver);

        let mut assignment = vec![false; driver.num_vars() as usize];
        let mut set_true = |var: i32| assignment[(var - 1) as usize] = true;

        set_true(encoder.block_x_var(1, 0));
        set_true(encoder.block_y_var(1, 0));
        set_true(encoder.block_x_var(2, 2));
        set_true(encoder.block_y_var(2, 0));

        for x in 0..3 {
            set_true(encoder.line_var(Position::from_xy(x, 0), 1));
        }
        set_true(encoder.e_vars[&(Position::from_xy(0, 0), Direction::E)]);
        set_true(encoder.e_vars[&(Position::from_xy(1, 0), Direction::E)]);

        let model = Model::from_raw(assignment);
        let answer = encoder.get_answer(&model);

        assert_eq!(
            answer.to_string(),
            "SIZE 4X2\n 1, 1, 1, 0\n 0, 0, 0, 0\nBLOCK#1 @(0,0)\nBLOCK#2 @(2,0)\n"
        );
    }

    #[test]
    fn decodes_the_minimal_3x1_scenario_with_blocks_flush_to_both_edges() {
        // Two 1x1 blocks labeled 1 at columns 0 and 2 of a 3x1 board, the
        // tightest board the blocks fit on at all: column 2 is flush
        // against the right edge, which the placement one-hot must allow.
        let problem = straight_line_problem();
        let mut encoder = Encoder::new(&problem, 3, 1);
        let mut driver = SatDriver::new();
        encoder.gen_placement_constraint(&mut driver);
        encoder.gen_routing_constraint(&mut driver);

        let mut assignment = vec![false; driver.num_vars() as usize];
        let mut set_true = |var: i32| assignment[(var - 1) as usize] = true;

        set_true(encoder.block_x_var(1, 0));
        set_true(encoder.block_y_var(1, 0));
        set_true(encoder.block_x_var(2, 2));
        set_true(encoder.block_y_var(2, 0));

        for x in 0..3 {
            set_true(encoder.line_var(Position::from_xy(x, 0), 1));
        }
        set_true(encoder.e_vars[&(Position::from_xy(0, 0), Direction::E)]);
        set_true(encoder.e_vars[&(Position::from_xy(1, 0), Direction::E)]);

        let model = Model::from_raw(assignment);
        let answer = encoder.get_answer(&model);

        assert_eq!(answer.to_string(), "SIZE 3X1\n 1, 1, 1\nBLOCK#1 @(0,0)\nBLOCK#2 @(2,0)\n");
    }
}
