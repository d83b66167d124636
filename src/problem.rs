use std::collections::HashMap;
use std::fmt;

use crate::block::Block;
use crate::position::Position;

/// A terminal endpoint: the block it belongs to and its block-relative cell.
pub type Terminal = (u32, Position);

/// Board dimensions, the ordered block list, and the line-id -> terminals
/// index, as specified. `Problem` owns its `Block`s; blocks never refer
/// back to the problem that holds them.
#[derive(Debug, Clone)]
pub struct Problem {
    max_width: usize,
    max_height: usize,
    blocks: Vec<Block>,
    terminals: HashMap<i32, Vec<Terminal>>,
}

impl Problem {
    pub fn new(max_width: usize, max_height: usize) -> Self {
        Problem { max_width, max_height, blocks: Vec::new(), terminals: HashMap::new() }
    }

    pub fn max_width(&self) -> usize {
        self.max_width
    }

    pub fn max_height(&self) -> usize {
        self.max_height
    }

    pub fn block_num(&self) -> usize {
        self.blocks.len()
    }

    /// Adds a block and rebuilds the terminal index for any labels it
    /// carries. `label_dict` entries with label `> 0` become terminals.
    pub fn add_block(
        &mut self,
        block_id: u32,
        pos_list: Vec<Position>,
        label_dict: HashMap<Position, i32>,
    ) {
        for (&pos, &label) in &label_dict {
            if label > 0 {
                self.terminals.entry(label).or_default().push((block_id, pos));
            }
        }
        self.blocks.push(Block::new(block_id, pos_list, label_dict));
    }

    pub fn block_list(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn block_id_list(&self) -> impl Iterator<Item = u32> + '_ {
        self.blocks.iter().map(|b| b.block_id())
    }

    /// 1-based lookup, matching the reference implementation's numbering.
    pub fn block(&self, block_id: u32) -> &Block {
        let block = &self.blocks[(block_id - 1) as usize];
        assert_eq!(block.block_id(), block_id, "block list is not contiguously numbered");
        block
    }

    /// Line ids in ascending order.
    pub fn line_id_list(&self) -> impl Iterator<Item = i32> + '_ {
        let mut ids: Vec<i32> = self.terminals.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
    }

    /// The (always exactly two) terminals of `line_id`.
    pub fn terminals(&self, line_id: i32) -> &[Terminal] {
        &self.terminals[&line_id]
    }

    /// Invariant check used by callers that build a `Problem` by hand
    /// (outside the parser) before handing it to the encoder: every label
    /// referenced by a block appears in the terminal index under its own
    /// key, and every line has exactly two terminals.
    pub fn validate(&self) -> Result<(), String> {
        for block in &self.blocks {
            for (_, label) in block.pos_label_list() {
                if !self.terminals.contains_key(&label) {
                    return Err(format!("label {label} has no terminal index entry"));
                }
            }
        }
        for (&line_id, terms) in &self.terminals {
            if terms.len() != 2 {
                return Err(format!(
                    "line {line_id} has {} terminals, expected exactly 2",
                    terms.len()
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SIZE {}X{}", self.max_width, self.max_height)?;
        writeln!(f, "BLOCK_NUM {}", self.block_num())?;
        for block in self.block_list() {
            writeln!(f, "BLOCK#{} {}X{}", block.block_id(), block.width(), block.height())?;
            for y in 0..block.height() {
                for x in 0..block.width() {
                    if x > 0 {
                        write!(f, ",")?;
                    }
                    let label = block.label(Position::from_xy(x, y));
                    match label {
                        -1 => write!(f, " 0")?,
                        0 => write!(f, " +")?,
                        l => write!(f, "{l:2}")?,
                    }
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_problem() -> Problem {
        let mut problem = Problem::new(3, 3);
        let pos_list = vec![
            Position::new(0, 0),
            Position::new(1, 0),
            Position::new(0, 1),
            Position::new(1, 1),
        ];
        let mut labels = HashMap::new();
        labels.insert(Position::new(0, 0), 1);
        labels.insert(Position::new(1, 0), 0);
        labels.insert(Position::new(0, 1), 0);
        labels.insert(Position::new(1, 1), 2);
        problem.add_block(1, pos_list, labels);
        problem
    }

    #[test]
    fn terminal_index_is_built_on_insert() {
        let problem = sample_problem();
        assert_eq!(problem.block_num(), 1);
        assert_eq!(problem.line_id_list().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(problem.terminals(1), &[(1, Position::new(0, 0))]);
        assert_eq!(problem.terminals(2), &[(1, Position::new(1, 1))]);
    }

    #[test]
    fn validate_rejects_unpaired_terminal() {
        let mut problem = Problem::new(2, 2);
        let mut labels = HashMap::new();
        labels.insert(Position::new(0, 0), 1);
        problem.add_block(1, vec![Position::new(0, 0)], labels);
        assert!(problem.validate().is_err());
    }

    #[test]
    fn display_matches_reference_field_widths() {
        let problem = sample_problem();
        let text = problem.to_string();
        assert_eq!(text, "SIZE 3X3\nBLOCK_NUM 1\nBLOCK#1 2X2\n 1, +\n +, 2\n");
    }
}
