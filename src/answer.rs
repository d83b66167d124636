use std::collections::HashMap;
use std::fmt;

use crate::position::Position;

/// A full labeled solution grid plus the placement chosen for every block.
///
/// `Answer` owns its label array and placement map outright; cell labels
/// are stored row-major (`y * width + x`), `0` meaning "no line".
#[derive(Debug, Clone)]
pub struct Answer {
    width: usize,
    height: usize,
    labels: Vec<i32>,
    block_pos: HashMap<u32, Position>,
}

impl Answer {
    pub fn new(width: usize, height: usize) -> Self {
        Answer { width, height, labels: vec![0; width * height], block_pos: HashMap::new() }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The line label at `pos` (`0` if unlabeled).
    pub fn label(&self, pos: Position) -> i32 {
        self.labels[self.index(pos)]
    }

    /// Convenience overload of [`Self::label`] taking raw coordinates
    /// (the reference implementation's `Answer.label(*args)` collapsed to
    /// two concrete methods instead of a variadic one).
    pub fn label_xy(&self, x: usize, y: usize) -> i32 {
        self.label(Position::from_xy(x, y))
    }

    pub fn set_label(&mut self, pos: Position, label: i32) {
        let index = self.index(pos);
        self.labels[index] = label;
    }

    /// The top-left placement of `block_id`; panics if it was never set.
    pub fn block_pos(&self, block_id: u32) -> Position {
        self.block_pos[&block_id]
    }

    pub fn set_block_pos(&mut self, block_id: u32, pos: Position) {
        assert!(pos.is_in_range(self.width, self.height), "placement {pos} out of range");
        self.block_pos.insert(block_id, pos);
    }

    /// Block ids in ascending order, alongside their placement.
    pub fn block_positions(&self) -> impl Iterator<Item = (u32, Position)> + '_ {
        let mut ids: Vec<u32> = self.block_pos.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().map(move |id| (id, self.block_pos[&id]))
    }

    fn index(&self, pos: Position) -> usize {
        assert!(pos.is_in_range(self.width, self.height), "position {pos} out of range");
        pos.y as usize * self.width + pos.x as usize
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SIZE {}X{}", self.width, self.height)?;
        for y in 0..self.height {
            for x in 0..self.width {
                if x > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{:2}", self.label_xy(x, y))?;
            }
            writeln!(f)?;
        }
        for (block_id, pos) in self.block_positions() {
            writeln!(f, "BLOCK#{block_id} @{pos}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_default_to_zero_and_round_trip() {
        let mut ans = Answer::new(3, 1);
        assert_eq!(ans.label_xy(1, 0), 0);
        ans.set_label(Position::new(1, 0), 1);
        assert_eq!(ans.label_xy(1, 0), 1);
    }

    #[test]
    fn minimal_routing_s6() {
        // Two 1x1 blocks labeled 1 at columns 0 and 2 of a 3x1 board; the
        // middle cell is routed with label 1.
        let mut ans = Answer::new(3, 1);
        ans.set_block_pos(1, Position::new(0, 0));
        ans.set_block_pos(2, Position::new(2, 0));
        for x in 0..3 {
            ans.set_label(Position::new(x, 0), 1);
        }
        assert_eq!(ans.to_string(), "SIZE 3X1\n 1, 1, 1\nBLOCK#1 @(0,0)\nBLOCK#2 @(2,0)\n");
    }

    #[test]
    #[should_panic]
    fn set_block_pos_out_of_range_panics() {
        let mut ans = Answer::new(2, 2);
        ans.set_block_pos(1, Position::new(5, 5));
    }
}
