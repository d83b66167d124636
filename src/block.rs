use std::collections::HashMap;

use crate::position::Position;

/// The tetromino classification of a [`Block`]'s shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    I,
    O,
    T,
    J,
    L,
    S,
    Z,
    /// Not a tetromino in any of the catalog's rotations.
    X,
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            BlockType::I => 'I',
            BlockType::O => 'O',
            BlockType::T => 'T',
            BlockType::J => 'J',
            BlockType::L => 'L',
            BlockType::S => 'S',
            BlockType::Z => 'Z',
            BlockType::X => 'X',
        };
        write!(f, "{c}")
    }
}

/// One polyomino-shaped block with labeled terminal cells.
///
/// `pos_list` and the label map are fixed at construction; width/height and
/// `block_type` are derived from them once and never recomputed.
#[derive(Debug, Clone)]
pub struct Block {
    block_id: u32,
    pos_list: Vec<Position>,
    label_dict: HashMap<Position, i32>,
    width: usize,
    height: usize,
    block_type: BlockType,
}

impl Block {
    /// `label_dict` carries an entry (possibly 0) for every interior cell;
    /// cells outside the block have no entry, matching the reference
    /// `label_dict`/`pos_list` contract.
    pub fn new(block_id: u32, pos_list: Vec<Position>, label_dict: HashMap<Position, i32>) -> Self {
        let width = pos_list.iter().map(|p| p.x).max().map_or(0, |m| (m + 1) as usize);
        let height = pos_list.iter().map(|p| p.y).max().map_or(0, |m| (m + 1) as usize);
        let block_type = classify(&pos_list);
        Block { block_id, pos_list, label_dict, width, height, block_type }
    }

    pub fn block_id(&self) -> u32 {
        self.block_id
    }

    /// The cells occupied by this block, relative to its top-left origin.
    pub fn pos_list(&self) -> impl Iterator<Item = Position> + '_ {
        self.pos_list.iter().copied()
    }

    /// The label at `pos`, or `0` if `pos` is inside the block but unlabeled,
    /// or `-1` if `pos` is outside the block entirely.
    pub fn label(&self, pos: Position) -> i32 {
        *self.label_dict.get(&pos).unwrap_or(&-1)
    }

    /// `(position, label)` pairs for terminal cells only (label > 0).
    pub fn pos_label_list(&self) -> impl Iterator<Item = (Position, i32)> + '_ {
        self.label_dict.iter().filter(|&(_, &l)| l > 0).map(|(&p, &l)| (p, l))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }
}

/// Normalizes a pattern to top-left origin `(0, 0)` and sorts it so it can
/// be compared as a multiset against the catalog.
fn normalize(cells: &[Position]) -> Vec<Position> {
    let min_x = cells.iter().map(|p| p.x).min().unwrap_or(0);
    let min_y = cells.iter().map(|p| p.y).min().unwrap_or(0);
    let mut out: Vec<Position> =
        cells.iter().map(|&p| Position::new(p.x - min_x, p.y - min_y)).collect();
    out.sort();
    out
}

fn pat(cells: &[(i32, i32)]) -> Vec<Position> {
    let mut v: Vec<Position> = cells.iter().map(|&(x, y)| Position::new(x, y)).collect();
    v.sort();
    v
}

/// Fixed catalog of canonical offset multisets per tetromino type,
/// including every rotation the original tool enumerates by hand.
fn catalog() -> [(BlockType, Vec<Vec<Position>>); 7] {
    [
        (
            BlockType::I,
            vec![
                pat(&[(0, 0), (0, 1), (0, 2), (0, 3)]),
                pat(&[(0, 0), (1, 0), (2, 0), (3, 0)]),
            ],
        ),
        (BlockType::O, vec![pat(&[(0, 0), (1, 0), (0, 1), (1, 1)])]),
        (
            BlockType::T,
            vec![
                pat(&[(1, 0), (0, 1), (1, 1), (2, 1)]),
                pat(&[(1, 0), (0, 1), (1, 1), (1, 2)]),
                pat(&[(0, 0), (1, 0), (2, 0), (1, 1)]),
                pat(&[(0, 0), (0, 1), (1, 1), (0, 2)]),
            ],
        ),
        (
            BlockType::J,
            vec![
                pat(&[(1, 0), (1, 1), (0, 2), (1, 2)]),
                pat(&[(0, 0), (0, 1), (1, 1), (2, 1)]),
                pat(&[(0, 0), (1, 0), (0, 1), (0, 2)]),
                pat(&[(0, 0), (1, 0), (2, 0), (2, 1)]),
            ],
        ),
        (
            BlockType::L,
            vec![
                pat(&[(0, 0), (0, 1), (0, 2), (1, 2)]),
                pat(&[(0, 0), (1, 0), (2, 0), (0, 1)]),
                pat(&[(0, 0), (1, 0), (1, 1), (1, 2)]),
                pat(&[(2, 0), (0, 1), (1, 1), (2, 1)]),
            ],
        ),
        (
            BlockType::S,
            vec![
                pat(&[(1, 0), (2, 0), (0, 1), (1, 1)]),
                pat(&[(0, 0), (0, 1), (1, 1), (1, 2)]),
            ],
        ),
        (
            BlockType::Z,
            vec![
                pat(&[(0, 0), (1, 0), (1, 1), (2, 1)]),
                pat(&[(1, 0), (0, 1), (1, 1), (0, 2)]),
            ],
        ),
    ]
}

fn classify(cells: &[Position]) -> BlockType {
    let normalized = normalize(cells);
    for (ty, patterns) in catalog() {
        if patterns.iter().any(|p| *p == normalized) {
            return ty;
        }
    }
    BlockType::X
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos_list(cells: &[(i32, i32)]) -> Vec<Position> {
        cells.iter().map(|&(x, y)| Position::new(x, y)).collect()
    }

    #[test]
    fn classify_i() {
        assert_eq!(classify(&pos_list(&[(0, 0), (1, 0), (2, 0), (3, 0)])), BlockType::I);
    }

    #[test]
    fn classify_o() {
        assert_eq!(classify(&pos_list(&[(0, 0), (1, 0), (0, 1), (1, 1)])), BlockType::O);
    }

    #[test]
    fn classify_t() {
        assert_eq!(classify(&pos_list(&[(0, 0), (1, 0), (2, 0), (1, 1)])), BlockType::T);
    }

    #[test]
    fn classify_x_for_non_tetromino() {
        assert_eq!(classify(&pos_list(&[(0, 0), (1, 0), (0, 1)])), BlockType::X);
    }

    #[test]
    fn classify_is_translation_invariant() {
        let shifted = pos_list(&[(5, 5), (6, 5), (7, 5), (6, 6)]);
        assert_eq!(classify(&shifted), BlockType::T);
    }

    #[test]
    fn block_derives_dimensions_and_labels() {
        let positions = pos_list(&[(0, 0), (1, 0), (0, 1), (1, 1)]);
        let mut labels = HashMap::new();
        labels.insert(Position::new(0, 0), 1);
        labels.insert(Position::new(1, 0), 0);
        labels.insert(Position::new(0, 1), 0);
        labels.insert(Position::new(1, 1), 2);
        let block = Block::new(1, positions, labels);

        assert_eq!(block.width(), 2);
        assert_eq!(block.height(), 2);
        assert_eq!(block.block_type(), BlockType::O);
        assert_eq!(block.label(Position::new(0, 0)), 1);
        assert_eq!(block.label(Position::new(1, 0)), 0);
        assert_eq!(block.label(Position::new(5, 5)), -1);

        let mut terminals: Vec<_> = block.pos_label_list().collect();
        terminals.sort_by_key(|&(p, _)| p);
        assert_eq!(terminals, vec![(Position::new(0, 0), 1), (Position::new(1, 1), 2)]);
    }
}
