//! `SlidingTilePuzzle`: the R×C sliding-tile puzzle (up to 16 cells).
//!
//! Tile `0` is the blank. The goal places tile `i` at cell `i`, so the blank
//! ends in the top-left corner. Actions move the blank one cell; every move
//! costs 1 and is undone by the opposite move.
//!
//! Boards pack into a `u64` at 4 bits per cell, which is a perfect hash for
//! boards of at most 16 cells.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wayfinder_search::contract::{GoalTest, StateHasher, SuccessorRule};
use wayfinder_search::evaluator::Estimate;

use crate::contract::SearchWorld;

/// Largest board the packed hash supports.
const MAX_CELLS: usize = 16;

/// Direction the blank moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Enumeration order used by `actions`.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Move::Up => Move::Down,
            Move::Down => Move::Up,
            Move::Left => Move::Right,
            Move::Right => Move::Left,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(name)
    }
}

/// Board configuration: `tiles[cell]` is the tile in `cell`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileBoard {
    tiles: Vec<u8>,
    blank: usize,
}

impl TileBoard {
    #[must_use]
    pub fn tiles(&self) -> &[u8] {
        &self.tiles
    }

    /// Cell index of the blank.
    #[must_use]
    pub fn blank(&self) -> usize {
        self.blank
    }

    /// Pack the board at 4 bits per cell, cell 0 in the low nibble.
    #[must_use]
    pub fn packed(&self) -> u64 {
        self.tiles
            .iter()
            .enumerate()
            .fold(0, |acc, (cell, &tile)| acc | (u64::from(tile) << (4 * cell)))
    }
}

/// Board construction failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("unsupported board size {rows}x{cols} (2..=16 cells, both sides >= 1)")]
    UnsupportedSize { rows: usize, cols: usize },
    #[error("tiles are not a permutation of 0..{cells}")]
    NotAPermutation { cells: usize },
}

/// Sliding-tile puzzle world.
#[derive(Debug, Clone)]
pub struct SlidingTilePuzzle {
    rows: usize,
    cols: usize,
    id: String,
}

impl SlidingTilePuzzle {
    /// # Errors
    ///
    /// Returns [`BoardError::UnsupportedSize`] for boards outside 2..=16 cells.
    pub fn new(rows: usize, cols: usize) -> Result<Self, BoardError> {
        let cells = rows * cols;
        if rows == 0 || cols == 0 || !(2..=MAX_CELLS).contains(&cells) {
            return Err(BoardError::UnsupportedSize { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            id: format!("sliding_tile_{rows}x{cols}"),
        })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    fn cells(&self) -> usize {
        self.rows * self.cols
    }

    /// The solved board.
    #[must_use]
    pub fn goal_board(&self) -> TileBoard {
        let tiles = (0..self.cells())
            .map(|t| u8::try_from(t).unwrap_or(u8::MAX))
            .collect();
        TileBoard { tiles, blank: 0 }
    }

    /// Build a board from `tiles[cell]` values.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotAPermutation`] unless `tiles` holds each of
    /// `0..rows*cols` exactly once.
    pub fn board(&self, tiles: &[u8]) -> Result<TileBoard, BoardError> {
        let cells = self.cells();
        let mut seen = vec![false; cells];
        for &tile in tiles {
            match seen.get_mut(usize::from(tile)) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(BoardError::NotAPermutation { cells }),
            }
        }
        if tiles.len() != cells {
            return Err(BoardError::NotAPermutation { cells });
        }
        let blank = tiles
            .iter()
            .position(|&t| t == 0)
            .ok_or(BoardError::NotAPermutation { cells })?;
        Ok(TileBoard {
            tiles: tiles.to_vec(),
            blank,
        })
    }

    /// Cell the blank reaches by `mv`, if it stays on the board.
    fn target(&self, blank: usize, mv: Move) -> Option<usize> {
        let (row, col) = (blank / self.cols, blank % self.cols);
        match mv {
            Move::Up if row > 0 => Some(blank - self.cols),
            Move::Down if row + 1 < self.rows => Some(blank + self.cols),
            Move::Left if col > 0 => Some(blank - 1),
            Move::Right if col + 1 < self.cols => Some(blank + 1),
            _ => None,
        }
    }

    /// Sum of Manhattan distances of every non-blank tile to its goal cell.
    #[must_use]
    pub fn manhattan(&self, board: &TileBoard) -> u32 {
        let mut total = 0;
        for (cell, &tile) in board.tiles.iter().enumerate() {
            if tile == 0 {
                continue;
            }
            let goal = usize::from(tile);
            let dr = (cell / self.cols).abs_diff(goal / self.cols);
            let dc = (cell % self.cols).abs_diff(goal % self.cols);
            total += dr + dc;
        }
        u32::try_from(total).unwrap_or(u32::MAX)
    }

    /// Random walk of `steps` blank moves from the goal, never immediately
    /// undoing the previous move. Same seed, same board.
    #[must_use]
    pub fn scramble(&self, steps: usize, seed: u64) -> TileBoard {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut board = self.goal_board();
        let mut previous: Option<Move> = None;
        for _ in 0..steps {
            let options: Vec<Move> = self
                .actions(&board)
                .into_iter()
                .filter(|mv| previous != Some(mv.opposite()))
                .collect();
            let Some(&mv) = options.choose(&mut rng) else {
                break;
            };
            self.apply_action(&mut board, &mv);
            previous = Some(mv);
        }
        board
    }

    /// Exact solution length by breadth-first search. `None` when the goal
    /// is unreachable or more than `max_states` states would be visited.
    #[must_use]
    pub fn bfs_optimal_cost(&self, start: &TileBoard, max_states: usize) -> Option<u32> {
        let goal = self.goal_board().packed();
        let mut seen = HashSet::from([start.packed()]);
        let mut queue = VecDeque::from([(start.clone(), 0_u32)]);
        while let Some((board, depth)) = queue.pop_front() {
            if board.packed() == goal {
                return Some(depth);
            }
            for mv in self.actions(&board) {
                let child = self.child_state(&board, &mv);
                if seen.insert(child.packed()) {
                    if seen.len() > max_states {
                        return None;
                    }
                    queue.push_back((child, depth + 1));
                }
            }
        }
        None
    }
}

impl SuccessorRule<TileBoard, Move> for SlidingTilePuzzle {
    fn actions(&self, state: &TileBoard) -> Vec<Move> {
        Move::ALL
            .into_iter()
            .filter(|mv| self.target(state.blank, *mv).is_some())
            .collect()
    }

    fn is_applicable(&self, state: &TileBoard, action: &Move) -> bool {
        self.target(state.blank, *action).is_some()
    }

    fn apply_action(&self, state: &mut TileBoard, action: &Move) {
        if let Some(target) = self.target(state.blank, *action) {
            state.tiles.swap(state.blank, target);
            state.blank = target;
        }
    }

    fn action_cost(&self, _state: &TileBoard, _action: &Move) -> f64 {
        1.0
    }

    fn inverse(&self, _state: &TileBoard, action: &Move) -> Option<Move> {
        Some(action.opposite())
    }

    fn is_valid_state(&self, state: &TileBoard) -> bool {
        self.board(&state.tiles)
            .is_ok_and(|checked| checked.blank == state.blank)
    }
}

impl GoalTest<TileBoard> for SlidingTilePuzzle {
    fn is_goal(&self, state: &TileBoard) -> bool {
        state.blank == 0 && state.tiles.iter().enumerate().all(|(i, &t)| usize::from(t) == i)
    }
}

impl StateHasher<TileBoard> for SlidingTilePuzzle {
    fn hash_value(&self, state: &TileBoard) -> u64 {
        state.packed()
    }

    fn is_perfect(&self) -> bool {
        self.cells() <= MAX_CELLS
    }
}

impl SearchWorld<TileBoard, Move> for SlidingTilePuzzle {
    fn world_id(&self) -> &str {
        &self.id
    }

    fn heuristic(&self, state: &TileBoard) -> Estimate {
        Estimate::new(f64::from(self.manhattan(state)))
    }

    fn describe_action(&self, action: &Move) -> String {
        action.to_string()
    }
}
