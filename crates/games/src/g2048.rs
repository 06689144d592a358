//! 2048 on a 4x4 board, played by a single player against random spawns.
//!
//! Tiles are stored as exponents: 1 is a "2" tile, 2 a "4", and so on, with 0
//! for an empty cell. Every player move is followed by a chance state that
//! drops a new tile (exponent 1 with probability 0.9, otherwise 2) on a
//! uniformly chosen empty cell.
//!
//! The utility is the number of transitions survived divided by 2048, so a
//! longer game is a better game.

use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use uct_core::{CachedSlot, GameError, GameState, Invalidate, PlayerId, Result, CHANCE_PLAYER};

pub const SIZE: usize = 4;

const PLAYER: PlayerId = 1;

/// Spawned exponents and their probabilities.
const SPAWNS: [(u8, f64); 2] = [(1, 0.9), (2, 0.1)];

/// Largest exponent whose tile value fits in a `u32`.
pub const MAX_EXPONENT: u8 = 31;

type Board = [[u8; SIZE]; SIZE];

/// Slide direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
    ];

    /// Board coordinates of the `i`-th cell of `line`, counted from the edge
    /// tiles slide towards.
    fn cell(self, line: usize, i: usize) -> (usize, usize) {
        match self {
            Direction::Left => (line, i),
            Direction::Right => (line, SIZE - 1 - i),
            Direction::Up => (i, line),
            Direction::Down => (SIZE - 1 - i, line),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Left => "left",
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
        };
        f.write_str(name)
    }
}

/// 2048 position.
#[derive(Clone, Debug)]
pub struct G2048State {
    board: Board,
    current: PlayerId,
    moves_made: u32,
    /// Board after each legal slide, in [`Direction::ALL`] order.
    next_boards: CachedSlot<Vec<(Direction, Board)>>,
    terminated: CachedSlot<bool>,
}

impl G2048State {
    fn from_board(board: Board) -> Self {
        Self {
            board,
            current: PLAYER,
            moves_made: 0,
            next_boards: CachedSlot::new(),
            terminated: CachedSlot::new(),
        }
    }

    /// Start a position from hand-placed tiles.
    pub fn builder() -> G2048Builder {
        G2048Builder::default()
    }

    /// Empty board with two random tiles, player to move.
    pub fn random_start<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        let mut state = Self::from_board([[0; SIZE]; SIZE]);
        for _ in 0..2 {
            state.current = CHANCE_PLAYER;
            state.apply_chance_outcome(rng)?;
        }
        state.moves_made = 0;
        Ok(state)
    }

    /// Tile value at a cell (2, 4, 8, ...), or 0 when empty. Saturates at
    /// `u32::MAX` past `MAX_EXPONENT`.
    pub fn tile(&self, row: usize, col: usize) -> u32 {
        match self.board[row][col] {
            0 => 0,
            exponent => 1u32.checked_shl(u32::from(exponent)).unwrap_or(u32::MAX),
        }
    }

    pub fn max_tile(&self) -> u32 {
        (0..SIZE)
            .flat_map(|row| (0..SIZE).map(move |col| (row, col)))
            .map(|(row, col)| self.tile(row, col))
            .max()
            .unwrap_or(0)
    }

    /// Player moves and spawns applied so far.
    pub fn moves_made(&self) -> u32 {
        self.moves_made
    }

    fn empty_cells(&self) -> Vec<(usize, usize)> {
        empty_cells(&self.board)
    }

    fn next_boards(&self) -> &[(Direction, Board)] {
        self.next_boards.get_or_compute(|| {
            Direction::ALL
                .iter()
                .filter_map(|&dir| slide(&self.board, dir).map(|board| (dir, board)))
                .collect()
        })
    }

    fn compute_terminated(&self) -> bool {
        let full = self.board.iter().flatten().all(|&v| v != 0);
        if self.current == CHANCE_PLAYER || !full {
            return full;
        }
        for i in 0..SIZE {
            for j in 1..SIZE {
                let horizontal = self.board[i][j] == self.board[i][j - 1];
                let vertical = self.board[j][i] == self.board[j - 1][i];
                if horizontal || vertical {
                    return false;
                }
            }
        }
        true
    }

    /// Place a spawned tile and hand the turn back to the player.
    fn spawn(&mut self, row: usize, col: usize, exponent: u8) {
        self.board[row][col] = exponent;
        self.current = PLAYER;
        self.moves_made += 1;
        self.invalidate();
    }

    fn require_chance(&self) -> Result<()> {
        if self.current == CHANCE_PLAYER {
            Ok(())
        } else {
            Err(GameError::invalid_state("not a chance state"))
        }
    }

    fn require_player(&self) -> Result<()> {
        if self.current == CHANCE_PLAYER {
            Err(GameError::invalid_state("state is a chance state"))
        } else {
            Ok(())
        }
    }
}

impl PartialEq for G2048State {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board
            && self.current == other.current
            && self.moves_made == other.moves_made
    }
}

impl Invalidate for G2048State {
    fn invalidate(&mut self) {
        self.next_boards.invalidate();
        self.terminated.invalidate();
    }
}

impl GameState for G2048State {
    type Move = Direction;

    fn player_count(&self) -> usize {
        1
    }

    fn current_player(&self) -> PlayerId {
        self.current
    }

    fn possible_moves(&self) -> Result<Vec<Direction>> {
        self.require_player()?;
        Ok(self.next_boards().iter().map(|&(dir, _)| dir).collect())
    }

    fn next_chance_outcomes(&self) -> Result<Vec<(Self, f64)>> {
        self.require_chance()?;
        let empty = self.empty_cells();
        let share = 1.0 / empty.len() as f64;

        let mut outcomes = Vec::with_capacity(empty.len() * SPAWNS.len());
        for &(row, col) in &empty {
            for &(exponent, probability) in &SPAWNS {
                let mut next = self.clone();
                next.spawn(row, col, exponent);
                outcomes.push((next, probability * share));
            }
        }
        Ok(outcomes)
    }

    fn terminated(&self) -> bool {
        *self.terminated.get_or_compute(|| self.compute_terminated())
    }

    fn utility(&self, player: PlayerId) -> f64 {
        if player == PLAYER {
            self.moves_made as f64 / 2048.0
        } else {
            0.0
        }
    }

    fn apply_move(&mut self, mv: Direction) -> Result<()> {
        self.require_player()?;
        let board = match self.next_boards.get() {
            Some(boards) => boards.iter().find(|&&(dir, _)| dir == mv).map(|&(_, b)| b),
            None => slide(&self.board, mv),
        }
        .ok_or_else(|| GameError::illegal_argument(format!("cannot slide {}", mv)))?;

        self.board = board;
        self.current = CHANCE_PLAYER;
        self.moves_made += 1;
        self.invalidate();
        Ok(())
    }

    fn apply_chance_outcome<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.require_chance()?;
        let &(row, col) = self
            .empty_cells()
            .choose(rng)
            .ok_or_else(|| GameError::invalid_state("no empty cell to spawn into"))?;
        let exponent = if rng.gen::<f64>() < SPAWNS[0].1 {
            SPAWNS[0].0
        } else {
            SPAWNS[1].0
        };
        self.spawn(row, col, exponent);
        Ok(())
    }

    /// The slide that leaves the most empty cells; earlier directions win ties.
    fn suggested_move<R: Rng + ?Sized>(&self, _rng: &mut R) -> Result<Option<Direction>> {
        self.require_player()?;
        let mut best: Option<(Direction, usize)> = None;
        for (dir, board) in self.next_boards() {
            let empty = empty_cells(board).len();
            if best.map_or(true, |(_, most)| empty > most) {
                best = Some((*dir, empty));
            }
        }
        Ok(best.map(|(dir, _)| dir))
    }
}

impl fmt::Display for G2048State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..SIZE {
            for col in 0..SIZE {
                match self.tile(row, col) {
                    0 => write!(f, "{:>6}", ".")?,
                    value => write!(f, "{:>6}", value)?,
                }
            }
            if row + 1 < SIZE {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Hand-placed starting position with the player to move.
#[derive(Clone, Debug, Default)]
pub struct G2048Builder {
    board: Board,
}

impl G2048Builder {
    /// Put a tile with the given exponent (1 = "2", 2 = "4", ...) on a cell.
    /// Exponents above `MAX_EXPONENT` are clamped.
    pub fn tile(mut self, row: usize, col: usize, exponent: u8) -> Self {
        self.board[row][col] = exponent.min(MAX_EXPONENT);
        self
    }

    pub fn build(self) -> G2048State {
        G2048State::from_board(self.board)
    }
}

fn empty_cells(board: &Board) -> Vec<(usize, usize)> {
    let mut cells = Vec::new();
    for (row, line) in board.iter().enumerate() {
        for (col, &v) in line.iter().enumerate() {
            if v == 0 {
                cells.push((row, col));
            }
        }
    }
    cells
}

/// Slide and merge every line towards `dir`. None if nothing moves.
///
/// A tile produced by a merge does not merge again in the same slide.
fn slide(board: &Board, dir: Direction) -> Option<Board> {
    let mut next = [[0u8; SIZE]; SIZE];
    for line in 0..SIZE {
        let mut out = 0;
        let mut merged_last = false;
        for i in 0..SIZE {
            let (r, c) = dir.cell(line, i);
            let value = board[r][c];
            if value == 0 {
                continue;
            }
            if out > 0 && !merged_last {
                let (pr, pc) = dir.cell(line, out - 1);
                if next[pr][pc] == value {
                    next[pr][pc] = value.saturating_add(1);
                    merged_last = true;
                    continue;
                }
            }
            let (nr, nc) = dir.cell(line, out);
            next[nr][nc] = value;
            out += 1;
            merged_last = false;
        }
    }
    (next != *board).then_some(next)
}
