//! Connect Four on the standard 6x7 board.
//!
//! Player 1 (X) moves first. Discs drop to the lowest free row of a column;
//! four in a row horizontally, vertically or diagonally wins.

use rand::Rng;
use std::fmt;
use uct_core::{CachedSlot, GameError, GameState, Invalidate, PlayerId, Result};

pub const ROWS: usize = 6;
pub const COLS: usize = 7;

const FIRST: PlayerId = 1;
const SECOND: PlayerId = 2;

/// Line directions checked for four in a row: (row step, column step).
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Drop a disc into a column, numbered 0 to 6 from the left.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct Column(pub u8);

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Col {}", self.0)
    }
}

/// Connect Four position.
#[derive(Clone, Debug)]
pub struct Connect4State {
    /// Row 0 is the bottom row. 0 = empty, otherwise the owning player.
    board: [[u8; COLS]; ROWS],
    current: PlayerId,
    winner: CachedSlot<Option<PlayerId>>,
    moves: CachedSlot<Vec<Column>>,
}

impl Connect4State {
    /// Empty board with player 1 to move.
    pub fn new() -> Self {
        Self {
            board: [[0; COLS]; ROWS],
            current: FIRST,
            winner: CachedSlot::new(),
            moves: CachedSlot::new(),
        }
    }

    /// Play the given columns in order from the empty board.
    pub fn from_columns(columns: &[u8]) -> Result<Self> {
        let mut state = Self::new();
        for &col in columns {
            state.apply_move(Column(col))?;
        }
        Ok(state)
    }

    /// Owner of a cell, if any. Row 0 is the bottom.
    pub fn cell(&self, row: usize, col: usize) -> Option<PlayerId> {
        match self.board[row][col] {
            0 => None,
            p => Some(p as PlayerId),
        }
    }

    /// The player with four in a row, if any.
    pub fn winner(&self) -> Option<PlayerId> {
        *self.winner.get_or_compute(|| self.find_winner())
    }

    fn find_winner(&self) -> Option<PlayerId> {
        for row in 0..ROWS {
            for col in 0..COLS {
                let owner = self.board[row][col];
                if owner == 0 {
                    continue;
                }
                for &(dr, dc) in &DIRECTIONS {
                    if self.run_length(row, col, dr, dc, owner) >= 4 {
                        return Some(owner as PlayerId);
                    }
                }
            }
        }
        None
    }

    fn run_length(&self, row: usize, col: usize, dr: isize, dc: isize, owner: u8) -> usize {
        let mut len = 0;
        let (mut r, mut c) = (row as isize, col as isize);
        while (0..ROWS as isize).contains(&r)
            && (0..COLS as isize).contains(&c)
            && self.board[r as usize][c as usize] == owner
        {
            len += 1;
            if len == 4 {
                break;
            }
            r += dr;
            c += dc;
        }
        len
    }

    fn legal_columns(&self) -> &[Column] {
        self.moves.get_or_compute(|| {
            if self.winner().is_some() {
                return Vec::new();
            }
            (0..COLS)
                .filter(|&c| self.board[ROWS - 1][c] == 0)
                .map(|c| Column(c as u8))
                .collect()
        })
    }
}

impl Default for Connect4State {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Connect4State {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board && self.current == other.current
    }
}

impl Eq for Connect4State {}

impl Invalidate for Connect4State {
    fn invalidate(&mut self) {
        self.winner.invalidate();
        self.moves.invalidate();
    }
}

impl GameState for Connect4State {
    type Move = Column;

    fn player_count(&self) -> usize {
        2
    }

    fn current_player(&self) -> PlayerId {
        self.current
    }

    fn possible_moves(&self) -> Result<Vec<Column>> {
        Ok(self.legal_columns().to_vec())
    }

    fn next_chance_outcomes(&self) -> Result<Vec<(Self, f64)>> {
        Err(GameError::invalid_state("Connect Four has no chance states"))
    }

    fn terminated(&self) -> bool {
        self.winner().is_some() || self.legal_columns().is_empty()
    }

    fn utility(&self, player: PlayerId) -> f64 {
        match self.winner() {
            Some(winner) if winner == player => 1.0,
            Some(_) => -1.0,
            None => 0.0,
        }
    }

    fn apply_move(&mut self, mv: Column) -> Result<()> {
        if self.winner().is_some() {
            return Err(GameError::invalid_state("game already won"));
        }
        let col = mv.0 as usize;
        if col >= COLS {
            return Err(GameError::illegal_argument(format!("no such column: {}", mv.0)));
        }
        let row = (0..ROWS)
            .find(|&r| self.board[r][col] == 0)
            .ok_or_else(|| GameError::illegal_argument(format!("column {} is full", mv.0)))?;

        self.board[row][col] = self.current as u8;
        self.current = if self.current == FIRST { SECOND } else { FIRST };
        self.invalidate();
        Ok(())
    }

    fn apply_chance_outcome<R: Rng + ?Sized>(&mut self, _rng: &mut R) -> Result<()> {
        Err(GameError::invalid_state("Connect Four has no chance states"))
    }
}

impl fmt::Display for Connect4State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..ROWS).rev() {
            for col in 0..COLS {
                let symbol = match self.board[row][col] {
                    1 => 'X',
                    2 => 'O',
                    _ => '.',
                };
                write!(f, " {}", symbol)?;
            }
            writeln!(f)?;
        }
        write!(f, " 0 1 2 3 4 5 6")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_initial_state() {
        let state = Connect4State::new();
        assert_eq!(state.current_player(), 1);
        assert_eq!(state.player_count(), 2);
        assert!(!state.is_chance());
        assert!(!state.terminated());
        assert_eq!(state.possible_moves().unwrap().len(), 7);
        assert_eq!(state.utilities(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_discs_stack_and_turns_alternate() {
        let state = Connect4State::from_columns(&[3, 3, 3]).unwrap();
        assert_eq!(state.cell(0, 3), Some(1));
        assert_eq!(state.cell(1, 3), Some(2));
        assert_eq!(state.cell(2, 3), Some(1));
        assert_eq!(state.cell(3, 3), None);
        assert_eq!(state.current_player(), 2);
    }

    #[test]
    fn test_vertical_win() {
        let state = Connect4State::from_columns(&[0, 1, 0, 1, 0, 1, 0]).unwrap();
        assert_eq!(state.winner(), Some(1));
        assert!(state.terminated());
        assert!(state.possible_moves().unwrap().is_empty());
        assert_eq!(state.utilities(), vec![0.0, 1.0, -1.0]);
    }

    #[test]
    fn test_horizontal_win() {
        let state = Connect4State::from_columns(&[0, 0, 1, 1, 2, 2, 3]).unwrap();
        assert_eq!(state.winner(), Some(1));
    }

    #[test]
    fn test_diagonal_wins() {
        // X climbs from (0,0) to (3,3).
        let rising = Connect4State::from_columns(&[0, 1, 1, 2, 2, 3, 2, 3, 3, 6, 3]).unwrap();
        assert_eq!(rising.winner(), Some(1));

        // X descends from (3,0) to (0,3).
        let falling = Connect4State::from_columns(&[3, 2, 2, 1, 1, 0, 1, 0, 0, 6, 0]).unwrap();
        assert_eq!(falling.winner(), Some(1));
    }

    #[test]
    fn test_second_player_win() {
        let state = Connect4State::from_columns(&[6, 0, 5, 0, 6, 0, 5, 0]).unwrap();
        assert_eq!(state.winner(), Some(2));
        assert_eq!(state.utility(1), -1.0);
        assert_eq!(state.utility(2), 1.0);
    }

    #[test]
    fn test_move_after_win_is_invalid_state() {
        let mut state = Connect4State::from_columns(&[0, 1, 0, 1, 0, 1, 0]).unwrap();
        let err = state.apply_move(Column(2)).unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    #[test]
    fn test_illegal_columns() {
        let mut state = Connect4State::from_columns(&[4, 4, 4, 4, 4, 4]).unwrap();
        assert!(!state.possible_moves().unwrap().contains(&Column(4)));

        let full = state.apply_move(Column(4)).unwrap_err();
        assert!(matches!(full, GameError::IllegalArgument(_)));

        let out_of_range = state.apply_move(Column(7)).unwrap_err();
        assert!(matches!(out_of_range, GameError::IllegalArgument(_)));

        // Failed moves leave the position untouched.
        assert_eq!(state.current_player(), 1);
    }

    #[test]
    fn test_draw_on_full_board() {
        // Columns filled in pairs so no four ever line up.
        let order = [0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 2, 3, 2, 3, 2, 3, 3, 2, 3, 2, 3, 2, 4, 5,
            4, 5, 4, 5, 5, 4, 5, 4, 5, 4, 6, 6, 6, 6, 6, 6];
        let state = Connect4State::from_columns(&order).unwrap();
        assert_eq!(state.winner(), None);
        assert!(state.terminated());
        assert_eq!(state.utilities(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_chance_operations_rejected() {
        let mut state = Connect4State::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            state.next_chance_outcomes(),
            Err(GameError::InvalidState(_))
        ));
        assert!(matches!(
            state.apply_chance_outcome(&mut rng),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = Connect4State::from_columns(&[3]).unwrap();
        assert_eq!(original.possible_moves().unwrap().len(), 7);

        let copy = original.clone();
        for _ in 0..5 {
            original.apply_move(Column(3)).unwrap();
        }

        assert_eq!(original.possible_moves().unwrap().len(), 6);
        assert_eq!(copy.possible_moves().unwrap().len(), 7);
        assert_eq!(copy.cell(1, 3), None);
    }

    #[test]
    fn test_suggested_move_is_legal() {
        let state = Connect4State::from_columns(&[4, 4, 4, 4, 4, 4]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let mv = state.suggested_move(&mut rng).unwrap().unwrap();
            assert_ne!(mv, Column(4));
        }
    }

    #[test]
    fn test_display() {
        let state = Connect4State::from_columns(&[0, 6]).unwrap();
        let text = state.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[5], " X . . . . . O");
        assert_eq!(Column(2).to_string(), "Col 2");
    }
}
