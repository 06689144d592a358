use crate::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt::Debug;

/// Numeric identity of the party to move.
///
/// Real players are numbered `1..=player_count()`; [`CHANCE_PLAYER`] marks a
/// state whose next transition is resolved by weighted randomness.
pub type PlayerId = usize;

/// The pseudo-player that owns chance states.
pub const CHANCE_PLAYER: PlayerId = 0;

/// State of a turn-based, possibly multi-player, possibly nondeterministic game.
///
/// This trait is the only thing the search engine knows about a game. States
/// are mutated in place and cloned whenever the search needs an independent
/// copy, so cloning must be a deep copy (including any [`CachedSlot`] contents).
///
/// [`CachedSlot`]: crate::CachedSlot
pub trait GameState: Clone {
    /// A non-random move made by a real player.
    type Move: Clone + Debug + PartialEq;

    /// Number of real players. Never changes during the course of a playout.
    fn player_count(&self) -> usize;

    /// The player to move, or [`CHANCE_PLAYER`] for a chance state.
    fn current_player(&self) -> PlayerId;

    /// Whether the next transition is a chance outcome.
    fn is_chance(&self) -> bool {
        self.current_player() == CHANCE_PLAYER
    }

    /// Legal moves for the current player.
    ///
    /// An empty vector means there is no legal move; this may or may not
    /// coincide with [`terminated`](Self::terminated).
    ///
    /// # Errors
    /// `GameError::InvalidState` if this is a chance state.
    fn possible_moves(&self) -> Result<Vec<Self::Move>>;

    /// Successor states of a chance state paired with their probabilities.
    ///
    /// Probabilities are expected to sum to one, but callers must not rely on
    /// exact normalization.
    ///
    /// # Errors
    /// `GameError::InvalidState` if this is not a chance state.
    fn next_chance_outcomes(&self) -> Result<Vec<(Self, f64)>>;

    /// Whether the game has ended.
    fn terminated(&self) -> bool;

    /// Reward of `player` at this state. Final once [`terminated`](Self::terminated)
    /// is true; before that it may serve as a partial heuristic.
    fn utility(&self, player: PlayerId) -> f64;

    /// Rewards of all players indexed by player id. Index 0 belongs to the
    /// chance pseudo-player and is always zero.
    fn utilities(&self) -> Vec<f64> {
        (0..=self.player_count())
            .map(|p| if p == CHANCE_PLAYER { 0.0 } else { self.utility(p) })
            .collect()
    }

    /// Apply a player move in place.
    ///
    /// Implementations must invalidate their cached slots before returning.
    ///
    /// # Errors
    /// - `GameError::InvalidState` if this is a chance state.
    /// - `GameError::IllegalArgument` if `mv` is not currently legal.
    fn apply_move(&mut self, mv: Self::Move) -> Result<()>;

    /// Resolve the pending chance event in place by sampling one outcome.
    ///
    /// Implementations must invalidate their cached slots before returning.
    ///
    /// # Errors
    /// `GameError::InvalidState` if this is not a chance state, or if the
    /// chance state has no outcome left.
    fn apply_chance_outcome<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()>;

    /// A cheap, possibly heuristic, choice among the legal moves. Used by playouts.
    ///
    /// Returns `None` when there is no legal move. The default picks uniformly
    /// at random.
    fn suggested_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Option<Self::Move>> {
        Ok(self.possible_moves()?.choose(rng).cloned())
    }
}
