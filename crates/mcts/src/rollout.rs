//! Playouts used to estimate the value of a leaf.
//!
//! A playout clones the leaf state and advances it until the game ends:
//! chance states resolve themselves, player states take a move chosen by the
//! configured [`RolloutPolicy`]. No learned evaluation is involved.

use crate::config::RolloutPolicy;
use rand::seq::SliceRandom;
use rand::Rng;
use uct_core::{GameState, PlayerId, Result};

/// Early-exit target for goal-seeking playouts.
///
/// The playout stops as soon as `utility(player)` exceeds `threshold`,
/// instead of playing on to the end of the game.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UtilityGoal {
    pub player: PlayerId,
    pub threshold: f64,
}

impl UtilityGoal {
    pub fn new(player: PlayerId, threshold: f64) -> Self {
        Self { player, threshold }
    }

    /// A goal for `player`, or None if `threshold` can never be exceeded.
    pub fn for_threshold(player: PlayerId, threshold: f64) -> Option<Self> {
        (threshold < f64::INFINITY).then(|| Self::new(player, threshold))
    }

    #[inline]
    fn reached<S: GameState>(&self, state: &S) -> bool {
        state.utility(self.player) > self.threshold
    }
}

/// Play `start` out and return the utilities of the final state.
///
/// Stops when the state terminates, when the player to move has no move,
/// when `goal` is reached, or after `max_moves` transitions.
pub fn playout<S, R>(
    start: &S,
    policy: RolloutPolicy,
    goal: Option<UtilityGoal>,
    max_moves: Option<usize>,
    rng: &mut R,
) -> Result<Vec<f64>>
where
    S: GameState,
    R: Rng + ?Sized,
{
    let mut state = start.clone();
    let mut moves = 0usize;

    while !state.terminated() {
        if max_moves.is_some_and(|max| moves >= max) {
            break;
        }

        if state.is_chance() {
            state.apply_chance_outcome(rng)?;
        } else {
            let mv = match policy {
                RolloutPolicy::Suggested => state.suggested_move(rng)?,
                RolloutPolicy::UniformRandom => state.possible_moves()?.choose(rng).cloned(),
            };
            let Some(mv) = mv else {
                break;
            };
            state.apply_move(mv)?;
        }
        moves += 1;

        if goal.is_some_and(|g| g.reached(&state)) {
            break;
        }
    }

    Ok(state.utilities())
}
