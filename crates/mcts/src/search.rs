//! Time-budgeted search driver.
//!
//! [`Mcts`] owns the configuration and the random source, builds a fresh
//! [`Tree`] per call and ranks the root's children once the budget runs out.

use crate::{
    config::SearchConfig,
    rollout::UtilityGoal,
    tree::{Iteration, Tree},
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace, warn};
use uct_core::{GameError, GameState};

/// Errors surfaced by a search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No root child was ever scored above the configured floor,
    /// e.g. the root was terminal or the budget was too small.
    #[error("Search exhausted without finding a move")]
    ExhaustedSearch,

    #[error(transparent)]
    Game(#[from] GameError),
}

/// Statistics for one root move.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveStats<M> {
    pub mv: M,
    pub visits: u32,
    pub mean_score: f64,
}

/// Result of a search.
#[derive(Clone, Debug)]
pub struct SearchResult<M> {
    pub best_move: M,
    /// Mean score of `best_move` from the root player's point of view.
    pub best_score: f64,
    /// Every root move, in the order the game listed them.
    pub children: Vec<MoveStats<M>>,
    pub iterations: u64,
    pub elapsed: Duration,
}

impl<M> SearchResult<M> {
    /// Total visits across the root's children.
    pub fn total_visits(&self) -> u64 {
        self.children.iter().map(|c| c.visits as u64).sum()
    }
}

/// MCTS search engine.
pub struct Mcts<S: GameState, R: Rng> {
    config: SearchConfig,
    rng: R,
    last_tree: Option<Tree<S>>,
}

impl<S: GameState, R: Rng> Mcts<S, R> {
    pub fn new(config: SearchConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            last_tree: None,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The tree built by the most recent search, kept for inspection.
    pub fn last_tree(&self) -> Option<&Tree<S>> {
        self.last_tree.as_ref()
    }

    /// Search from `state` until `time_budget` elapses.
    ///
    /// Playouts stop early once the root player's utility reaches
    /// `utility_goal`; pass `f64::INFINITY` to always play to the end.
    /// The search itself may also stop early when the configured iteration
    /// cap is hit or the root turns out to be terminal.
    pub fn search(
        &mut self,
        state: &S,
        time_budget: Duration,
        utility_goal: f64,
    ) -> Result<SearchResult<S::Move>, SearchError> {
        if state.is_chance() {
            return Err(SearchError::InvalidArgument(
                "cannot search from a chance state".to_string(),
            ));
        }

        let started = Instant::now();
        let deadline = started + time_budget;
        let goal = UtilityGoal::for_threshold(state.current_player(), utility_goal);

        let mut tree = Tree::new(state.clone());
        let mut iterations = 0u64;

        while Instant::now() < deadline {
            if self
                .config
                .max_iterations
                .is_some_and(|cap| iterations >= cap)
            {
                break;
            }

            let outcome = tree.iterate(&self.config, goal, &mut self.rng)?;
            iterations += 1;
            if let Iteration::Credited(id) = outcome {
                trace!(node = id.index(), "descent ended on a terminal node");
            }

            if tree.root().is_terminal() {
                break;
            }
        }

        let elapsed = started.elapsed();
        debug!(
            iterations,
            nodes = tree.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "search finished"
        );

        let result = self.rank_root(&tree, iterations, elapsed);
        self.last_tree = Some(tree);
        result
    }

    /// Like [`Mcts::search`], returning only the chosen move.
    pub fn search_good_move(
        &mut self,
        state: &S,
        time_budget: Duration,
        utility_goal: f64,
    ) -> Result<S::Move, SearchError> {
        self.search(state, time_budget, utility_goal)
            .map(|result| result.best_move)
    }

    fn rank_root(
        &self,
        tree: &Tree<S>,
        iterations: u64,
        elapsed: Duration,
    ) -> Result<SearchResult<S::Move>, SearchError> {
        let mut children = Vec::new();
        let mut best: Option<(usize, f64)> = None;

        for &id in tree.root().child_ids() {
            let node = tree.get(id);
            let Some(mv) = node.causation_move.clone() else {
                continue;
            };
            let visits = node.stats.visit_count;
            let mean_score = node.stats.mean_score();

            if visits > 0 {
                let floor = best.map_or(self.config.initial_best_score, |(_, score)| score);
                if mean_score > floor {
                    best = Some((children.len(), mean_score));
                }
            }

            trace!(mv = ?mv, visits, mean_score, "root child");
            children.push(MoveStats {
                mv,
                visits,
                mean_score,
            });
        }

        let Some((index, best_score)) = best else {
            warn!(
                iterations,
                children = children.len(),
                "no root move scored above the floor"
            );
            return Err(SearchError::ExhaustedSearch);
        };

        debug!(
            best_move = ?children[index].mv,
            best_score,
            root_children = children.len(),
            "ranked root moves"
        );
        Ok(SearchResult {
            best_move: children[index].mv.clone(),
            best_score,
            children,
            iterations,
            elapsed,
        })
    }
}

/// One-shot search with the default configuration.
pub fn search_good_move<S, R>(
    state: &S,
    time_budget: Duration,
    utility_goal: f64,
    rng: &mut R,
) -> Result<S::Move, SearchError>
where
    S: GameState,
    R: Rng + ?Sized,
{
    let seeded = StdRng::from_rng(rng).map_err(|e| {
        SearchError::InvalidArgument(format!("random source failed to seed search: {e}"))
    })?;
    Mcts::new(SearchConfig::default(), seeded).search_good_move(state, time_budget, utility_goal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use uct_games::{Column, Connect4State, Direction, G2048State};

    fn engine<S: GameState>(config: SearchConfig) -> Mcts<S, ChaCha8Rng> {
        Mcts::new(config, ChaCha8Rng::seed_from_u64(42))
    }

    const BUDGET: Duration = Duration::from_secs(30);

    #[test]
    fn test_takes_immediate_win() {
        let state = Connect4State::from_columns(&[0, 1, 0, 1, 0, 1]).unwrap();
        let mut mcts = engine(SearchConfig::for_testing());

        let result = mcts.search(&state, BUDGET, f64::INFINITY).unwrap();

        assert_eq!(result.best_move, Column(0));
        assert!((result.best_score - 1.0).abs() < 1e-12);
        assert_eq!(result.iterations, 500);
        assert_eq!(result.children.len(), 7);
    }

    #[test]
    fn test_terminal_root_is_exhausted() {
        let state = Connect4State::from_columns(&[0, 1, 0, 1, 0, 1, 0]).unwrap();
        let mut mcts = engine(SearchConfig::for_testing());

        let err = mcts.search(&state, BUDGET, f64::INFINITY).unwrap_err();

        assert_eq!(err, SearchError::ExhaustedSearch);
        // Stops as soon as the root is known to be terminal.
        assert_eq!(mcts.last_tree().map(Tree::len), Some(1));
    }

    #[test]
    fn test_chance_root_rejected() {
        let mut state = G2048State::builder().tile(0, 0, 1).build();
        state.apply_move(Direction::Right).unwrap();
        let mut mcts = engine(SearchConfig::for_testing());

        let err = mcts.search(&state, BUDGET, f64::INFINITY).unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
        assert!(mcts.last_tree().is_none());
    }

    #[test]
    fn test_zero_budget_is_exhausted() {
        let mut mcts = engine(SearchConfig::default());
        let err = mcts
            .search(&Connect4State::new(), Duration::ZERO, f64::INFINITY)
            .unwrap_err();
        assert_eq!(err, SearchError::ExhaustedSearch);
    }

    #[test]
    fn test_result_statistics() {
        let mut mcts = engine(SearchConfig::for_testing());
        let result = mcts
            .search(&Connect4State::new(), BUDGET, f64::INFINITY)
            .unwrap();

        // Every iteration on a fresh position credits exactly one root child.
        assert_eq!(result.total_visits(), result.iterations);
        let moves: Vec<Column> = result.children.iter().map(|c| c.mv).collect();
        assert_eq!(moves, (0..7).map(Column).collect::<Vec<_>>());

        let tree = mcts.last_tree().unwrap();
        assert_eq!(tree.root().stats.visit_count, 0);
    }

    #[test]
    fn test_same_seed_same_move() {
        let state = Connect4State::from_columns(&[3, 3, 2]).unwrap();
        let config = SearchConfig::for_testing();

        let a = engine(config.clone()).search(&state, BUDGET, f64::INFINITY).unwrap();
        let b = engine(config).search(&state, BUDGET, f64::INFINITY).unwrap();

        assert_eq!(a.best_move, b.best_move);
        assert_eq!(a.children, b.children);
    }

    #[test]
    fn test_floor_above_every_mean_is_exhausted() {
        // Means never exceed 1.0, so nothing clears this floor.
        let mut config = SearchConfig::historical().with_max_iterations(50);
        config.initial_best_score = 2.0;
        let mut mcts = engine(config);

        let err = mcts
            .search(&Connect4State::new(), BUDGET, f64::INFINITY)
            .unwrap_err();
        assert_eq!(err, SearchError::ExhaustedSearch);
    }

    #[test]
    fn test_free_function_uses_defaults() {
        let state = Connect4State::from_columns(&[0, 1, 0, 1, 0, 1]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let mv = search_good_move(&state, Duration::from_millis(200), f64::INFINITY, &mut rng)
            .unwrap();
        assert_eq!(mv, Column(0));
    }
}
