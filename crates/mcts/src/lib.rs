//! Monte Carlo Tree Search over any [`uct_core::GameState`].
//!
//! The engine builds an arena tree from a root state, repeatedly descends it
//! with UCT selection, expands one leaf, plays out to the end of the game and
//! credits the result back up the path. Chance states are supported: their
//! children are sampled by probability instead of scored.
//!
//! # Features
//!
//! - **Generic**: works with any `GameState`, any number of players
//! - **UCT selection**: `mean + C * sqrt(ln N / n)`, configurable `C`
//! - **Chance nodes**: weighted sampling over outcomes
//! - **Goal-seeking playouts**: stop a playout once a utility threshold is passed
//! - **Time budget**: searches run until a wall-clock deadline, optionally
//!   capped by an iteration count
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use uct_games::{Column, Connect4State};
//! use uct_mcts::{Mcts, SearchConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! // X has three in column 0 and is to move.
//! let state = Connect4State::from_columns(&[0, 1, 0, 1, 0, 1]).unwrap();
//!
//! let config = SearchConfig::for_testing();
//! let mut mcts = Mcts::new(config, ChaCha8Rng::seed_from_u64(42));
//!
//! let result = mcts
//!     .search(&state, Duration::from_secs(10), f64::INFINITY)
//!     .unwrap();
//! assert_eq!(result.best_move, Column(0));
//! println!("searched {} iterations", result.iterations);
//! ```

pub mod config;
mod node;
pub mod rollout;
pub mod search;
mod tree;
mod weighted;

pub use config::{ConfigError, RolloutPolicy, SearchConfig, TieBreakRule};
pub use node::{Children, Node, NodeId, NodeStats};
pub use rollout::{playout, UtilityGoal};
pub use search::{search_good_move, Mcts, MoveStats, SearchError, SearchResult};
pub use tree::{Descent, Iteration, Tree};
pub use weighted::WeightedTable;
