//! Search configuration parameters.
//!
//! Values can come from code (builders and presets), from a TOML file, and
//! from `UCT_*` environment variables, in increasing order of priority.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Prefix of the environment variables read by [`SearchConfig::apply_env_overrides`].
pub const ENV_PREFIX: &str = "UCT_";

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// How moves are picked during a playout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutPolicy {
    /// Ask the game for its heuristic move (`GameState::suggested_move`).
    #[default]
    Suggested,
    /// Pick uniformly among the legal moves, ignoring any game heuristic.
    UniformRandom,
}

/// How equal UCT scores are resolved during selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakRule {
    /// Keep the first child (in move order) reaching the best score.
    #[default]
    FirstEncountered,
    /// Choose uniformly among all children sharing the best score.
    Random,
}

impl FromStr for RolloutPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suggested" => Ok(Self::Suggested),
            "uniform_random" | "random" => Ok(Self::UniformRandom),
            _ => Err(ConfigError::InvalidValue {
                key: "rollout_policy".into(),
                value: s.into(),
            }),
        }
    }
}

impl FromStr for TieBreakRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first_encountered" | "first" => Ok(Self::FirstEncountered),
            "random" => Ok(Self::Random),
            _ => Err(ConfigError::InvalidValue {
                key: "tie_break".into(),
                value: s.into(),
            }),
        }
    }
}

/// Configuration for the UCT search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Exploration constant `C` in `mean + C * sqrt(ln(N_parent) / N_child)`.
    pub exploration_constant: f64,

    /// Move choice during playouts.
    pub rollout_policy: RolloutPolicy,

    /// Resolution of equal UCT scores.
    pub tie_break: TieBreakRule,

    /// Score a root child's mean must beat to be returned as the best move.
    /// `-inf` accepts any visited child; `-1.0` reproduces the older behavior
    /// of ignoring children whose mean never exceeds a loss.
    pub initial_best_score: f64,

    /// Extra descents attempted within one iteration when a descent ends on a
    /// terminal node. Every terminal reached is credited.
    pub max_terminal_retries: u32,

    /// Stop after this many iterations even if time remains.
    pub max_iterations: Option<u64>,

    /// Abandon a playout after this many transitions and score the state reached.
    pub max_rollout_moves: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration_constant: std::f64::consts::SQRT_2,
            rollout_policy: RolloutPolicy::Suggested,
            tie_break: TieBreakRule::FirstEncountered,
            initial_best_score: f64::NEG_INFINITY,
            max_terminal_retries: 0,
            max_iterations: None,
            max_rollout_moves: None,
        }
    }
}

/// Applies `$lookup(key)` to a config field when present and parseable.
macro_rules! override_field {
    ($config:expr, $lookup:expr, $field:ident, $key:expr) => {
        if let Some(raw) = $lookup($key) {
            $config.$field = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: $key.into(),
                value: raw.clone(),
            })?;
        }
    };
    ($config:expr, $lookup:expr, $field:ident, $key:expr, optional) => {
        if let Some(raw) = $lookup($key) {
            $config.$field = match raw.trim() {
                "" | "none" => None,
                v => Some(v.parse().map_err(|_| ConfigError::InvalidValue {
                    key: $key.into(),
                    value: raw.clone(),
                })?),
            };
        }
    };
}

impl SearchConfig {
    /// A small, deterministic configuration for tests.
    pub fn for_testing() -> Self {
        Self {
            max_iterations: Some(500),
            ..Default::default()
        }
    }

    /// The behavior of the earliest engine variant: uniformly random playouts
    /// and `-1` as the initial best score when ranking moves.
    pub fn historical() -> Self {
        Self {
            rollout_policy: RolloutPolicy::UniformRandom,
            initial_best_score: -1.0,
            ..Default::default()
        }
    }

    /// Builder pattern: set the exploration constant.
    pub fn with_exploration_constant(mut self, c: f64) -> Self {
        self.exploration_constant = c;
        self
    }

    /// Builder pattern: set the rollout policy.
    pub fn with_rollout_policy(mut self, policy: RolloutPolicy) -> Self {
        self.rollout_policy = policy;
        self
    }

    /// Builder pattern: set the tie-break rule.
    pub fn with_tie_break(mut self, rule: TieBreakRule) -> Self {
        self.tie_break = rule;
        self
    }

    /// Builder pattern: cap the number of iterations.
    pub fn with_max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Builder pattern: cap playout length.
    pub fn with_max_rollout_moves(mut self, n: usize) -> Self {
        self.max_rollout_moves = Some(n);
        self
    }

    /// Builder pattern: set terminal re-descent attempts.
    pub fn with_max_terminal_retries(mut self, n: u32) -> Self {
        self.max_terminal_retries = n;
        self
    }

    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `UCT_<FIELD>` environment variable overrides.
    ///
    /// ```text
    /// UCT_EXPLORATION_CONSTANT=1.0
    /// UCT_ROLLOUT_POLICY=uniform_random
    /// UCT_MAX_ITERATIONS=none
    /// ```
    pub fn apply_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides_from(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Apply overrides from an arbitrary key lookup (keys without prefix).
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_field!(self, lookup, exploration_constant, "EXPLORATION_CONSTANT");
        override_field!(self, lookup, rollout_policy, "ROLLOUT_POLICY");
        override_field!(self, lookup, tie_break, "TIE_BREAK");
        override_field!(self, lookup, initial_best_score, "INITIAL_BEST_SCORE");
        override_field!(self, lookup, max_terminal_retries, "MAX_TERMINAL_RETRIES");
        override_field!(self, lookup, max_iterations, "MAX_ITERATIONS", optional);
        override_field!(self, lookup, max_rollout_moves, "MAX_ROLLOUT_MOVES", optional);
        self.validate()?;
        Ok(self)
    }

    /// Reject values the search cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "exploration_constant".into(),
                value: self.exploration_constant.to_string(),
            });
        }
        if self.initial_best_score.is_nan() {
            return Err(ConfigError::InvalidValue {
                key: "initial_best_score".into(),
                value: "NaN".into(),
            });
        }
        Ok(())
    }
}
