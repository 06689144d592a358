use thiserror::Error;

/// Errors raised by game states when the contract is violated by the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    /// The operation does not apply to the state's current mode
    /// (e.g. asking a chance state for its legal moves).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A move that is not currently legal was applied.
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),
}

impl GameError {
    /// Shorthand for [`GameError::InvalidState`].
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Shorthand for [`GameError::IllegalArgument`].
    pub fn illegal_argument(msg: impl Into<String>) -> Self {
        Self::IllegalArgument(msg.into())
    }
}

/// Convenience Result type for game state operations
pub type Result<T> = std::result::Result<T, GameError>;
