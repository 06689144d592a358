//! UCT Core - Game state contract and shared infrastructure
//!
//! This crate defines what the search engine requires from a game, and the
//! memoization utility game states use to stay cheap to clone and mutate.
//!
//! # Types
//!
//! - [`GameState`] - Trait every game state implements
//! - [`CachedSlot`] - Lazy value with invalidate-on-mutate, copy-on-clone semantics
//! - [`GameError`] - Contract violations reported by game states

mod cached;
mod error;
mod game;

pub use cached::{CachedSlot, Invalidate};
pub use error::{GameError, Result};
pub use game::{GameState, PlayerId, CHANCE_PLAYER};
