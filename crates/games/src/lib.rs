//! Sample games for the UCT engine.
//!
//! - [`Connect4State`]: two players, deterministic, win/lose/draw utilities.
//! - [`G2048State`]: one player against random tile spawns, exercising
//!   chance states and goal-seeking playouts.

pub mod connect4;
pub mod g2048;

pub use connect4::{Column, Connect4State};
pub use g2048::{Direction, G2048Builder, G2048State};
