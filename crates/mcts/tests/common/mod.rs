//! Hand-scripted game trees for exercising the engine on exact shapes.
//!
//! A script is a flat list of steps; moves and chance outcomes point at the
//! index of the step they lead to. Step 0 is the root.

#![allow(dead_code)]

use rand::Rng;
use std::rc::Rc;
use uct_core::{GameError, GameState, PlayerId, Result, CHANCE_PLAYER};

#[derive(Clone, Debug)]
pub enum Step {
    /// `player` picks one of `moves`: (move label, next step).
    Decide {
        player: PlayerId,
        moves: Vec<(u8, usize)>,
    },
    /// Nature picks one of `outcomes`: (next step, probability).
    Chance { outcomes: Vec<(usize, f64)> },
    /// Game over. `utilities[p]` is player p's reward; index 0 is unused.
    End { utilities: Vec<f64> },
}

#[derive(Clone, Debug)]
pub struct Scripted {
    steps: Rc<Vec<Step>>,
    players: usize,
    at: usize,
}

impl Scripted {
    pub fn new(players: usize, steps: Vec<Step>) -> Self {
        Self {
            steps: Rc::new(steps),
            players,
            at: 0,
        }
    }

    /// Index of the step this state sits on.
    pub fn at(&self) -> usize {
        self.at
    }

    fn step(&self) -> &Step {
        &self.steps[self.at]
    }

    fn moved_to(&self, at: usize) -> Self {
        Self {
            steps: Rc::clone(&self.steps),
            players: self.players,
            at,
        }
    }
}

impl PartialEq for Scripted {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.steps, &other.steps) && self.at == other.at
    }
}

impl GameState for Scripted {
    type Move = u8;

    fn player_count(&self) -> usize {
        self.players
    }

    fn current_player(&self) -> PlayerId {
        match self.step() {
            Step::Decide { player, .. } => *player,
            Step::Chance { .. } => CHANCE_PLAYER,
            Step::End { .. } => 1,
        }
    }

    fn possible_moves(&self) -> Result<Vec<u8>> {
        match self.step() {
            Step::Decide { moves, .. } => Ok(moves.iter().map(|&(label, _)| label).collect()),
            Step::Chance { .. } => Err(GameError::invalid_state("chance step")),
            Step::End { .. } => Ok(Vec::new()),
        }
    }

    fn next_chance_outcomes(&self) -> Result<Vec<(Self, f64)>> {
        match self.step() {
            Step::Chance { outcomes } => Ok(outcomes
                .iter()
                .map(|&(next, p)| (self.moved_to(next), p))
                .collect()),
            _ => Err(GameError::invalid_state("not a chance step")),
        }
    }

    fn terminated(&self) -> bool {
        matches!(self.step(), Step::End { .. })
    }

    fn utility(&self, player: PlayerId) -> f64 {
        match self.step() {
            Step::End { utilities } => utilities.get(player).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn apply_move(&mut self, mv: u8) -> Result<()> {
        let next = match self.step() {
            Step::Decide { moves, .. } => moves
                .iter()
                .find(|&&(label, _)| label == mv)
                .map(|&(_, next)| next)
                .ok_or_else(|| GameError::illegal_argument(format!("no move {mv}")))?,
            _ => return Err(GameError::invalid_state("not a decision step")),
        };
        self.at = next;
        Ok(())
    }

    fn apply_chance_outcome<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let Step::Chance { outcomes } = self.step() else {
            return Err(GameError::invalid_state("not a chance step"));
        };
        let total: f64 = outcomes.iter().map(|&(_, p)| p).sum();
        let mut draw = rng.gen::<f64>() * total;
        let mut picked = None;
        for &(next, p) in outcomes {
            picked = Some(next);
            if draw < p {
                break;
            }
            draw -= p;
        }
        self.at = picked.ok_or_else(|| GameError::invalid_state("no outcomes"))?;
        Ok(())
    }
}

pub fn end(utilities: &[f64]) -> Step {
    Step::End {
        utilities: utilities.to_vec(),
    }
}

pub fn decide(player: PlayerId, moves: &[(u8, usize)]) -> Step {
    Step::Decide {
        player,
        moves: moves.to_vec(),
    }
}

pub fn chance(outcomes: &[(usize, f64)]) -> Step {
    Step::Chance {
        outcomes: outcomes.to_vec(),
    }
}
