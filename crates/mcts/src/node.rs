//! Search tree node types.
//!
//! Uses arena allocation with indices: children are owned by the arena and
//! referenced by [`NodeId`], and the parent link is a plain index used only
//! for backpropagation.

use crate::weighted::WeightedTable;
use uct_core::GameState;

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Visit statistics for a single node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeStats {
    /// Number of completed iterations that passed through this node.
    pub visit_count: u32,

    /// Sum of the rewards credited to this node. Each reward is the utility
    /// of the player who moved into this node (the parent's player to move).
    pub sum_scores: f64,
}

impl NodeStats {
    /// Average reward. Returns 0.0 if the node has never been visited.
    pub fn mean_score(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.sum_scores / self.visit_count as f64
        }
    }

    /// UCT score `mean + c * sqrt(ln(N_parent) / N)`.
    ///
    /// Takes a pre-computed `ln(N_parent)` shared by all siblings. Only
    /// meaningful for a visited node.
    #[inline]
    pub fn uct_score(&self, ln_parent_visits: f64, exploration: f64) -> f64 {
        let n = self.visit_count as f64;
        self.mean_score() + exploration * (ln_parent_visits / n).sqrt()
    }
}

/// Materialized children of an expanded node.
#[derive(Clone, Debug)]
pub enum Children {
    /// One child per legal move, in move order.
    Moves(Vec<NodeId>),
    /// One child per chance outcome, indexed by cumulative probability.
    Chance(WeightedTable<NodeId>),
}

impl Children {
    /// All child ids.
    pub fn ids(&self) -> &[NodeId] {
        match self {
            Children::Moves(ids) => ids,
            Children::Chance(table) => table.values(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }
}

/// A node in the search tree.
///
/// The game state snapshot never changes once the node is created.
#[derive(Clone, Debug)]
pub struct Node<S: GameState> {
    /// Parent node (None for root).
    pub parent: Option<NodeId>,

    /// Game state at this point of the tree.
    pub state: S,

    /// Move that produced this node from its parent.
    /// None for the root and for chance outcomes.
    pub causation_move: Option<S::Move>,

    /// Visit statistics.
    pub stats: NodeStats,

    /// None until the node is expanded. An empty collection marks a terminal node.
    pub children: Option<Children>,
}

impl<S: GameState> Node<S> {
    /// Create the root node.
    pub fn root(state: S) -> Self {
        Self {
            parent: None,
            state,
            causation_move: None,
            stats: NodeStats::default(),
            children: None,
        }
    }

    /// Create an unexpanded child node.
    pub fn child(parent: NodeId, state: S, causation_move: Option<S::Move>) -> Self {
        Self {
            parent: Some(parent),
            state,
            causation_move,
            stats: NodeStats::default(),
            children: None,
        }
    }

    #[inline]
    pub fn is_unexpanded(&self) -> bool {
        self.children.is_none()
    }

    /// Expanded with no outgoing transition.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.children.as_ref().is_some_and(Children::is_empty)
    }

    /// Child ids; empty for unexpanded and terminal nodes.
    pub fn child_ids(&self) -> &[NodeId] {
        match &self.children {
            Some(children) => children.ids(),
            None => &[],
        }
    }
}
