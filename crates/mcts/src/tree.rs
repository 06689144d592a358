//! Arena-allocated search tree and the four MCTS phases.
//!
//! Nodes live in a `Vec` and reference each other by [`NodeId`]. A node owns
//! its children through the arena; the parent link is only followed during
//! backpropagation. The whole tree is dropped at once when the search that
//! built it finishes.

use crate::config::{SearchConfig, TieBreakRule};
use crate::node::{Children, Node, NodeId};
use crate::rollout::{self, UtilityGoal};
use crate::weighted::WeightedTable;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use uct_core::{GameState, Result};

/// Where a descent through the tree ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Descent {
    /// A leaf to simulate from: a freshly expanded child, or a node whose
    /// expansion produced no children.
    Leaf(NodeId),
    /// A terminal node reached through already expanded structure. It is
    /// credited with its own utilities, without a playout.
    Terminal(NodeId),
}

/// What a single iteration did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Iteration {
    /// A playout ran from this leaf and was backpropagated.
    Simulated(NodeId),
    /// Every descent ended on a terminal node; the last one reached is given.
    Credited(NodeId),
}

/// Arena-allocated search tree.
#[derive(Debug)]
pub struct Tree<S: GameState> {
    nodes: Vec<Node<S>>,
}

impl<S: GameState> Tree<S> {
    /// Create a tree holding a single unexpanded root.
    pub fn new(root_state: S) -> Self {
        Self {
            nodes: vec![Node::root(root_state)],
        }
    }

    /// Get a reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get(&self, id: NodeId) -> &Node<S> {
        &self.nodes[id.0]
    }

    /// Get a mutable reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<S> {
        &mut self.nodes[id.0]
    }

    /// Add a new node to the arena, returning its ID.
    pub fn add(&mut self, node: Node<S>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn root(&self) -> &Node<S> {
        self.get(NodeId::ROOT)
    }

    /// Number of nodes in the tree, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists for the lifetime of the tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Materialize the children of an unexpanded node.
    ///
    /// A chance node gets one child per outcome with positive probability,
    /// stored in a [`WeightedTable`]; a player node gets one child per legal
    /// move. Returns one of the new children (weighted draw for chance nodes,
    /// uniform otherwise), or None if the node turned out to be terminal.
    ///
    /// # Panics
    /// Panics if the node was already expanded.
    pub fn expand<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) -> Result<Option<NodeId>> {
        assert!(
            self.get(id).is_unexpanded(),
            "BUG: node {:?} expanded twice",
            id
        );

        let state = &self.get(id).state;
        if state.is_chance() {
            let outcomes = state.next_chance_outcomes()?;
            let mut weighted = Vec::with_capacity(outcomes.len());
            for (next, probability) in outcomes {
                // Outcomes that can never be drawn get no node.
                if !(probability > 0.0) {
                    continue;
                }
                let child = self.add(Node::child(id, next, None));
                weighted.push((child, probability));
            }

            let table = WeightedTable::new(weighted);
            let picked = table.sample(rng).copied();
            self.get_mut(id).children = Some(Children::Chance(table));
            Ok(picked)
        } else {
            let successors = state
                .possible_moves()?
                .into_iter()
                .map(|mv| {
                    let mut next = state.clone();
                    next.apply_move(mv.clone())?;
                    Ok((next, mv))
                })
                .collect::<Result<Vec<_>>>()?;

            let ids: Vec<NodeId> = successors
                .into_iter()
                .map(|(next, mv)| self.add(Node::child(id, next, Some(mv))))
                .collect();

            let picked = ids.choose(rng).copied();
            self.get_mut(id).children = Some(Children::Moves(ids));
            Ok(picked)
        }
    }

    /// Pick the child to descend into.
    ///
    /// - Unexpanded or terminal node: None.
    /// - Chance node: weighted draw, regardless of visit statistics.
    /// - Player node: terminal children are never returned. An unvisited
    ///   parent picks uniformly; otherwise an unvisited child is preferred,
    ///   and only when every candidate was visited does the UCT score decide.
    ///   None if every child is terminal.
    pub fn select_child<R: Rng + ?Sized>(
        &self,
        id: NodeId,
        config: &SearchConfig,
        rng: &mut R,
    ) -> Option<NodeId> {
        let node = self.get(id);
        let ids = match node.children.as_ref()? {
            Children::Chance(table) => return table.sample(rng).copied(),
            Children::Moves(ids) => ids,
        };

        let open = move || {
            ids.iter()
                .copied()
                .filter(move |&child| !self.get(child).is_terminal())
        };

        // UCT needs ln(N_parent); an unvisited parent has nothing to score with.
        if node.stats.visit_count == 0 {
            return open().choose(rng);
        }

        let unvisited = move || open().filter(move |&child| self.get(child).stats.visit_count == 0);
        if unvisited().next().is_some() {
            return unvisited().choose(rng);
        }

        self.best_uct_child(open(), node.stats.visit_count, config, rng)
    }

    /// Highest UCT score among `candidates`. Ties under `TieBreakRule::Random`
    /// are resolved by reservoir sampling, so every tied child is equally likely.
    fn best_uct_child<I, R>(
        &self,
        candidates: I,
        parent_visits: u32,
        config: &SearchConfig,
        rng: &mut R,
    ) -> Option<NodeId>
    where
        I: Iterator<Item = NodeId>,
        R: Rng + ?Sized,
    {
        let ln_parent = (parent_visits as f64).ln();

        let mut best: Option<(NodeId, f64)> = None;
        let mut ties = 0u32;

        for child in candidates {
            let score = self
                .get(child)
                .stats
                .uct_score(ln_parent, config.exploration_constant);
            match best {
                Some((_, best_score)) if score < best_score => {}
                Some((_, best_score)) if score == best_score => {
                    ties += 1;
                    if config.tie_break == TieBreakRule::Random && rng.gen_range(0..ties) == 0 {
                        best = Some((child, score));
                    }
                }
                _ => {
                    best = Some((child, score));
                    ties = 1;
                }
            }
        }

        best.map(|(child, _)| child)
    }

    /// Descend from the root and expand the first unexpanded node met.
    ///
    /// Returns the node to simulate from, or the terminal node where the
    /// descent got stuck. A player node whose children are all terminal
    /// yields one of those children at random.
    pub fn select_and_expand<R: Rng + ?Sized>(
        &mut self,
        config: &SearchConfig,
        rng: &mut R,
    ) -> Result<Descent> {
        let mut current = NodeId::ROOT;
        loop {
            if self.get(current).is_unexpanded() {
                let produced = self.expand(current, rng)?;
                return Ok(Descent::Leaf(produced.unwrap_or(current)));
            }

            match self.select_child(current, config, rng) {
                Some(child) => current = child,
                None => {
                    let stuck = self.get(current).child_ids().choose(rng).copied();
                    return Ok(Descent::Terminal(stuck.unwrap_or(current)));
                }
            }
        }
    }

    /// Play out from a leaf and return the final utilities.
    ///
    /// # Panics
    /// Panics if the node has children: playouts start from true leaves only.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        id: NodeId,
        config: &SearchConfig,
        goal: Option<UtilityGoal>,
        rng: &mut R,
    ) -> Result<Vec<f64>> {
        let node = self.get(id);
        assert!(
            node.child_ids().is_empty(),
            "BUG: simulate called on node {:?} which has children",
            id
        );

        rollout::playout(
            &node.state,
            config.rollout_policy,
            goal,
            config.max_rollout_moves,
            rng,
        )
    }

    /// Credit `utilities` to every node from `id` up to, but excluding, the root.
    ///
    /// Each node receives the utility of the player to move at its parent,
    /// i.e. the player who chose to move into it. Missing entries count as 0.
    pub fn backpropagate(&mut self, id: NodeId, utilities: &[f64]) {
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            let player = self.get(parent).state.current_player();
            let reward = utilities.get(player).copied().unwrap_or(0.0);

            let stats = &mut self.get_mut(current).stats;
            stats.visit_count += 1;
            stats.sum_scores += reward;

            current = parent;
        }
    }

    /// Run one select -> expand -> simulate -> backpropagate iteration.
    ///
    /// Descents ending on a terminal node credit that node immediately and,
    /// up to `config.max_terminal_retries` times, try again.
    pub fn iterate<R: Rng + ?Sized>(
        &mut self,
        config: &SearchConfig,
        goal: Option<UtilityGoal>,
        rng: &mut R,
    ) -> Result<Iteration> {
        let mut retries = 0;
        loop {
            match self.select_and_expand(config, rng)? {
                Descent::Leaf(leaf) => {
                    let utilities = self.simulate(leaf, config, goal, rng)?;
                    self.backpropagate(leaf, &utilities);
                    return Ok(Iteration::Simulated(leaf));
                }
                Descent::Terminal(terminal) => {
                    let utilities = self.get(terminal).state.utilities();
                    self.backpropagate(terminal, &utilities);
                    if retries >= config.max_terminal_retries || self.root().is_terminal() {
                        return Ok(Iteration::Credited(terminal));
                    }
                    retries += 1;
                }
            }
        }
    }
}
