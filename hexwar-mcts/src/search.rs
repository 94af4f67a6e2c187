//! The RAVE/LGR search loop and the engine façade state machine.

use std::time::{Duration, Instant};

use hexwar_core::{GameState, HexError, Move, Player};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::MctsConfig;
use crate::rollout::RolloutPolicy;
use crate::tree::{MctsTree, NodeId};

/// Result of `best_move`: either a cell to play, or the game-over sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BestMove {
    Move(Move),
    GameOver,
}

/// The façade's lifecycle, per §4.8: Fresh -> Searched -> Moved -> ...
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Fresh,
    Searched,
    Moved,
}

/// Rollout count, tree size, and wall-clock time of the most recent `search`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchStats {
    pub rollouts: u32,
    pub tree_size: usize,
    pub elapsed: Duration,
}

/// A single-threaded MCTS+RAVE engine, generic over its rollout policy.
///
/// `SearchEngine<UniformRollout>` is the plain RAVE engine of §4.4;
/// `SearchEngine<LgrRollout>` is the LGR variant of §4.5 - the two share
/// every part of the select/expand/backup loop and differ only in rollout.
pub struct SearchEngine<P: RolloutPolicy> {
    tree: MctsTree,
    root_state: GameState,
    config: MctsConfig,
    rng: ChaCha8Rng,
    policy: P,
    state: EngineState,
    last_stats: SearchStats,
}

impl<P: RolloutPolicy + Default> SearchEngine<P> {
    pub fn new(config: MctsConfig) -> Self {
        Self::with_policy(config, P::default())
    }
}

impl<P: RolloutPolicy> SearchEngine<P> {
    pub fn with_policy(config: MctsConfig, policy: P) -> Self {
        let root_state = GameState::new(config.board_size);
        Self {
            tree: MctsTree::new(),
            root_state,
            config,
            rng: ChaCha8Rng::from_entropy(),
            policy,
            state: EngineState::Fresh,
            last_stats: SearchStats::default(),
        }
    }

    /// Deterministic construction for tests: seeds the engine's RNG explicitly.
    pub fn with_seed(config: MctsConfig, policy: P, seed: u64) -> Self {
        let mut engine = Self::with_policy(config, policy);
        engine.rng = ChaCha8Rng::seed_from_u64(seed);
        engine
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn root_state(&self) -> &GameState {
        &self.root_state
    }

    pub(crate) fn tree(&self) -> &MctsTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut MctsTree {
        &mut self.tree
    }

    pub(crate) fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub(crate) fn root_winner(&mut self) -> Player {
        self.root_state.winner()
    }

    pub(crate) fn set_last_stats(&mut self, stats: SearchStats) {
        self.last_stats = stats;
    }

    /// Crate-visible entry point to the select/expand step, used by the
    /// parallel drivers to pick a leaf before fanning out rollout workers.
    pub(crate) fn select_and_expand_pub(&mut self) -> (NodeId, GameState, Player) {
        self.select_and_expand()
    }

    /// Like `select_and_expand_pub`, but descends with `exploration`
    /// substituted for the engine's configured UCT constant - the
    /// leaf-parallel driver selects with c=1 regardless of how the engine
    /// was configured.
    pub(crate) fn select_and_expand_pub_with_exploration(&mut self, exploration: f64) -> (NodeId, GameState, Player) {
        let saved = self.config.exploration;
        self.config.exploration = exploration;
        let result = self.select_and_expand();
        self.config.exploration = saved;
        result
    }

    /// Replace the root position, discarding the tree and any policy state
    /// tied to the discarded position (LGR reply tables included).
    pub fn set_gamestate(&mut self, state: GameState) {
        self.root_state = state;
        self.tree = MctsTree::new();
        self.policy.reset();
        self.state = EngineState::Fresh;
    }

    /// Advance the root by `mv`: reparent the tree if `mv` is a known child,
    /// otherwise discard it (TreeMiss, recovered silently per §7).
    pub fn play_move(&mut self, mv: Move) -> Result<(), HexError> {
        self.root_state.play(mv)?;
        if let Some(&child_id) = self.tree.get(self.tree.root()).children.get(&mv) {
            self.tree.reparent(child_id);
        } else {
            self.tree = MctsTree::new();
        }
        self.state = EngineState::Moved;
        Ok(())
    }

    /// Run select/expand/rollout/backup iterations until `time_budget` elapses.
    pub fn search(&mut self, time_budget: Duration) {
        let start = Instant::now();
        let mut rollouts = 0u32;

        if self.root_state.winner() == Player::None {
            while start.elapsed() < time_budget {
                let (leaf, leaf_state, turn) = self.select_and_expand();
                let outcome = self.policy.rollout(&leaf_state, &mut self.rng);
                self.tree.backup(leaf, turn, outcome.winner, &outcome.red_pts, &outcome.blue_pts);
                self.policy.observe_result(&outcome);
                rollouts += 1;
            }
        }

        self.last_stats = SearchStats { rollouts, tree_size: self.tree.len(), elapsed: start.elapsed() };
        self.state = EngineState::Searched;
    }

    pub fn statistics(&self) -> SearchStats {
        self.last_stats
    }

    /// Most-visited root child, or `GameOver` if the root position is won.
    pub fn best_move(&mut self) -> BestMove {
        if self.root_state.winner() != Player::None {
            return BestMove::GameOver;
        }

        let root = self.tree.root();
        let children = &self.tree.get(root).children;
        if children.is_empty() {
            let moves = self.root_state.moves();
            let idx = self.rng.gen_range(0..moves.len());
            return BestMove::Move(moves[idx]);
        }

        let max_visits = children.values().map(|&id| self.tree.get(id).stats.visits).max().unwrap();
        let candidates: Vec<Move> = children
            .iter()
            .filter(|(_, &id)| self.tree.get(id).stats.visits == max_visits)
            .map(|(&mv, _)| mv)
            .collect();

        let idx = self.rng.gen_range(0..candidates.len());
        BestMove::Move(candidates[idx])
    }

    /// Select a leaf by descending max-value children (first-visit priority
    /// short-circuits the descent), then expand it if non-terminal.
    /// Returns (leaf id, state at leaf, mover who produced the leaf).
    fn select_and_expand(&mut self) -> (NodeId, GameState, Player) {
        let (leaf, mut state) = self.select();

        // `leaf` is always childless here: either the tree's not-yet-expanded
        // root, or a child just visited for the first time.
        if state.winner() == Player::None {
            let moves = state.moves();
            self.tree.expand_all(leaf, &moves);
            let children = &self.tree.get(leaf).children;
            let idx = self.rng.gen_range(0..children.len());
            let (&mv, &child_id) = children.iter().nth(idx).unwrap();
            state.play(mv).expect("move generated from moves() is always legal");
            let turn = state.to_play().opponent();
            return (child_id, state, turn);
        }

        let turn = state.to_play().opponent();
        (leaf, state, turn)
    }

    /// Descend from root picking the max-value child (random tie-break) and
    /// playing it on a state copy, stopping at the first childless node -
    /// either the never-expanded root, or a child visited for the first time.
    fn select(&mut self) -> (NodeId, GameState) {
        let mut current = self.tree.root();
        let mut state = self.root_state.clone();

        loop {
            if !self.tree.get(current).is_expanded() {
                return (current, state);
            }
            let (mv, child_id) = self
                .tree
                .select_best_child(current, self.config.exploration, self.config.rave_const, &mut self.rng)
                .expect("expanded node always has at least one child");

            let first_visit = self.tree.get(child_id).stats.visits == 0;
            state.play(mv).expect("tree only holds legal moves");
            current = child_id;
            if first_visit {
                return (current, state);
            }
        }
    }
}
