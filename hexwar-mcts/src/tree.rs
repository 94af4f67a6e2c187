//! MCTS/RAVE tree structure and node management.
//!
//! Uses arena allocation: nodes are addressed by a `NodeId` index into a
//! single `Vec`, rather than `Rc`/`Weak`/`RefCell`. Pruning a subtree (on
//! `move`) is realized by copying the retained subtree into a fresh arena,
//! not by freeing individual nodes.

use hexwar_core::{Move, Player};
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};

/// Node identifier (index into the arena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// Visit/reward counters, including the RAVE (AMAF) side channel.
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeStats {
    pub visits: u32,
    pub reward: f64,
    pub rave_visits: u32,
    pub rave_reward: f64,
}

/// A node in the MCTS tree. The root has `mv == None` and `parent == None`.
#[derive(Clone, Debug)]
pub struct MctsNode {
    pub mv: Option<Move>,
    pub parent: Option<NodeId>,
    pub children: FxHashMap<Move, NodeId>,
    pub stats: NodeStats,
}

impl MctsNode {
    fn root() -> Self {
        Self {
            mv: None,
            parent: None,
            children: FxHashMap::default(),
            stats: NodeStats::default(),
        }
    }

    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The search tree. A node's children map is keyed by the move leading to it.
#[derive(Clone, Debug)]
pub struct MctsTree {
    nodes: Vec<MctsNode>,
}

impl MctsTree {
    pub fn new() -> Self {
        Self { nodes: vec![MctsNode::root()] }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attach one child per move, keyed by move. No-op for moves already present.
    pub fn expand_all(&mut self, parent: NodeId, moves: &[Move]) {
        for &mv in moves {
            if self.get(parent).children.contains_key(&mv) {
                continue;
            }
            let child_id = NodeId(self.nodes.len());
            self.nodes.push(MctsNode {
                mv: Some(mv),
                parent: Some(parent),
                children: FxHashMap::default(),
                stats: NodeStats::default(),
            });
            self.get_mut(parent).children.insert(mv, child_id);
        }
    }

    /// UCT+RAVE value of `node_id`, per the combined formula (value = (1-a)*UCT + a*AMAF).
    pub fn value(&self, node_id: NodeId, parent_visits: u32, exploration: f64, rave_const: f64) -> f64 {
        let node = self.get(node_id);
        let visits = node.stats.visits;
        if visits == 0 {
            return if exploration == 0.0 { 0.0 } else { f64::INFINITY };
        }

        let alpha = ((rave_const - visits as f64) / rave_const).max(0.0);
        let uct = node.stats.reward / visits as f64
            + exploration * ((2.0 * (parent_visits as f64).ln()) / visits as f64).sqrt();
        let amaf = if node.stats.rave_visits > 0 {
            node.stats.rave_reward / node.stats.rave_visits as f64
        } else {
            0.0
        };

        (1.0 - alpha) * uct + alpha * amaf
    }

    /// Child with maximum value, ties broken uniformly at random. `None` if childless.
    pub fn select_best_child(
        &self,
        node_id: NodeId,
        exploration: f64,
        rave_const: f64,
        rng: &mut impl Rng,
    ) -> Option<(Move, NodeId)> {
        let node = self.get(node_id);
        if node.children.is_empty() {
            return None;
        }
        let parent_visits = node.stats.visits.max(1);

        let mut best_value = f64::NEG_INFINITY;
        let mut best: Vec<(Move, NodeId)> = Vec::new();
        for (&mv, &child_id) in &node.children {
            let v = self.value(child_id, parent_visits, exploration, rave_const);
            if v > best_value {
                best_value = v;
                best.clear();
                best.push((mv, child_id));
            } else if v == best_value {
                best.push((mv, child_id));
            }
        }

        let idx = rng.gen_range(0..best.len());
        Some(best[idx])
    }

    /// Backpropagate a single rollout result from `leaf` to the root.
    ///
    /// `turn` is the player whose move produced `leaf` (i.e. the player to
    /// move from `leaf`'s parent state). At each node, the RAVE points of
    /// the current `turn` are matched against that node's children before
    /// the node's own visit/reward counters are updated; `turn` then flips
    /// and the reward sign flips with it, walking up to the root.
    pub fn backup(
        &mut self,
        leaf: NodeId,
        mut turn: Player,
        outcome: Player,
        red_rave_pts: &FxHashSet<Move>,
        blue_rave_pts: &FxHashSet<Move>,
    ) {
        let mut reward = if outcome == turn { 1.0 } else { -1.0 };
        let mut current = Some(leaf);

        while let Some(node_id) = current {
            let rave_pts = match turn {
                Player::Red => red_rave_pts,
                Player::Blue => blue_rave_pts,
                Player::None => unreachable!("turn is never Player::None"),
            };

            let children: Vec<(Move, NodeId)> =
                self.get(node_id).children.iter().map(|(&m, &id)| (m, id)).collect();
            for (mv, child_id) in children {
                if rave_pts.contains(&mv) {
                    let child = self.get_mut(child_id);
                    child.stats.rave_visits += 1;
                    child.stats.rave_reward += reward;
                }
            }

            let node = self.get_mut(node_id);
            node.stats.visits += 1;
            node.stats.reward += reward;

            current = node.parent;
            turn = turn.opponent();
            reward = -reward;
        }
    }

    /// Aggregated variant of [`backup`](Self::backup): applies `k` rollout
    /// results as one combined update (visits += k) instead of k sequential
    /// per-rollout backups. Not numerically equivalent to per-rollout backup.
    pub fn backup_aggregated(
        &mut self,
        leaf: NodeId,
        mut turn: Player,
        outcomes: &[(Player, FxHashSet<Move>, FxHashSet<Move>)],
    ) {
        let k = outcomes.len() as u32;
        let mut current = Some(leaf);

        while let Some(node_id) = current {
            let combined_reward: f64 = outcomes
                .iter()
                .map(|(outcome, _, _)| if *outcome == turn { 1.0 } else { -1.0 })
                .sum();

            let children: Vec<(Move, NodeId)> =
                self.get(node_id).children.iter().map(|(&m, &id)| (m, id)).collect();
            for (mv, child_id) in children {
                let mut rave_visits = 0u32;
                let mut rave_reward = 0.0;
                for (outcome, red_pts, blue_pts) in outcomes {
                    let pts = match turn {
                        Player::Red => red_pts,
                        Player::Blue => blue_pts,
                        Player::None => unreachable!("turn is never Player::None"),
                    };
                    if pts.contains(&mv) {
                        rave_visits += 1;
                        rave_reward += if *outcome == turn { 1.0 } else { -1.0 };
                    }
                }
                if rave_visits > 0 {
                    let child = self.get_mut(child_id);
                    child.stats.rave_visits += rave_visits;
                    child.stats.rave_reward += rave_reward;
                }
            }

            let node = self.get_mut(node_id);
            node.stats.visits += k;
            node.stats.reward += combined_reward;

            current = node.parent;
            turn = turn.opponent();
        }
    }

    /// Promote `new_root` to be the tree's root, discarding every other
    /// subtree. Implemented as a fresh-arena deep copy rather than freeing
    /// individual nodes (see module docs).
    pub fn reparent(&mut self, new_root: NodeId) {
        let mut new_nodes = Vec::with_capacity(self.subtree_size(new_root));
        self.copy_subtree(new_root, None, &mut new_nodes);
        self.nodes = new_nodes;
    }

    fn subtree_size(&self, id: NodeId) -> usize {
        1 + self.get(id).children.values().map(|&c| self.subtree_size(c)).sum::<usize>()
    }

    fn copy_subtree(&self, old_id: NodeId, new_parent: Option<NodeId>, new_nodes: &mut Vec<MctsNode>) -> NodeId {
        let old_node = self.get(old_id);
        let new_id = NodeId(new_nodes.len());
        new_nodes.push(MctsNode {
            mv: if new_parent.is_none() { None } else { old_node.mv },
            parent: new_parent,
            children: FxHashMap::default(),
            stats: old_node.stats,
        });

        let mut child_map = FxHashMap::default();
        let children: Vec<(Move, NodeId)> = old_node.children.iter().map(|(&m, &id)| (m, id)).collect();
        for (mv, child_old_id) in children {
            let child_new_id = self.copy_subtree(child_old_id, Some(new_id), new_nodes);
            child_map.insert(mv, child_new_id);
        }
        new_nodes[new_id.0].children = child_map;
        new_id
    }
}

impl Default for MctsTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexwar_core::board::Cell;

    #[test]
    fn test_new_tree_has_single_root() {
        let tree = MctsTree::new();
        assert_eq!(tree.len(), 1);
        assert!(!tree.get(tree.root()).is_expanded());
    }

    #[test]
    fn test_expand_all_attaches_one_child_per_move() {
        let mut tree = MctsTree::new();
        let moves = vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 0)];
        tree.expand_all(tree.root(), &moves);
        assert_eq!(tree.get(tree.root()).children.len(), 3);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_unvisited_child_has_infinite_value() {
        let mut tree = MctsTree::new();
        tree.expand_all(tree.root(), &[Cell::new(0, 0)]);
        let child = *tree.get(tree.root()).children.get(&Cell::new(0, 0)).unwrap();
        assert!(tree.value(child, 1, 0.5, 300.0).is_infinite());
    }

    #[test]
    fn test_zero_exploration_unvisited_value_is_zero() {
        let mut tree = MctsTree::new();
        tree.expand_all(tree.root(), &[Cell::new(0, 0)]);
        let child = *tree.get(tree.root()).children.get(&Cell::new(0, 0)).unwrap();
        assert_eq!(tree.value(child, 1, 0.0, 300.0), 0.0);
    }

    #[test]
    fn test_backup_increments_visits_along_path() {
        let mut tree = MctsTree::new();
        let mv = Cell::new(0, 0);
        tree.expand_all(tree.root(), &[mv]);
        let child = *tree.get(tree.root()).children.get(&mv).unwrap();

        let empty = FxHashSet::default();
        tree.backup(child, Player::Red, Player::Red, &empty, &empty);

        assert_eq!(tree.get(child).stats.visits, 1);
        assert_eq!(tree.get(tree.root()).stats.visits, 1);
    }

    #[test]
    fn test_backup_is_commutative_under_permutation() {
        let build = |order: &[usize]| {
            let mut tree = MctsTree::new();
            let moves = vec![Cell::new(0, 0), Cell::new(0, 1)];
            tree.expand_all(tree.root(), &moves);
            let child = *tree.get(tree.root()).children.get(&moves[0]).unwrap();
            let mut red_pts = FxHashSet::default();
            red_pts.insert(moves[1]);
            let blue_pts = FxHashSet::default();

            let results = [
                (Player::Red, &red_pts, &blue_pts),
                (Player::Blue, &blue_pts, &blue_pts),
                (Player::Red, &red_pts, &blue_pts),
            ];
            for &i in order {
                let (outcome, rp, bp) = results[i];
                tree.backup(child, Player::Red, outcome, rp, bp);
            }
            (tree.get(child).stats, tree.get(tree.root()).stats)
        };

        let (child_a, root_a) = build(&[0, 1, 2]);
        let (child_b, root_b) = build(&[2, 0, 1]);
        assert_eq!(child_a.visits, child_b.visits);
        assert_eq!(child_a.reward, child_b.reward);
        assert_eq!(root_a.visits, root_b.visits);
        assert_eq!(root_a.reward, root_b.reward);
    }

    #[test]
    fn test_reparent_preserves_subtree_stats() {
        let mut tree = MctsTree::new();
        let a = Cell::new(0, 0);
        let b = Cell::new(0, 1);
        tree.expand_all(tree.root(), &[a, b]);
        let child_a = *tree.get(tree.root()).children.get(&a).unwrap();
        let empty = FxHashSet::default();
        tree.backup(child_a, Player::Red, Player::Red, &empty, &empty);
        tree.backup(child_a, Player::Red, Player::Red, &empty, &empty);

        let visits_before = tree.get(child_a).stats.visits;
        tree.reparent(child_a);

        assert_eq!(tree.get(tree.root()).stats.visits, visits_before);
        assert!(tree.get(tree.root()).mv.is_none());
        assert!(tree.get(tree.root()).parent.is_none());
    }
}
