//! Union-find over arbitrary keys, with a set of "ignored" sentinel keys
//! whose group-membership lists are always kept empty.
//!
//! Used by [`crate::game::GameState`] to track, per color, whether the two
//! virtual edge sentinels have been connected through real stones.

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

/// Union-find with union-by-rank and grandparent path compression.
///
/// `K` is typically a small `Copy` key (a board cell or an edge sentinel).
/// Keys are inserted lazily on first `find`.
#[derive(Clone, Debug)]
pub struct DisjointSet<K> {
    parent: FxHashMap<K, K>,
    rank: FxHashMap<K, u32>,
    groups: FxHashMap<K, Vec<K>>,
    ignored: FxHashSet<K>,
}

impl<K: Copy + Eq + Hash> DisjointSet<K> {
    pub fn new() -> Self {
        Self {
            parent: FxHashMap::default(),
            rank: FxHashMap::default(),
            groups: FxHashMap::default(),
            ignored: FxHashSet::default(),
        }
    }

    /// Keys whose group-member lists must stay empty, even once inserted.
    pub fn set_ignored(&mut self, nodes: impl IntoIterator<Item = K>) {
        self.ignored = nodes.into_iter().collect();
    }

    fn insert_if_new(&mut self, x: K) {
        if self.parent.contains_key(&x) {
            return;
        }
        self.parent.insert(x, x);
        self.rank.insert(x, 0);
        let members = if self.ignored.contains(&x) { Vec::new() } else { vec![x] };
        self.groups.insert(x, members);
    }

    /// Representative of `x`'s group, lazily inserting `x` if unknown.
    /// Applies grandparent path compression along the way.
    pub fn find(&mut self, x: K) -> K {
        self.insert_if_new(x);

        let mut cur = x;
        loop {
            let parent_cur = self.parent[&cur];
            if parent_cur == cur {
                return cur;
            }
            let grandparent = self.parent[&parent_cur];
            if grandparent == parent_cur {
                return parent_cur;
            }
            self.parent.insert(cur, grandparent);
            cur = grandparent;
        }
    }

    /// Union the groups containing `x` and `y`. Returns `false` if they were
    /// already in the same group.
    pub fn join(&mut self, x: K, y: K) -> bool {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return false;
        }

        let rank_x = self.rank[&root_x];
        let rank_y = self.rank[&root_y];

        let (survivor, absorbed) = if rank_x < rank_y {
            (root_y, root_x)
        } else if rank_x > rank_y {
            (root_x, root_y)
        } else {
            *self.rank.get_mut(&root_y).unwrap() += 1;
            (root_y, root_x)
        };

        self.parent.insert(absorbed, survivor);
        let absorbed_members = self.groups.remove(&absorbed).unwrap_or_default();
        self.groups.get_mut(&survivor).unwrap().extend(absorbed_members);

        true
    }

    pub fn connected(&mut self, x: K, y: K) -> bool {
        self.find(x) == self.find(y)
    }

    /// Members of the group containing `x` (excludes ignored keys), without
    /// inserting `x` as a side effect.
    pub fn group_members(&self, x: K) -> &[K] {
        self.groups.get(&x).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<K: Copy + Eq + Hash> Default for DisjointSet<K> {
    fn default() -> Self {
        Self::new()
    }
}
