//! Leaf- and root-parallel search drivers (§4.6, §4.7). Both use
//! `std::thread::spawn`/`JoinHandle::join` - there is no I/O in a worker, so
//! plain OS threads buy everything an async runtime or pool would here.

use std::marker::PhantomData;
use std::thread;
use std::time::{Duration, Instant};

use hexwar_core::{GameState, HexError, Move, Player};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;

use crate::config::MctsConfig;
use crate::rollout::{uniform_rollout, RolloutPolicy, UniformRollout};
use crate::search::{BestMove, SearchEngine, SearchStats};

impl SearchEngine<UniformRollout> {
    /// Per iteration: select one leaf, then spawn `workers` independent
    /// rollouts of it and back each one up sequentially as it completes.
    /// Each iteration counts `workers` rollouts. Selection uses c=1 per
    /// §4.6/§9, overriding whatever exploration constant the engine was
    /// configured with.
    pub fn leaf_parallel_search(&mut self, time_budget: Duration, workers: usize) {
        let start = Instant::now();
        let mut rollouts = 0u32;

        if self.root_winner() == Player::None {
            while start.elapsed() < time_budget {
                let (leaf, leaf_state, turn) = self.select_and_expand_pub_with_exploration(1.0);
                let seeds: Vec<u64> = (0..workers).map(|_| self.rng_mut().gen()).collect();

                let handles: Vec<_> = seeds
                    .into_iter()
                    .map(|seed| {
                        let state = leaf_state.clone();
                        thread::spawn(move || {
                            let mut rng = ChaCha8Rng::seed_from_u64(seed);
                            uniform_rollout(&state, &mut rng)
                        })
                    })
                    .collect();

                for handle in handles {
                    let outcome = handle.join().expect("leaf rollout worker panicked");
                    self.tree_mut().backup(leaf, turn, outcome.winner, &outcome.red_pts, &outcome.blue_pts);
                    rollouts += 1;
                }
            }
        }

        self.set_last_stats(SearchStats { rollouts, tree_size: self.tree().len(), elapsed: start.elapsed() });
    }

    /// Alternative contract: combine the `workers` rollout results of each
    /// iteration into one aggregated backup (visits += workers) rather than
    /// `workers` sequential per-rollout backups. Not the default; implementers
    /// choosing this must document it (per §4.6). Selection also uses c=1,
    /// same as `leaf_parallel_search`.
    pub fn leaf_parallel_search_aggregated(&mut self, time_budget: Duration, workers: usize) {
        let start = Instant::now();
        let mut rollouts = 0u32;

        if self.root_winner() == Player::None {
            while start.elapsed() < time_budget {
                let (leaf, leaf_state, turn) = self.select_and_expand_pub_with_exploration(1.0);
                let seeds: Vec<u64> = (0..workers).map(|_| self.rng_mut().gen()).collect();

                let handles: Vec<_> = seeds
                    .into_iter()
                    .map(|seed| {
                        let state = leaf_state.clone();
                        thread::spawn(move || {
                            let mut rng = ChaCha8Rng::seed_from_u64(seed);
                            uniform_rollout(&state, &mut rng)
                        })
                    })
                    .collect();

                let outcomes: Vec<_> = handles
                    .into_iter()
                    .map(|h| h.join().expect("leaf rollout worker panicked"))
                    .collect();
                let backup_inputs: Vec<_> =
                    outcomes.iter().map(|o| (o.winner, o.red_pts.clone(), o.blue_pts.clone())).collect();
                self.tree_mut().backup_aggregated(leaf, turn, &backup_inputs);
                rollouts += workers as u32;
            }
        }

        self.set_last_stats(SearchStats { rollouts, tree_size: self.tree().len(), elapsed: start.elapsed() });
    }
}

/// Runs `workers` independent engines over the same position and merges
/// their root children's visit counts at decision time. No tree is shared
/// between workers; each owns its own engine for the whole search budget.
pub struct RootParallelDriver<P: RolloutPolicy + Default + Send + 'static> {
    config: MctsConfig,
    workers: usize,
    _policy: PhantomData<P>,
}

impl<P: RolloutPolicy + Default + Send + 'static> RootParallelDriver<P> {
    pub fn new(config: MctsConfig, workers: usize) -> Self {
        Self { config, workers, _policy: PhantomData }
    }

    /// Spawn `workers` engines, each seeded from `seeds[i]`, search them for
    /// `time_budget`, and return them all (joined) for merging / advancing.
    pub fn search(&self, root_state: &GameState, time_budget: Duration, seeds: &[u64]) -> Vec<SearchEngine<P>> {
        assert_eq!(seeds.len(), self.workers, "must supply one seed per worker");

        let handles: Vec<_> = seeds
            .iter()
            .map(|&seed| {
                let config = self.config;
                let state = root_state.clone();
                thread::spawn(move || {
                    let mut engine = SearchEngine::with_seed(config, P::default(), seed);
                    engine.set_gamestate(state);
                    engine.search(time_budget);
                    engine
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().expect("root-parallel worker panicked")).collect()
    }

    /// Merge root children's visit counts across `engines`; pick the cell
    /// with the largest sum, random tie-break.
    pub fn merge_best_move(&self, engines: &[SearchEngine<P>], rng: &mut ChaCha8Rng) -> BestMove {
        if engines.is_empty() || engines[0].root_state().clone().winner() != Player::None {
            return BestMove::GameOver;
        }

        let mut merged: FxHashMap<Move, u32> = FxHashMap::default();
        for engine in engines {
            let root = engine.tree().root();
            for (&mv, &child_id) in &engine.tree().get(root).children {
                *merged.entry(mv).or_insert(0) += engine.tree().get(child_id).stats.visits;
            }
        }

        if merged.is_empty() {
            let moves = engines[0].root_state().moves();
            let idx = rng.gen_range(0..moves.len());
            return BestMove::Move(moves[idx]);
        }

        let max_visits = *merged.values().max().unwrap();
        let candidates: Vec<Move> = merged.iter().filter(|&(_, &v)| v == max_visits).map(|(&mv, _)| mv).collect();
        let idx = rng.gen_range(0..candidates.len());
        BestMove::Move(candidates[idx])
    }

    /// Advance every engine's root by `mv`.
    pub fn advance(&self, engines: &mut [SearchEngine<P>], mv: Move) -> Result<(), HexError> {
        for engine in engines.iter_mut() {
            engine.play_move(mv)?;
        }
        Ok(())
    }
}
