//! Playout policies: uniform-random and Last-Good-Reply (LGR).

use hexwar_core::{GameState, Move, Player};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rustc_hash::{FxHashMap, FxHashSet};

/// Result of one rollout, used both for backup and (by LGR) reply-table updates.
#[derive(Clone, Debug)]
pub struct RolloutOutcome {
    pub winner: Player,
    /// All Red/Blue cells on the terminal board - includes moves made
    /// before the rollout started (on the path from root) as well as
    /// those generated during the rollout itself.
    pub red_pts: FxHashSet<Move>,
    pub blue_pts: FxHashSet<Move>,
    /// Moves made by each color during the rollout phase only, in order.
    pub red_order: Vec<Move>,
    pub blue_order: Vec<Move>,
    /// Who moved first during the rollout phase (the leaf's `to_play`).
    pub first_mover: Player,
}

fn terminal_points(state: &GameState) -> (FxHashSet<Move>, FxHashSet<Move>) {
    let mut red_pts = FxHashSet::default();
    let mut blue_pts = FxHashSet::default();
    let size = state.size();
    for row in 0..size {
        for col in 0..size {
            let cell = Move::new(row, col);
            match state.board().get(cell) {
                Player::Red => {
                    red_pts.insert(cell);
                }
                Player::Blue => {
                    blue_pts.insert(cell);
                }
                Player::None => {}
            }
        }
    }
    (red_pts, blue_pts)
}

/// Uniform-random rollout to a terminal state. Usable standalone (e.g. by
/// leaf-parallel workers on their own thread, without a shared policy).
pub fn uniform_rollout(state: &GameState, rng: &mut ChaCha8Rng) -> RolloutOutcome {
    let mut state = state.clone();
    let first_mover = state.to_play();
    let mut remaining = state.moves();
    let mut red_order = Vec::new();
    let mut blue_order = Vec::new();

    while state.winner() == Player::None {
        let idx = rng.gen_range(0..remaining.len());
        let mv = remaining.swap_remove(idx);
        let mover = state.to_play();
        state.play(mv).expect("move drawn from moves() is always legal");
        match mover {
            Player::Red => red_order.push(mv),
            Player::Blue => blue_order.push(mv),
            Player::None => unreachable!("to_play is never Player::None"),
        }
    }

    let winner = state.winner();
    let (red_pts, blue_pts) = terminal_points(&state);
    RolloutOutcome { winner, red_pts, blue_pts, red_order, blue_order, first_mover }
}

/// A rollout strategy used during the simulation phase of search.
pub trait RolloutPolicy {
    fn rollout(&mut self, state: &GameState, rng: &mut ChaCha8Rng) -> RolloutOutcome;

    /// Called after each rollout's result has been backed up, so stateful
    /// policies (LGR) can update their tables. No-op by default.
    fn observe_result(&mut self, _outcome: &RolloutOutcome) {}

    /// Called by `set_gamestate`; stateful policies must clear any
    /// state tied to the discarded tree/position.
    fn reset(&mut self) {}
}

/// Plain uniform-random playouts (the RAVE engine's default policy).
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformRollout;

impl RolloutPolicy for UniformRollout {
    fn rollout(&mut self, state: &GameState, rng: &mut ChaCha8Rng) -> RolloutOutcome {
        uniform_rollout(state, rng)
    }
}

/// Last-Good-Reply playout policy: maintains a per-color `opponent move ->
/// our reply` table, seeded by winning rollouts, and biases future rollouts
/// toward replaying a remembered reply.
#[derive(Clone, Debug)]
pub struct LgrRollout {
    pub red_reply: FxHashMap<Move, Move>,
    pub blue_reply: FxHashMap<Move, Move>,
    pub randomness: f64,
}

impl LgrRollout {
    pub fn new(randomness: f64) -> Self {
        Self { red_reply: FxHashMap::default(), blue_reply: FxHashMap::default(), randomness }
    }
}

impl Default for LgrRollout {
    /// Defaults to the RANDOMNESS constant of §6 (0.5), not zero.
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl LgrRollout {
    fn reply_table(&self, mover: Player) -> &FxHashMap<Move, Move> {
        match mover {
            Player::Red => &self.red_reply,
            Player::Blue => &self.blue_reply,
            Player::None => unreachable!("to_play is never Player::None"),
        }
    }
}

impl RolloutPolicy for LgrRollout {
    fn rollout(&mut self, state: &GameState, rng: &mut ChaCha8Rng) -> RolloutOutcome {
        let mut state = state.clone();
        let first_mover = state.to_play();
        let mut remaining = state.moves();
        let mut red_order = Vec::new();
        let mut blue_order = Vec::new();
        let mut last_move: Option<Move> = None;

        while state.winner() == Player::None {
            let mover = state.to_play();
            let reply = last_move.and_then(|last| self.reply_table(mover).get(&last).copied());
            let mv = match reply {
                Some(reply_mv) if remaining.contains(&reply_mv) && rng.gen::<f64>() > self.randomness => {
                    let idx = remaining.iter().position(|&m| m == reply_mv).unwrap();
                    remaining.swap_remove(idx)
                }
                _ => {
                    let idx = rng.gen_range(0..remaining.len());
                    remaining.swap_remove(idx)
                }
            };

            state.play(mv).expect("move drawn from moves() is always legal");
            match mover {
                Player::Red => red_order.push(mv),
                Player::Blue => blue_order.push(mv),
                Player::None => unreachable!("to_play is never Player::None"),
            }
            last_move = Some(mv);
        }

        let winner = state.winner();
        let (red_pts, blue_pts) = terminal_points(&state);
        RolloutOutcome { winner, red_pts, blue_pts, red_order, blue_order, first_mover }
    }

    fn observe_result(&mut self, outcome: &RolloutOutcome) {
        let (winner_order, loser_order, table) = match outcome.winner {
            Player::Red => (&outcome.red_order, &outcome.blue_order, &mut self.red_reply),
            Player::Blue => (&outcome.blue_order, &outcome.red_order, &mut self.blue_reply),
            Player::None => return,
        };

        // If the winner moved second, its i-th move directly answers the
        // loser's i-th move; if the winner moved first, its i-th move
        // preceded the loser's i-th move, so the reply is one move later.
        let offset = if outcome.first_mover == outcome.winner { 1 } else { 0 };
        for (i, &loser_mv) in loser_order.iter().enumerate() {
            if let Some(&winner_mv) = winner_order.get(i + offset) {
                table.insert(loser_mv, winner_mv);
            }
        }
    }

    fn reset(&mut self) {
        self.red_reply.clear();
        self.blue_reply.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexwar_core::Cell;
    use rand::SeedableRng;

    #[test]
    fn test_uniform_rollout_terminates_with_winner() {
        let state = GameState::new(5);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let outcome = uniform_rollout(&state, &mut rng);
        assert_ne!(outcome.winner, Player::None);
        assert_eq!(outcome.red_pts.len() + outcome.blue_pts.len(), 25);
    }

    #[test]
    fn test_lgr_reply_table_learns_from_blue_wins() {
        let mut policy = LgrRollout::new(0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut blue_moves_ever_played_in_wins: FxHashSet<Move> = FxHashSet::default();
        let mut blue_wins_seen = 0;

        for _ in 0..50 {
            let state = GameState::new(4);
            let outcome = policy.rollout(&state, &mut rng);
            policy.observe_result(&outcome);
            if outcome.winner == Player::Blue {
                blue_wins_seen += 1;
                blue_moves_ever_played_in_wins.extend(outcome.blue_order.iter().copied());
            }
            if blue_wins_seen >= 2 {
                break;
            }
        }

        assert!(blue_wins_seen >= 2, "expected at least two Blue wins in 50 tries");
        assert!(!policy.blue_reply.is_empty());
        for &reply in policy.blue_reply.values() {
            assert!(blue_moves_ever_played_in_wins.contains(&reply));
        }
    }

    #[test]
    fn test_reset_clears_both_reply_tables() {
        let mut policy = LgrRollout::new(0.5);
        policy.red_reply.insert(Cell::new(0, 0), Cell::new(0, 1));
        policy.blue_reply.insert(Cell::new(1, 0), Cell::new(1, 1));
        policy.reset();
        assert!(policy.red_reply.is_empty());
        assert!(policy.blue_reply.is_empty());
    }
}
