//! End-to-end tests over the public engine façade: search, tree reuse, and
//! root-parallel merging against real (sub-second) time budgets, matching
//! scenarios S3-S5. S6 (LGR reply evolution) and the driver protocol's
//! framing are covered by `hexwar-mcts`'s and this crate's own
//! `#[cfg(test)]` modules, per the unit-vs-integration split these tests
//! follow.

use std::time::Duration;

use hexwar_core::GameState;
use hexwar_mcts::{BestMove, MctsConfig, RaveEngine, RootParallelDriver, UniformRollout};
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;

fn small_config() -> MctsConfig {
    MctsConfig { board_size: 5, ..MctsConfig::default() }
}

#[test]
fn test_s3_search_returns_legal_move_on_empty_board() {
    let mut engine = RaveEngine::with_seed(small_config(), UniformRollout, 42);
    engine.search(Duration::from_millis(300));

    match engine.best_move() {
        BestMove::Move(mv) => {
            assert!(engine.root_state().board().in_bounds(mv));
            assert!(engine.root_state().board().is_empty(mv));
        }
        BestMove::GameOver => panic!("empty board is never game over"),
    }
}

#[test]
fn test_s4_tree_reuse_grows_after_a_second_search() {
    let mut engine = RaveEngine::with_seed(small_config(), UniformRollout, 7);
    engine.search(Duration::from_millis(300));
    let carried_tree_size = engine.statistics().tree_size;

    let mv = match engine.best_move() {
        BestMove::Move(mv) => mv,
        BestMove::GameOver => panic!("empty board is never game over"),
    };
    engine.play_move(mv).unwrap();

    engine.search(Duration::from_millis(300));
    assert!(engine.statistics().tree_size >= carried_tree_size);
    assert!(engine.statistics().rollouts > 0);
}

#[test]
fn test_s5_root_parallel_merge_sums_visits_across_engines() {
    let config = small_config();
    let driver: RootParallelDriver<UniformRollout> = RootParallelDriver::new(config, 2);
    let state = GameState::new(config.board_size);

    let engines = driver.search(&state, Duration::from_millis(250), &[11, 22]);
    assert_eq!(engines.len(), 2);

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    match driver.merge_best_move(&engines, &mut rng) {
        BestMove::Move(mv) => assert!(state.board().is_empty(mv)),
        BestMove::GameOver => panic!("empty board is never game over"),
    }
}

#[test]
fn test_full_game_between_two_engines_always_ends_decisively() {
    let mut red = RaveEngine::with_seed(small_config(), UniformRollout, 100);
    let mut blue = RaveEngine::with_seed(small_config(), UniformRollout, 200);
    let mut state = GameState::new(5);

    loop {
        let engine_to_move = if state.to_play() == hexwar_core::Player::Red { &mut red } else { &mut blue };
        engine_to_move.set_gamestate(state.clone());
        engine_to_move.search(Duration::from_millis(50));

        match engine_to_move.best_move() {
            BestMove::Move(mv) => state.play(mv).unwrap(),
            BestMove::GameOver => break,
        }
    }

    assert_ne!(state.winner(), hexwar_core::Player::None);
}
