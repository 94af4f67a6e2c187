//! HEXWAR MCTS - Monte Carlo Tree Search with RAVE for Hex
//!
//! Single-threaded engines (`RaveEngine`, `LgrEngine`) implement the
//! select/expand/rollout/backup loop of the search; [`parallel`] layers
//! leaf- and root-parallel drivers on top using plain OS threads.

pub mod config;
pub mod parallel;
pub mod rollout;
pub mod search;
pub mod tree;

pub use config::MctsConfig;
pub use parallel::RootParallelDriver;
pub use rollout::{LgrRollout, RolloutOutcome, RolloutPolicy, UniformRollout};
pub use search::{BestMove, EngineState, SearchEngine, SearchStats};
pub use tree::{MctsNode, MctsTree, NodeId, NodeStats};

/// The plain RAVE engine of §4.4: uniform-random rollouts, UCT+RAVE selection.
pub type RaveEngine = SearchEngine<UniformRollout>;

/// The Last-Good-Reply variant of §4.5: identical search loop, a
/// reply-table-biased rollout policy.
pub type LgrEngine = SearchEngine<LgrRollout>;
