//! Engine configuration, constructed once and threaded through the façade
//! rather than read from process-wide mutable globals (see design notes).

use std::time::Duration;

/// Search hyperparameters and default time budget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MctsConfig {
    pub board_size: u8,
    /// UCT exploration constant `c` (0.5 in the combined RAVE engine; the
    /// leaf-parallel driver conventionally uses 1.0).
    pub exploration: f64,
    /// RAVE blending constant `K_rave`.
    pub rave_const: f64,
    /// LGR reply-bias threshold: a remembered reply is played only when a
    /// uniform draw exceeds this value.
    pub randomness: f64,
    pub time_budget: Duration,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            board_size: 11,
            exploration: 0.5,
            rave_const: 300.0,
            randomness: 0.5,
            time_budget: Duration::from_secs(2),
        }
    }
}
