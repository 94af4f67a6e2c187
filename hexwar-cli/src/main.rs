//! HEXWAR CLI - driver protocol client
//!
//! Connects to a match server and plays Hex using the RAVE/LGR search
//! engine, per §4.9. The engine crate has zero knowledge of sockets; this
//! binary is the only thing that does.

mod protocol;

use std::time::Duration;

use clap::{Parser, ValueEnum};
use protocol::{DriverClient, ProtocolError};

use hexwar_mcts::{LgrRollout, MctsConfig, RolloutPolicy, UniformRollout};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Variant {
    /// Plain RAVE engine (§4.4): uniform-random rollouts.
    Rave,
    /// Last-Good-Reply engine (§4.5): reply-table-biased rollouts.
    Lgr,
}

#[derive(Parser)]
#[command(name = "hexwar")]
#[command(about = "HEXWAR Hex engine - driver protocol client")]
struct Cli {
    /// Match server host:port
    #[arg(long, default_value = "127.0.0.1:1234")]
    addr: String,

    /// Board size used before the first START frame arrives (overridden by it)
    #[arg(long, default_value_t = 11)]
    board_size: u8,

    /// Search variant
    #[arg(long, value_enum, default_value_t = Variant::Rave)]
    variant: Variant,

    /// Exploration constant (UCT c)
    #[arg(short = 'e', long, default_value_t = 0.5)]
    exploration: f64,

    /// RAVE constant (K_rave)
    #[arg(short = 'r', long = "rave", default_value_t = 300.0)]
    rave_const: f64,

    /// LGR randomness threshold (ignored unless --variant lgr)
    #[arg(long, default_value_t = 0.5)]
    randomness: f64,

    /// Search time budget per move, in seconds
    #[arg(short = 't', long = "time", default_value_t = 2.0)]
    time_budget_secs: f64,

    /// Number of root-parallel engines (single-threaded if unset)
    #[arg(short = 'p', long = "processes")]
    root_workers: Option<usize>,

    /// Number of leaf-parallel rollout workers per iteration (mutually
    /// exclusive with --processes; single-threaded if neither is set)
    #[arg(long = "leaf-workers")]
    leaf_workers: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if cli.root_workers.is_some() || cli.leaf_workers.is_some() {
        tracing::warn!(
            "parallel driver flags are accepted but the CLI binary runs the \
             single-threaded RaveEngine; root/leaf-parallel drivers are a \
             library-level API (hexwar_mcts::{{RootParallelDriver, \
             SearchEngine::leaf_parallel_search}}) for callers that embed the engine"
        );
    }

    let config = MctsConfig {
        board_size: cli.board_size,
        exploration: cli.exploration,
        rave_const: cli.rave_const,
        randomness: cli.randomness,
        time_budget: Duration::from_secs_f64(cli.time_budget_secs),
    };

    match cli.variant {
        Variant::Rave => run_session::<UniformRollout>(&cli.addr, config),
        Variant::Lgr => run_session::<LgrRollout>(&cli.addr, config),
    }
}

fn run_session<P: RolloutPolicy + Default>(addr: &str, config: MctsConfig) -> anyhow::Result<()> {
    let mut client: DriverClient<P> = DriverClient::connect(addr, config, config.time_budget)?;
    match client.run() {
        Ok(()) => Ok(()),
        Err(ProtocolError::Io(err)) => {
            tracing::error!(%err, "driver session ended with an i/o fault");
            std::process::exit(1);
        }
        Err(err @ ProtocolError::Framing(_)) => {
            tracing::error!(%err, "driver session ended with a protocol fault");
            std::process::exit(1);
        }
    }
}
