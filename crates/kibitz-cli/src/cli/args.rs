use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use kibitz_core::{EngineConfig, SearchLimit};

#[derive(Parser)]
#[command(
    name = "kibitz",
    version,
    about = "UCI chess engine fleet: pooled evaluation, classical eval breakdowns"
)]
pub struct Cli {
    #[command(flatten)]
    pub engine: EngineOpts,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate a single position
    Eval(EvalArgs),
    /// Evaluate positions from a file, one FEN per line
    Batch(BatchArgs),
    /// Classical evaluation breakdown for a position
    Breakdown(BreakdownArgs),
    /// Start engines, report their health, shut down
    Health(HealthArgs),
}

/// Engine selection and tuning, shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct EngineOpts {
    /// Path to the UCI engine binary
    #[arg(long, global = true, default_value = "stockfish", env = "KIBITZ_ENGINE")]
    pub engine: PathBuf,

    /// UCI Threads option per engine process
    #[arg(long, global = true, default_value_t = 1, env = "KIBITZ_THREADS")]
    pub threads: u32,

    /// UCI Hash option per engine process, in MiB
    #[arg(long, global = true, default_value_t = 128, env = "KIBITZ_HASH_MB")]
    pub hash_mb: u32,

    /// Deadline for the engine startup handshake (e.g. "5s")
    #[arg(
        long,
        global = true,
        default_value = "5s",
        env = "KIBITZ_STARTUP_TIMEOUT"
    )]
    pub startup_timeout: humantime::Duration,

    /// Deadline for a single evaluation or breakdown (e.g. "60s")
    #[arg(
        long,
        global = true,
        default_value = "60s",
        env = "KIBITZ_COMMAND_TIMEOUT"
    )]
    pub command_timeout: humantime::Duration,
}

impl EngineOpts {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            path: self.engine.clone(),
            threads: self.threads,
            hash_mb: self.hash_mb,
            startup_timeout: self.startup_timeout.into(),
            command_timeout: self.command_timeout.into(),
        }
    }
}

/// Search bounds; any combination, none means the engine default depth.
#[derive(Args, Debug, Clone)]
pub struct LimitOpts {
    /// Maximum search depth in plies
    #[arg(long)]
    pub depth: Option<u32>,

    /// Maximum search time (e.g. "500ms", "3s")
    #[arg(long)]
    pub time: Option<humantime::Duration>,

    /// Maximum number of nodes to search
    #[arg(long)]
    pub nodes: Option<u64>,
}

impl LimitOpts {
    pub fn to_limit(&self) -> SearchLimit {
        SearchLimit {
            depth: self.depth,
            movetime: self.time.map(Into::into),
            nodes: self.nodes,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Position to evaluate, as a FEN string
    #[arg(long)]
    pub fen: String,

    #[command(flatten)]
    pub limit: LimitOpts,

    /// Number of principal variations to request (clamped to 1..=10)
    #[arg(long, default_value_t = 1)]
    pub multipv: i32,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// File with one FEN per line, "-" for stdin
    #[arg(long, default_value = "-")]
    pub input: PathBuf,

    #[command(flatten)]
    pub limit: LimitOpts,

    /// Number of engine processes to run
    #[arg(long, default_value_t = 2, env = "KIBITZ_POOL_SIZE")]
    pub pool_size: usize,

    /// Print one JSON object per position
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct BreakdownArgs {
    /// Position to break down, as a FEN string
    #[arg(long)]
    pub fen: String,

    /// Print the breakdown as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Number of engine processes to start
    #[arg(long, default_value_t = 2, env = "KIBITZ_POOL_SIZE")]
    pub pool_size: usize,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}
