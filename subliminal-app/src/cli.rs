use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::logging::LogFormat;

/// Subliminal word-flash trial runner.
#[derive(Parser, Debug)]
#[command(name = "subliminal", version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format on stderr.
    #[arg(long, value_enum, default_value = "human", global = true, env = "SUBLIMINAL_LOG_FORMAT")]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a live session driven by commands on stdin.
    Run(RunArgs),

    /// Run one trial on a simulated clock and print its result as JSON.
    Simulate(SimulateArgs),

    /// Load and validate a configuration file.
    ValidateConfig(ValidateArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON experiment configuration; built-in defaults when omitted.
    #[arg(short, long, env = "SUBLIMINAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Display refresh rate. Falls back to the configured default.
    #[arg(long)]
    pub refresh_hz: Option<f32>,

    /// Directory receiving the session CSV.
    #[arg(short, long, default_value = "experiment_logs", env = "SUBLIMINAL_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Seed for word, wait and mask draws; OS entropy when omitted.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[arg(short, long, env = "SUBLIMINAL_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = 90.0)]
    pub refresh_hz: f32,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Target stimulus duration.
    #[arg(long, default_value_t = 100)]
    pub flash_ms: u32,

    #[arg(long, default_value_t = 1)]
    pub repetitions: u32,

    #[arg(long, default_value = "Indoor room")]
    pub background: String,

    #[arg(long, default_value = "Black void, white letters")]
    pub display: String,

    /// Forward mask duration, clamped to the configured bounds.
    #[arg(long)]
    pub forward_mask_ms: Option<u32>,

    /// Backward mask duration, clamped to the configured bounds.
    #[arg(long)]
    pub backward_mask_ms: Option<u32>,

    /// Simulated time between the guess prompt and the answer.
    #[arg(long, default_value_t = 500)]
    pub response_ms: u64,

    #[arg(long, value_enum, default_value = "target")]
    pub guess: GuessStrategy,

    /// Wall-clock stamp of simulated instant zero.
    #[arg(long, default_value_t = 0)]
    pub epoch_ms: u64,

    /// Also append the result to a session CSV in this directory.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GuessStrategy {
    /// Answer with the flashed word.
    Target,
    /// Answer with the first decoy.
    Decoy,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    pub path: PathBuf,
}
