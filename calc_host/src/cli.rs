//! CLI argument definitions for the `calc` binary.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Debug, Parser)]
#[command(
    name = "calc",
    version,
    about = "Scriptable calculator engine",
    long_about = "Replays a key script through the calculator and prints every frame.\n\n\
                  Reads the script from stdin when --script is not given."
)]
pub struct Cli {
    /// Key script to run.
    #[arg(short, long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// JSON calculator config (tax rate, long-press delay, precision).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the final calculator snapshot as JSON.
    #[arg(long)]
    pub snapshot: bool,

    /// Stop after this many script actions (0 = unlimited).
    #[arg(long = "max-steps", value_name = "N", default_value_t = 0)]
    pub max_steps: usize,

    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable ANSI colors in log output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}
