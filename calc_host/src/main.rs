//! # Calc
//!
//! Main entry point for the calculator host.

use calc_host::cli::Cli;
use calc_host::logging::{init_logging, LogConfig};
use calc_host::{load_calculator_config, HostRuntime, HostRuntimeConfig, TextSink};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::process;

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_verbosity(cli.verbose).with_ansi(!cli.no_color);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Error: failed to initialize logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let script = match &cli.script {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("Failed to read script file {}: {}", path.display(), e))?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let calculator = match &cli.config {
        Some(path) => load_calculator_config(path)?,
        None => Default::default(),
    };

    let config = HostRuntimeConfig {
        script: Some(script),
        calculator,
        max_steps: cli.max_steps,
    };

    let mut runtime = HostRuntime::new(config, TextSink::new(io::stdout().lock()))?;
    runtime.run()?;

    if cli.snapshot {
        println!("{}", serde_json::to_string_pretty(&runtime.snapshot())?);
    }

    Ok(())
}
