//! # Calc Host Runtime
//!
//! Drives `calc_core` from key scripts and renders frames to a sink.
//!
//! ## Philosophy
//!
//! - **Host owns I/O**: The core never prints
//! - **Output is frame rendering**: Every changed state becomes a `DisplayModel`
//! - **Time is virtual**: `wait` advances a clock; long presses are deterministic
//! - **Deterministic mode is first-class**: Same script => same snapshot
//!
//! ## Responsibilities
//!
//! The host runtime:
//! - Parses key scripts
//! - Resolves taps and long presses through `LongPressTimer`
//! - Pushes frames to a `DisplaySink`
//! - Loads the calculator config from JSON

pub mod cli;
pub mod input_script;
pub mod logging;
pub mod runtime;
pub mod sink;

pub use input_script::{InputScript, InputScriptError, ScriptedInput};
pub use runtime::{load_calculator_config, HostRuntime, HostRuntimeConfig, HostRuntimeError};
pub use sink::{MemorySink, TextSink};
