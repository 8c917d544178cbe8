//! # Host Runtime
//!
//! The event loop that ties script, clock, long-press timer, calculator and
//! display sink together.

use crate::input_script::{InputScript, InputScriptError, ScriptedInput};
use calc_core::{
    CalculatorConfig, CalculatorCore, CalculatorSnapshot, CoreOutcome, DisplaySink, Key,
    LongPressTimer, Millis,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Host runtime error types
#[derive(Debug, Error)]
pub enum HostRuntimeError {
    #[error("Script error: {0}")]
    ScriptError(#[from] InputScriptError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Host runtime configuration
#[derive(Debug, Clone, Default)]
pub struct HostRuntimeConfig {
    /// Input script text
    pub script: Option<String>,
    /// Calculator tunables
    pub calculator: CalculatorConfig,
    /// Maximum steps to run (0 = unlimited)
    pub max_steps: usize,
}

/// Loads a calculator config from a JSON file
pub fn load_calculator_config(path: &Path) -> Result<CalculatorConfig, HostRuntimeError> {
    let text = fs::read_to_string(path).map_err(|source| HostRuntimeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: CalculatorConfig =
        serde_json::from_str(&text).map_err(|source| HostRuntimeError::Config {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(config.validated())
}

/// Host runtime
pub struct HostRuntime<S: DisplaySink> {
    /// Configuration
    config: HostRuntimeConfig,
    /// Calculator state machine
    core: CalculatorCore,
    /// Tap/hold resolution for dual-action keys
    timer: LongPressTimer,
    /// Input script
    script: Option<InputScript>,
    /// Frame output
    sink: S,
    /// Virtual clock
    now: Millis,
    /// Step counter
    steps: usize,
    /// Outcome of the most recent dispatched key
    last_outcome: Option<CoreOutcome>,
}

impl<S: DisplaySink> HostRuntime<S> {
    /// Creates a new host runtime
    pub fn new(config: HostRuntimeConfig, sink: S) -> Result<Self, HostRuntimeError> {
        let script = match &config.script {
            Some(text) => Some(InputScript::from_text(text)?),
            None => None,
        };
        let core = CalculatorCore::with_config(config.calculator.clone());
        let timer = LongPressTimer::new(core.config().long_press_ms);

        Ok(Self {
            config,
            core,
            timer,
            script,
            sink,
            now: 0,
            steps: 0,
            last_outcome: None,
        })
    }

    /// Runs the script to the end
    ///
    /// Returns when:
    /// - Max steps reached (if configured)
    /// - Script exhausted
    pub fn run(&mut self) -> Result<(), HostRuntimeError> {
        // initial frame
        self.sink.present(&self.core.display());

        loop {
            if self.config.max_steps > 0 && self.steps >= self.config.max_steps {
                break;
            }

            let Some(input) = self.script.as_mut().and_then(InputScript::next_input) else {
                break;
            };

            self.step(input);
            self.steps += 1;
        }

        info!(steps = self.steps, elapsed_ms = self.now, "script finished");
        Ok(())
    }

    /// Executes one scripted input
    pub fn step(&mut self, input: ScriptedInput) {
        match input {
            ScriptedInput::Key(key) => self.dispatch(key),
            ScriptedInput::Press(key) => {
                if self.timer.press(key, self.now).is_none() {
                    // no long-press action; acts on press
                    self.dispatch(key);
                }
            }
            ScriptedInput::Release(key) => {
                if let Some(event) = self.timer.release(key, self.now) {
                    self.dispatch(event.key());
                }
            }
            ScriptedInput::Wait(millis) => self.advance_time(millis),
        }
    }

    /// Advances the virtual clock, firing a due long press
    pub fn advance_time(&mut self, millis: Millis) {
        self.now = self.now.saturating_add(millis);
        if let Some(event) = self.timer.poll(self.now) {
            debug!(?event, now = self.now, "long press");
            self.dispatch(event.key());
        }
    }

    /// Sends one key to the calculator and renders if it changed anything
    pub fn dispatch(&mut self, key: Key) {
        let outcome = self.core.handle_key(key);
        if outcome.is_changed() {
            self.sink.present(&self.core.display());
        }
        self.last_outcome = Some(outcome);
    }

    pub fn core(&self) -> &CalculatorCore {
        &self.core
    }

    pub fn snapshot(&self) -> CalculatorSnapshot {
        self.core.snapshot()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn step_count(&self) -> usize {
        self.steps
    }

    pub fn last_outcome(&self) -> Option<&CoreOutcome> {
        self.last_outcome.as_ref()
    }
}
