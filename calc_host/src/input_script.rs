//! # Input Script Parser
//!
//! Provides a simple scripted input format for deterministic testing and demos.
//!
//! ## Format
//!
//! Scripts are line-based, with each line representing one input action:
//! - Key names: `sqrt`, `tax`, `tax+`, `mu`, `gt`, `mr`, `m+`, `ac`, `ce`, `del`
//! - Arrow keys: `Up`, `Down`, `Left`, `Right`
//! - Single characters: `7`, `+`, `*`, `(`, `=`
//! - Text strings: `"12+8="` (expanded to individual key presses)
//! - Held keys: `press tax` / `release tax`
//! - Comments: `# This is a comment`
//! - Delays: `wait 1200ms` (advances the virtual clock)
//!
//! ## Example
//!
//! ```text
//! # Set the tax rate to 7.5% with a long press
//! press tax
//! wait 1200ms
//! release tax
//! "7.5="
//! "200"
//! tax+                 # 215
//! ```

use calc_core::Key;
use std::collections::VecDeque;
use thiserror::Error;

/// Input script error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputScriptError {
    #[error("Invalid key name: {0}")]
    InvalidKeyName(String),

    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Empty script")]
    EmptyScript,

    #[error("Invalid delay format: {0}")]
    InvalidDelay(String),
}

/// A single scripted input action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedInput {
    /// Press and immediate release
    Key(Key),
    /// Key goes down and stays down
    Press(Key),
    /// Held key comes back up
    Release(Key),
    /// Advance the clock (in milliseconds)
    Wait(u64),
}

/// Input script
///
/// Parses and provides scripted input events for deterministic testing.
#[derive(Debug, Clone, Default)]
pub struct InputScript {
    inputs: VecDeque<ScriptedInput>,
}

impl InputScript {
    /// Creates a new empty input script
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a script from text
    pub fn from_text(text: &str) -> Result<Self, InputScriptError> {
        let mut inputs = VecDeque::new();

        for (line_num, line) in text.lines().enumerate() {
            let line = strip_comment(line).trim();

            // Skip empty lines and comments
            if line.is_empty() {
                continue;
            }

            let parsed = Self::parse_line(line, line_num + 1)?;
            inputs.extend(parsed);
        }

        if inputs.is_empty() {
            return Err(InputScriptError::EmptyScript);
        }

        Ok(Self { inputs })
    }

    /// Parses a single line of script
    fn parse_line(line: &str, line_num: usize) -> Result<Vec<ScriptedInput>, InputScriptError> {
        let with_line = |e: InputScriptError| InputScriptError::ParseError {
            line: line_num,
            message: e.to_string(),
        };

        if let Some(duration) = line.strip_prefix("wait ") {
            let millis = Self::parse_duration(duration).map_err(with_line)?;
            return Ok(vec![ScriptedInput::Wait(millis)]);
        }

        if let Some(name) = line.strip_prefix("press ") {
            let key = Self::parse_key(name).map_err(with_line)?;
            return Ok(vec![ScriptedInput::Press(key)]);
        }

        if let Some(name) = line.strip_prefix("release ") {
            let key = Self::parse_key(name).map_err(with_line)?;
            return Ok(vec![ScriptedInput::Release(key)]);
        }

        // Quoted strings expand to one key per character
        if line.len() >= 2 && line.starts_with('"') && line.ends_with('"') {
            return line[1..line.len() - 1]
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| {
                    Key::from_char(c)
                        .map(ScriptedInput::Key)
                        .ok_or_else(|| with_line(InputScriptError::InvalidKeyName(c.to_string())))
                })
                .collect();
        }

        let key = Self::parse_key(line).map_err(with_line)?;
        Ok(vec![ScriptedInput::Key(key)])
    }

    fn parse_key(name: &str) -> Result<Key, InputScriptError> {
        Key::from_name(name).ok_or_else(|| InputScriptError::InvalidKeyName(name.trim().to_string()))
    }

    /// Parses a duration string (e.g., "100ms", "1s")
    fn parse_duration(s: &str) -> Result<u64, InputScriptError> {
        let s = s.trim().to_lowercase();

        if let Some(ms_str) = s.strip_suffix("ms") {
            ms_str
                .trim()
                .parse::<u64>()
                .map_err(|_| InputScriptError::InvalidDelay(s.to_string()))
        } else if let Some(s_str) = s.strip_suffix('s') {
            s_str
                .trim()
                .parse::<u64>()
                .ok()
                .and_then(|secs| secs.checked_mul(1000))
                .ok_or_else(|| InputScriptError::InvalidDelay(s.to_string()))
        } else {
            Err(InputScriptError::InvalidDelay(s.to_string()))
        }
    }

    /// Returns the next input event, if any
    pub fn next_input(&mut self) -> Option<ScriptedInput> {
        self.inputs.pop_front()
    }

    /// Returns true if the script has more inputs
    pub fn has_more(&self) -> bool {
        !self.inputs.is_empty()
    }

    /// Returns the number of remaining inputs
    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

/// Drops a trailing `# comment` that is not inside a quoted string
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..idx],
            _ => {}
        }
    }
    line
}
