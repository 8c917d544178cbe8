//! # Calc Core
//!
//! Shared calculator logic for every host: terminal, scripted tests, GUI.
//!
//! ## Philosophy
//!
//! - **Deterministic**: Same key trace => same calculator state
//! - **Modal entry**: Normal, tax rate, markup, fraction, root and history modes
//! - **Mechanism over policy**: Core evaluates and models the display, hosts draw
//! - **Errors are state**: Failed arithmetic shows `"Error"`; `handle_key` never fails
//!
//! ## Design
//!
//! The core provides:
//! - CalculatorCore: State machine owning buffer, mode, memory and history
//! - CoreOutcome: Structured results from each key
//! - DisplayModel: What a host should show, produced by `render`
//! - LongPressTimer: Virtual-time tap/hold resolution for dual-action keys
//! - CalculatorSnapshot: Deterministic state for parity testing
//! - Key event abstraction: Platform-independent input representation

pub mod buffer;
pub mod config;
pub mod core;
pub mod display;
pub mod error;
pub mod expr;
pub mod format;
pub mod key;
pub mod mode;
pub mod press;
pub mod snapshot;

pub use buffer::ExprBuffer;
pub use config::CalculatorConfig;
pub use self::core::{CalculatorCore, CoreOutcome, HistoryEntry, ERROR_TEXT};
pub use display::{render, DisplayFlags, DisplayModel, DisplaySink, SubField};
pub use error::CalcError;
pub use key::{Control, Direction, Function, Key, ModeRequest, Operator, Paren};
pub use mode::{Mode, ModeKind};
pub use press::{LongPressTimer, Millis, PressEvent, TimerHandle};
pub use snapshot::CalculatorSnapshot;
