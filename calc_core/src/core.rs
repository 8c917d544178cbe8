//! CalculatorCore state machine
//!
//! Owns every piece of calculator state and routes each key to the handler
//! of the active mode. Nothing here panics or returns `Err`: invalid
//! arithmetic shows the `"Error"` sentinel and reports the cause in the
//! returned [`CoreOutcome`].

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    buffer::ExprBuffer,
    config::CalculatorConfig,
    display::{self, DisplayModel},
    error::CalcError,
    expr,
    format::{self, decimal_to_fraction, format_number},
    key::{Control, Direction, Function, Key, ModeRequest, Operator},
    mode::{FractionEntry, FractionPart, Mode, ModeKind, RootEntry, RootPart},
    snapshot::CalculatorSnapshot,
};

/// Buffer content shown after a failed calculation
pub const ERROR_TEXT: &str = "Error";

/// One completed evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub equation: String,
    pub result: String,
}

/// Outcome from applying a key to the calculator
#[derive(Debug, Clone, PartialEq)]
pub enum CoreOutcome {
    /// Key not meaningful in the current state; nothing changed
    Ignored,
    /// State changed
    Changed,
    /// An evaluation completed and was appended to history
    Evaluated(HistoryEntry),
    /// An evaluation failed; the buffer shows the error sentinel
    Error(CalcError),
}

impl CoreOutcome {
    pub fn is_changed(&self) -> bool {
        !matches!(self, CoreOutcome::Ignored)
    }
}

/// Calculator state machine
pub struct CalculatorCore {
    config: CalculatorConfig,
    buffer: ExprBuffer,
    mode: Mode,
    is_result_shown: bool,
    memory: f64,
    tax_rate: f64,
    grand_total: f64,
    last_operation: Option<(Operator, f64)>,
    history: Vec<HistoryEntry>,
    open_paren_count: usize,
}

impl CalculatorCore {
    /// Create a calculator with default settings
    pub fn new() -> Self {
        Self::with_config(CalculatorConfig::default())
    }

    pub fn with_config(config: CalculatorConfig) -> Self {
        let config = config.validated();
        Self {
            tax_rate: config.default_tax_rate,
            config,
            buffer: ExprBuffer::new("0"),
            mode: Mode::Normal,
            is_result_shown: false,
            memory: 0.0,
            grand_total: 0.0,
            last_operation: None,
            history: Vec::new(),
            open_paren_count: 0,
        }
    }

    /// Apply a key event and return the outcome
    pub fn handle_key(&mut self, key: Key) -> CoreOutcome {
        trace!(?key, mode = self.mode.as_str(), "key");
        let outcome = match self.mode.kind() {
            ModeKind::Normal => self.handle_normal_mode(key),
            ModeKind::SettingTaxRate => self.handle_tax_rate_mode(key),
            ModeKind::MarkupEntry => self.handle_markup_mode(key),
            ModeKind::FractionEntry => self.handle_fraction_mode(key),
            ModeKind::RootEntry => self.handle_root_mode(key),
            ModeKind::HistoryReview => self.handle_history_mode(key),
        };
        self.open_paren_count = self.buffer.unmatched_parens();
        if let CoreOutcome::Error(err) = &outcome {
            warn!(%err, "calculation failed");
        }
        outcome
    }

    /// Display model for the presentation surface
    pub fn display(&self) -> DisplayModel {
        display::render(self)
    }

    /// Get a complete snapshot of calculator state (for parity testing)
    pub fn snapshot(&self) -> CalculatorSnapshot {
        CalculatorSnapshot {
            mode: self.mode.kind(),
            buffer: self.buffer.as_str().to_string(),
            cursor: self.buffer.cursor(),
            is_result_shown: self.is_result_shown,
            memory: self.memory,
            tax_rate: self.tax_rate,
            grand_total: self.grand_total,
            history_len: self.history.len(),
            open_paren_count: self.open_paren_count,
        }
    }

    // Public accessors for rendering/testing
    pub fn buffer(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn cursor(&self) -> usize {
        self.buffer.cursor()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_result_shown(&self) -> bool {
        self.is_result_shown
    }

    pub fn is_error(&self) -> bool {
        self.buffer.as_str() == ERROR_TEXT
    }

    pub fn memory(&self) -> f64 {
        self.memory
    }

    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    pub fn grand_total(&self) -> f64 {
        self.grand_total
    }

    pub fn last_operation(&self) -> Option<(Operator, f64)> {
        self.last_operation
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn open_paren_count(&self) -> usize {
        self.open_paren_count
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    // Private mode handlers

    fn handle_normal_mode(&mut self, key: Key) -> CoreOutcome {
        match key {
            Key::Digit(_)
            | Key::DoubleZero
            | Key::Decimal
            | Key::Operator(_)
            | Key::Paren(_) => match key.text() {
                Some(text) => self.insert_at_cursor(text),
                None => CoreOutcome::Ignored,
            },

            Key::Control(Control::Equals) => self.equals(),
            Key::Control(Control::Delete) => self.delete_at_cursor(),
            Key::Control(Control::ClearEntry) => self.clear_entry(),
            Key::Control(Control::ClearAll) => {
                self.clear_all();
                CoreOutcome::Changed
            }

            Key::Navigate(Direction::Left) => changed(self.buffer.move_left()),
            Key::Navigate(Direction::Right) => changed(self.buffer.move_right()),
            Key::Navigate(Direction::Up) => self.enter_history(),
            Key::Navigate(Direction::Down) => CoreOutcome::Ignored,

            Key::Function(function) => self.apply_function(function),

            Key::EnterMode(ModeRequest::TaxRate) => self.enter_tax_rate(),
            Key::EnterMode(ModeRequest::Markup) => self.enter_markup(),
            Key::EnterMode(ModeRequest::Fraction) => self.enter_fraction(),
        }
    }

    fn handle_tax_rate_mode(&mut self, key: Key) -> CoreOutcome {
        match key {
            Key::Control(Control::Equals) => return self.save_tax_rate(),
            Key::Control(Control::ClearAll) => {
                debug!("tax rate edit discarded");
                self.leave_entry_mode();
                return CoreOutcome::Changed;
            }
            _ => {}
        }

        let Mode::SettingTaxRate { text, touched } = &mut self.mode else {
            return CoreOutcome::Ignored;
        };

        let fresh = !*touched;
        let edited = match key {
            Key::Digit(d) => match char::from_digit(u32::from(d), 10) {
                Some(digit) => {
                    if fresh || text == "0" {
                        text.clear();
                    }
                    text.push(digit);
                    true
                }
                None => false,
            },
            Key::DoubleZero if !fresh && !text.is_empty() && text != "0" && text != "-" => {
                text.push_str("00");
                true
            }
            Key::Decimal if fresh || !text.contains('.') => {
                if fresh {
                    text.clear();
                }
                if !text.ends_with(|c: char| c.is_ascii_digit()) {
                    text.push('0');
                }
                text.push('.');
                true
            }
            Key::Control(Control::Delete) => text.pop().is_some(),
            Key::Control(Control::ClearEntry) => {
                *text = "0".into();
                true
            }
            Key::Function(Function::PlusMinus) => {
                if text.starts_with('-') {
                    text.remove(0);
                } else {
                    text.insert(0, '-');
                }
                true
            }
            _ => false,
        };
        if edited {
            *touched = true;
        }
        changed(edited)
    }

    fn handle_markup_mode(&mut self, key: Key) -> CoreOutcome {
        match key {
            Key::Control(Control::Equals)
            | Key::Function(Function::Markup)
            | Key::EnterMode(ModeRequest::Markup) => self.commit_markup(),
            Key::Control(Control::ClearAll) => {
                self.clear_all();
                CoreOutcome::Changed
            }
            Key::Function(_)
            | Key::EnterMode(_)
            | Key::Navigate(Direction::Up | Direction::Down) => CoreOutcome::Ignored,
            // the buffer is the percentage; edit it like a normal expression
            other => self.handle_normal_mode(other),
        }
    }

    fn handle_fraction_mode(&mut self, key: Key) -> CoreOutcome {
        match key {
            Key::Control(Control::Equals)
            | Key::Function(Function::Fraction)
            | Key::EnterMode(ModeRequest::Fraction) => return self.commit_fraction(),
            Key::Control(Control::ClearAll) => {
                self.clear_all();
                return CoreOutcome::Changed;
            }
            _ => {}
        }

        let Mode::FractionEntry(entry) = &mut self.mode else {
            return CoreOutcome::Ignored;
        };

        let edited = match key {
            Key::Navigate(Direction::Up) => entry.select(FractionPart::Numerator),
            Key::Navigate(Direction::Down) => entry.select(FractionPart::Denominator),
            other => edit_sub_field(entry.active_field_mut(), other),
        };
        changed(edited)
    }

    fn handle_root_mode(&mut self, key: Key) -> CoreOutcome {
        match key {
            Key::Control(Control::Equals) | Key::Function(Function::Root) => {
                return self.commit_root()
            }
            Key::Control(Control::ClearAll) => {
                self.clear_all();
                return CoreOutcome::Changed;
            }
            _ => {}
        }

        let Mode::RootEntry(entry) = &mut self.mode else {
            return CoreOutcome::Ignored;
        };

        let edited = match key {
            Key::Navigate(Direction::Up) => entry.select(RootPart::Degree),
            Key::Navigate(Direction::Down) => entry.select(RootPart::Radicand),
            other => edit_sub_field(entry.active_field_mut(), other),
        };
        changed(edited)
    }

    fn handle_history_mode(&mut self, key: Key) -> CoreOutcome {
        let Mode::HistoryReview { index } = &self.mode else {
            return CoreOutcome::Ignored;
        };
        let index = *index;

        match key {
            Key::Navigate(Direction::Up) => self.show_history_entry(index.saturating_sub(1)),
            Key::Navigate(Direction::Down) => {
                if index + 1 < self.history.len() {
                    self.show_history_entry(index + 1)
                } else {
                    self.leave_entry_mode();
                    CoreOutcome::Changed
                }
            }
            other => {
                // reviewed result stays as a shown result for the new key
                debug!("leaving history review");
                self.mode = Mode::Normal;
                match self.handle_normal_mode(other) {
                    CoreOutcome::Ignored => CoreOutcome::Changed,
                    outcome => outcome,
                }
            }
        }
    }

    // Buffer editing

    fn insert_at_cursor(&mut self, text: &str) -> CoreOutcome {
        let starts_number = text.chars().all(|c| c.is_ascii_digit() || c == '.');

        if self.is_result_shown || self.is_error() {
            if starts_number {
                let fresh = if text == "." { "0." } else { text };
                self.buffer.set(fresh);
                self.is_result_shown = false;
                return CoreOutcome::Changed;
            }
            if self.is_error() {
                self.buffer.set("0");
            }
            self.buffer.move_to_end();
            self.is_result_shown = false;
        }

        changed(self.buffer.type_text(text))
    }

    fn delete_at_cursor(&mut self) -> CoreOutcome {
        if self.is_error() {
            self.reset_buffer();
            return CoreOutcome::Changed;
        }
        if !self.buffer.backspace() {
            return CoreOutcome::Ignored;
        }
        if self.buffer.is_empty() {
            self.reset_buffer();
        }
        self.is_result_shown = false;
        CoreOutcome::Changed
    }

    fn clear_entry(&mut self) -> CoreOutcome {
        if self.is_result_shown {
            self.clear_all();
        } else {
            self.reset_buffer();
        }
        CoreOutcome::Changed
    }

    /// Full reset; memory and tax rate survive
    pub fn clear_all(&mut self) {
        debug!("clear all");
        self.buffer.set("0");
        self.mode = Mode::Normal;
        self.is_result_shown = false;
        self.last_operation = None;
        self.history.clear();
        self.grand_total = 0.0;
        self.open_paren_count = 0;
    }

    fn reset_buffer(&mut self) {
        self.buffer.set("0");
        self.is_result_shown = false;
    }

    fn leave_entry_mode(&mut self) {
        self.mode = Mode::Normal;
        self.reset_buffer();
    }

    // Evaluation

    fn equals(&mut self) -> CoreOutcome {
        if self.is_error() {
            return CoreOutcome::Ignored;
        }
        if self.is_result_shown {
            return match self.last_operation {
                Some((op, operand)) => self.repeat_last_operation(op, operand),
                None => CoreOutcome::Ignored,
            };
        }

        let equation = self.buffer.as_str().to_string();
        match expr::evaluate(&equation) {
            Ok(value) => {
                self.last_operation = expr::trailing_operation(&equation);
                self.show_result(equation, value)
            }
            Err(err) => self.fail(err),
        }
    }

    fn repeat_last_operation(&mut self, op: Operator, operand: f64) -> CoreOutcome {
        let result = self
            .current_value()
            .and_then(|value| op.apply(value, operand));
        match result {
            Ok(value) => {
                let equation = format!(
                    "{}{}{}",
                    self.buffer.as_str(),
                    op.symbol(),
                    self.format(operand)
                );
                self.show_result(equation, value)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Value of the whole buffer
    fn current_value(&self) -> Result<f64, CalcError> {
        expr::evaluate(self.buffer.as_str())
    }

    fn format(&self, value: f64) -> String {
        format_number(value, self.config.result_precision)
            .unwrap_or_else(|_| ERROR_TEXT.to_string())
    }

    /// Shows `value` as a result and records it in history
    fn show_result(&mut self, equation: String, value: f64) -> CoreOutcome {
        match format_number(value, self.config.result_precision) {
            Ok(result) => {
                debug!(%equation, %result, "evaluated");
                self.mode = Mode::Normal;
                self.buffer.set(&result);
                self.is_result_shown = true;
                let entry = HistoryEntry { equation, result };
                self.push_history(entry.clone());
                CoreOutcome::Evaluated(entry)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Shows `value` as a result without a history entry
    fn show_value(&mut self, value: f64, decimals: usize) -> CoreOutcome {
        match format_number(value, decimals) {
            Ok(text) => {
                self.buffer.set(&text);
                self.is_result_shown = true;
                self.last_operation = None;
                CoreOutcome::Changed
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: CalcError) -> CoreOutcome {
        self.mode = Mode::Normal;
        self.buffer.set(ERROR_TEXT);
        self.is_result_shown = true;
        self.last_operation = None;
        CoreOutcome::Error(err)
    }

    fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
        if let Some(limit) = self.config.history_limit {
            let excess = self.history.len().saturating_sub(limit);
            self.history.drain(..excess);
        }
    }

    // Function keys

    fn apply_function(&mut self, function: Function) -> CoreOutcome {
        let allowed_on_error = matches!(
            function,
            Function::MemoryRecall | Function::MemoryClear | Function::Fraction | Function::Root
        );
        if self.is_error() && !allowed_on_error {
            return CoreOutcome::Ignored;
        }

        match function {
            Function::Sqrt => self.square_root(),
            Function::Percent => self.percent(),
            Function::Fraction => self.enter_fraction(),
            Function::Root => self.enter_root(),
            Function::MemoryRecall => {
                if self.memory == 0.0 {
                    return CoreOutcome::Ignored;
                }
                self.show_value(self.memory, self.config.result_precision)
            }
            Function::MemoryClear => {
                debug!("memory cleared");
                self.memory = 0.0;
                CoreOutcome::Changed
            }
            Function::MemoryAdd => self.accumulate_memory(1.0),
            Function::MemorySub => self.accumulate_memory(-1.0),
            Function::Tax => self.apply_tax(Operator::Subtract),
            Function::TaxPlus => self.apply_tax(Operator::Add),
            Function::Markup => self.enter_markup(),
            Function::GrandTotal => match self.current_value() {
                Ok(value) => {
                    self.grand_total += value;
                    let decimals = self.config.grand_total_decimals;
                    let rounded = format::round_to(self.grand_total, decimals as i32);
                    self.show_value(rounded, decimals)
                }
                Err(err) => self.fail(err),
            },
            Function::Round => match self.current_value() {
                Ok(value) => self.show_value(value.round(), 0),
                Err(err) => self.fail(err),
            },
            Function::PlusMinus => {
                if self.is_error() || self.buffer.as_str() == "0" {
                    return CoreOutcome::Ignored;
                }
                self.buffer.toggle_leading_minus();
                if self.buffer.is_empty() {
                    self.reset_buffer();
                }
                CoreOutcome::Changed
            }
        }
    }

    fn square_root(&mut self) -> CoreOutcome {
        let value = match self.current_value() {
            Ok(value) => value,
            Err(err) => return self.fail(err),
        };
        if value < 0.0 {
            return self.fail(CalcError::domain("square root of a negative number"));
        }
        let equation = format!("√{}", parenthesize(self.buffer.as_str()));
        self.last_operation = None;
        self.show_result(equation, value.sqrt())
    }

    fn percent(&mut self) -> CoreOutcome {
        let Some(start) = self.buffer.trailing_number_start() else {
            return CoreOutcome::Ignored;
        };
        let (_, literal) = self.buffer.split_trailing_number();
        match literal.parse::<f64>() {
            Ok(value) => {
                let text = self.format(value / 100.0);
                self.buffer.replace_tail(start, &text);
                CoreOutcome::Changed
            }
            Err(_) => self.fail(CalcError::parse(format!("malformed number '{}'", literal))),
        }
    }

    fn accumulate_memory(&mut self, sign: f64) -> CoreOutcome {
        match self.current_value() {
            Ok(value) => {
                self.memory += sign * value;
                debug!(memory = self.memory, "memory updated");
                self.show_value(value, self.config.result_precision)
            }
            Err(err) => self.fail(err),
        }
    }

    fn apply_tax(&mut self, op: Operator) -> CoreOutcome {
        let value = match self.current_value() {
            Ok(value) => value,
            Err(err) => return self.fail(err),
        };
        let tax = value * (self.tax_rate / 100.0);
        match op.apply(value, tax) {
            Ok(result) => {
                let equation = format!(
                    "{}{}TAX({}%)",
                    self.format(value),
                    op.symbol(),
                    self.format(self.tax_rate)
                );
                self.last_operation = None;
                self.show_result(equation, result)
            }
            Err(err) => self.fail(err),
        }
    }

    // Mode entry and commit

    fn enter_tax_rate(&mut self) -> CoreOutcome {
        debug!(rate = self.tax_rate, "entering tax rate mode");
        self.mode = Mode::SettingTaxRate {
            text: self.format(self.tax_rate),
            touched: false,
        };
        CoreOutcome::Changed
    }

    fn save_tax_rate(&mut self) -> CoreOutcome {
        if let Mode::SettingTaxRate { text, .. } = &self.mode {
            match text.trim().parse::<f64>() {
                Ok(rate) if rate.is_finite() => {
                    self.tax_rate = rate.clamp(0.0, 100.0);
                    debug!(rate = self.tax_rate, "tax rate saved");
                }
                _ => debug!(%text, "invalid tax rate ignored"),
            }
        }
        self.leave_entry_mode();
        CoreOutcome::Changed
    }

    fn enter_markup(&mut self) -> CoreOutcome {
        match self.current_value() {
            Ok(base) => {
                debug!(base, "entering markup mode");
                self.mode = Mode::MarkupEntry { base };
                self.reset_buffer();
                CoreOutcome::Changed
            }
            Err(err) => self.fail(err),
        }
    }

    fn commit_markup(&mut self) -> CoreOutcome {
        let Mode::MarkupEntry { base } = self.mode else {
            return CoreOutcome::Ignored;
        };
        let rate = match self.current_value() {
            Ok(rate) => rate,
            Err(err) => return self.fail(err),
        };
        let equation = format!("{}+MU({}%)", self.format(base), self.format(rate));
        self.last_operation = None;
        self.show_result(equation, base + base * (rate / 100.0))
    }

    /// Prefix and trailing number used to seed fraction and root entry
    fn seed_from_buffer(&self) -> (String, String) {
        if self.is_error() || self.buffer.as_str() == "0" {
            return (String::new(), String::new());
        }
        if self.is_result_shown {
            return (String::new(), self.buffer.as_str().to_string());
        }
        self.buffer.split_trailing_number()
    }

    fn enter_fraction(&mut self) -> CoreOutcome {
        let shown_value = if self.is_result_shown && !self.is_error() {
            self.current_value().ok()
        } else {
            None
        };

        let entry = match shown_value.and_then(decimal_to_fraction) {
            Some((numerator, denominator)) if denominator != 1 => {
                FractionEntry::seeded(&numerator.to_string(), &denominator.to_string())
            }
            _ => {
                let (prefix, numerator) = self.seed_from_buffer();
                FractionEntry::new(prefix, &numerator)
            }
        };

        debug!(numerator = entry.numerator.as_str(), "entering fraction mode");
        self.is_result_shown = false;
        self.mode = Mode::FractionEntry(entry);
        CoreOutcome::Changed
    }

    fn commit_fraction(&mut self) -> CoreOutcome {
        let Mode::FractionEntry(entry) = std::mem::take(&mut self.mode) else {
            return CoreOutcome::Ignored;
        };
        let value = expr::evaluate(entry.numerator.as_str()).and_then(|numerator| {
            let denominator = expr::evaluate(entry.denominator.as_str())?;
            Operator::Divide.apply(numerator, denominator)
        });
        let equation = format!(
            "{}/{}",
            parenthesize(entry.numerator.as_str()),
            parenthesize(entry.denominator.as_str())
        );
        self.finish_entry(entry.prefix, equation, value)
    }

    fn enter_root(&mut self) -> CoreOutcome {
        let (prefix, radicand) = self.seed_from_buffer();
        debug!(%radicand, "entering root mode");
        self.is_result_shown = false;
        self.mode = Mode::RootEntry(RootEntry::new(prefix, &radicand));
        CoreOutcome::Changed
    }

    fn commit_root(&mut self) -> CoreOutcome {
        let Mode::RootEntry(entry) = std::mem::take(&mut self.mode) else {
            return CoreOutcome::Ignored;
        };
        let value = expr::evaluate(entry.degree.as_str()).and_then(|degree| {
            let radicand = expr::evaluate(entry.radicand.as_str())?;
            expr::nth_root(radicand, degree)
        });
        let equation = format!(
            "{}√{}",
            parenthesize(entry.degree.as_str()),
            parenthesize(entry.radicand.as_str())
        );
        self.finish_entry(entry.prefix, equation, value)
    }

    /// Lands a fraction or root value back in Normal mode
    ///
    /// Without a prefix the value becomes a shown result; with one it is
    /// spliced after the prefix and editing continues.
    fn finish_entry(
        &mut self,
        prefix: String,
        equation: String,
        value: Result<f64, CalcError>,
    ) -> CoreOutcome {
        self.mode = Mode::Normal;
        let value = match value {
            Ok(value) => value,
            Err(err) => return self.fail(err),
        };
        if prefix.is_empty() {
            self.last_operation = None;
            return self.show_result(equation, value);
        }
        match format_number(value, self.config.result_precision) {
            Ok(text) => {
                self.buffer.set(&format!("{}{}", prefix, text));
                self.is_result_shown = false;
                CoreOutcome::Changed
            }
            Err(err) => self.fail(err),
        }
    }

    // History

    fn enter_history(&mut self) -> CoreOutcome {
        if self.history.is_empty() {
            return CoreOutcome::Ignored;
        }
        debug!(entries = self.history.len(), "entering history review");
        self.show_history_entry(self.history.len() - 1)
    }

    fn show_history_entry(&mut self, index: usize) -> CoreOutcome {
        let Some(entry) = self.history.get(index) else {
            self.leave_entry_mode();
            return CoreOutcome::Changed;
        };
        let result = entry.result.clone();
        self.mode = Mode::HistoryReview { index };
        self.buffer.set(&result);
        self.is_result_shown = true;
        self.last_operation = None;
        CoreOutcome::Changed
    }
}

impl Default for CalculatorCore {
    fn default() -> Self {
        Self::new()
    }
}

fn changed(edited: bool) -> CoreOutcome {
    if edited {
        CoreOutcome::Changed
    } else {
        CoreOutcome::Ignored
    }
}

/// Editing keys shared by the fraction and root sub-fields
fn edit_sub_field(field: &mut ExprBuffer, key: Key) -> bool {
    match key {
        Key::Navigate(Direction::Left) => field.move_left(),
        Key::Navigate(Direction::Right) => field.move_right(),
        Key::Control(Control::Delete) => field.backspace(),
        Key::Control(Control::ClearEntry) => field.clear(),
        other => match other.text() {
            Some(text) => field.type_text(text),
            None => false,
        },
    }
}

/// Wraps compound sub-expressions in parentheses for history equations
fn parenthesize(text: &str) -> String {
    let compound = text
        .chars()
        .skip(1)
        .any(|c| Operator::is_operator_char(c) || c == '(' || c == ')');
    if compound {
        format!("({})", text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{Direction, Paren};

    fn type_keys(calc: &mut CalculatorCore, input: &str) {
        for ch in input.chars() {
            let key = Key::from_char(ch).expect("test input uses keypad characters");
            calc.handle_key(key);
        }
    }

    fn equals(calc: &mut CalculatorCore) -> CoreOutcome {
        calc.handle_key(Key::Control(Control::Equals))
    }

    #[test]
    fn test_new_calculator() {
        let calc = CalculatorCore::new();
        assert_eq!(calc.buffer(), "0");
        assert_eq!(calc.cursor(), 1);
        assert_eq!(calc.mode(), &Mode::Normal);
        assert_eq!(calc.tax_rate(), 5.0);
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_basic_scenario() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "12+8");
        let outcome = equals(&mut calc);
        assert_eq!(calc.buffer(), "20");
        assert!(calc.is_result_shown());
        assert_eq!(
            outcome,
            CoreOutcome::Evaluated(HistoryEntry {
                equation: "12+8".into(),
                result: "20".into(),
            })
        );
        assert_eq!(calc.history().len(), 1);
    }

    #[test]
    fn test_digit_after_result_starts_fresh() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "2+2=");
        type_keys(&mut calc, "7");
        assert_eq!(calc.buffer(), "7");
        assert!(!calc.is_result_shown());
    }

    #[test]
    fn test_operator_after_result_appends() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "2+2=");
        type_keys(&mut calc, "×3");
        assert_eq!(calc.buffer(), "4×3");
        equals(&mut calc);
        assert_eq!(calc.buffer(), "12");
    }

    #[test]
    fn test_repeat_on_equals() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "5+3");
        equals(&mut calc);
        assert_eq!(calc.buffer(), "8");
        equals(&mut calc);
        assert_eq!(calc.buffer(), "11");
        equals(&mut calc);
        assert_eq!(calc.buffer(), "14");
        assert_eq!(calc.history()[1].equation, "8+3");
        assert_eq!(calc.history().len(), 3);
    }

    #[test]
    fn test_shown_values_drop_repeat_pair() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "5+3=");
        type_keys(&mut calc, "2.6");
        calc.handle_key(Key::Function(Function::Round));
        assert_eq!(calc.buffer(), "3");
        assert_eq!(equals(&mut calc), CoreOutcome::Ignored);
        assert_eq!(calc.buffer(), "3");

        type_keys(&mut calc, "5+3=");
        type_keys(&mut calc, "10");
        calc.handle_key(Key::Function(Function::MemoryAdd));
        assert_eq!(equals(&mut calc), CoreOutcome::Ignored);
        assert_eq!(calc.buffer(), "10");

        calc.handle_key(Key::Function(Function::MemoryRecall));
        assert_eq!(equals(&mut calc), CoreOutcome::Ignored);
        assert_eq!(calc.history().len(), 2);
    }

    #[test]
    fn test_operator_after_paren_minus_is_ignored() {
        let mut calc = CalculatorCore::new();
        calc.handle_key(Key::Paren(Paren::Open));
        type_keys(&mut calc, "-");
        assert_eq!(calc.buffer(), "(-");
        assert_eq!(
            calc.handle_key(Key::Operator(Operator::Multiply)),
            CoreOutcome::Ignored
        );
        assert_eq!(calc.buffer(), "(-");
    }

    #[test]
    fn test_operator_before_leading_minus_is_ignored() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "5");
        calc.handle_key(Key::Function(Function::PlusMinus));
        assert_eq!(calc.buffer(), "-5");
        calc.handle_key(Key::Navigate(Direction::Left));
        assert_eq!(
            calc.handle_key(Key::Operator(Operator::Multiply)),
            CoreOutcome::Ignored
        );
        assert_eq!(calc.buffer(), "-5");
        assert!(matches!(equals(&mut calc), CoreOutcome::Evaluated(_)));
        assert_eq!(calc.buffer(), "-5");
    }

    #[test]
    fn test_equals_without_last_operation_is_noop() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "42=");
        assert_eq!(calc.buffer(), "42");
        assert_eq!(equals(&mut calc), CoreOutcome::Ignored);
        assert_eq!(calc.buffer(), "42");
        assert_eq!(calc.history().len(), 1);
    }

    #[test]
    fn test_division_by_zero() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "7÷0");
        assert_eq!(equals(&mut calc), CoreOutcome::Error(CalcError::DivisionByZero));
        assert_eq!(calc.buffer(), ERROR_TEXT);
        assert!(calc.is_error());
        assert!(calc.history().is_empty());

        // next digit starts fresh
        type_keys(&mut calc, "3");
        assert_eq!(calc.buffer(), "3");
    }

    #[test]
    fn test_delete_last_char_resets_to_zero() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "5");
        calc.handle_key(Key::Control(Control::Delete));
        assert_eq!(calc.buffer(), "0");
        assert_eq!(calc.cursor(), 1);
    }

    #[test]
    fn test_insert_at_cursor_mid_buffer() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "15");
        calc.handle_key(Key::Navigate(Direction::Left));
        type_keys(&mut calc, "2");
        assert_eq!(calc.buffer(), "125");
        assert_eq!(calc.cursor(), 2);
    }

    #[test]
    fn test_clear_entry_and_clear_all() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "9");
        calc.handle_key(Key::Function(Function::MemoryAdd));
        type_keys(&mut calc, "1+1=");
        type_keys(&mut calc, "5");
        calc.handle_key(Key::Control(Control::ClearEntry));
        assert_eq!(calc.buffer(), "0");
        assert_eq!(calc.history().len(), 1);

        type_keys(&mut calc, "3=");
        calc.handle_key(Key::Control(Control::ClearEntry));
        assert!(calc.history().is_empty());
        assert_eq!(calc.memory(), 9.0);
        assert_eq!(calc.tax_rate(), 5.0);
    }

    #[test]
    fn test_parens_counted() {
        let mut calc = CalculatorCore::new();
        calc.handle_key(Key::Paren(Paren::Open));
        type_keys(&mut calc, "2+3");
        assert_eq!(calc.open_paren_count(), 1);
        type_keys(&mut calc, ")×4");
        assert_eq!(calc.open_paren_count(), 0);
        equals(&mut calc);
        assert_eq!(calc.buffer(), "20");
    }

    #[test]
    fn test_tax_rate_mode() {
        let mut calc = CalculatorCore::new();
        calc.handle_key(Key::EnterMode(ModeRequest::TaxRate));
        assert_eq!(
            calc.mode(),
            &Mode::SettingTaxRate {
                text: "5".into(),
                touched: false,
            }
        );
        type_keys(&mut calc, "75");
        assert_eq!(calc.handle_key(Key::Operator(Operator::Add)), CoreOutcome::Ignored);
        equals(&mut calc);
        assert_eq!(calc.tax_rate(), 75.0);
        assert_eq!(calc.mode(), &Mode::Normal);
        assert_eq!(calc.buffer(), "0");
    }

    #[test]
    fn test_tax_rate_clamped_and_discarded() {
        let mut calc = CalculatorCore::new();
        calc.handle_key(Key::EnterMode(ModeRequest::TaxRate));
        type_keys(&mut calc, "250");
        equals(&mut calc);
        assert_eq!(calc.tax_rate(), 100.0);

        calc.handle_key(Key::EnterMode(ModeRequest::TaxRate));
        calc.handle_key(Key::Function(Function::PlusMinus));
        equals(&mut calc);
        assert_eq!(calc.tax_rate(), 0.0);

        calc.handle_key(Key::EnterMode(ModeRequest::TaxRate));
        type_keys(&mut calc, "9");
        calc.handle_key(Key::Control(Control::ClearAll));
        assert_eq!(calc.tax_rate(), 0.0);
        assert_eq!(calc.mode(), &Mode::Normal);
    }

    #[test]
    fn test_tax_rate_ignores_out_of_range_digit() {
        let mut calc = CalculatorCore::new();
        calc.handle_key(Key::EnterMode(ModeRequest::TaxRate));
        assert_eq!(calc.handle_key(Key::Digit(250)), CoreOutcome::Ignored);
        assert_eq!(calc.display().text, "TAX RATE: 5");
        type_keys(&mut calc, "8");
        equals(&mut calc);
        assert_eq!(calc.tax_rate(), 8.0);
    }

    #[test]
    fn test_tax_rate_edits_after_first_key() {
        let mut calc = CalculatorCore::new();
        calc.handle_key(Key::EnterMode(ModeRequest::TaxRate));
        type_keys(&mut calc, ".5");
        assert_eq!(calc.display().text, "TAX RATE: 0.5");
        assert_eq!(calc.handle_key(Key::Decimal), CoreOutcome::Ignored);
        calc.handle_key(Key::Control(Control::ClearEntry));
        type_keys(&mut calc, "12");
        equals(&mut calc);
        assert_eq!(calc.tax_rate(), 12.0);
    }

    #[test]
    fn test_invalid_tax_rate_ignored() {
        let mut calc = CalculatorCore::new();
        calc.handle_key(Key::EnterMode(ModeRequest::TaxRate));
        calc.handle_key(Key::Control(Control::Delete));
        equals(&mut calc);
        assert_eq!(calc.tax_rate(), 5.0);
    }

    #[test]
    fn test_tax_functions() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "200");
        let outcome = calc.handle_key(Key::Function(Function::TaxPlus));
        assert_eq!(calc.buffer(), "210");
        assert_eq!(
            outcome,
            CoreOutcome::Evaluated(HistoryEntry {
                equation: "200+TAX(5%)".into(),
                result: "210".into(),
            })
        );

        type_keys(&mut calc, "200");
        calc.handle_key(Key::Function(Function::Tax));
        assert_eq!(calc.buffer(), "190");
    }

    #[test]
    fn test_markup_mode() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "80");
        calc.handle_key(Key::Function(Function::Markup));
        assert_eq!(calc.mode(), &Mode::MarkupEntry { base: 80.0 });
        assert_eq!(calc.buffer(), "0");
        type_keys(&mut calc, "25");
        equals(&mut calc);
        assert_eq!(calc.buffer(), "100");
        assert_eq!(calc.mode(), &Mode::Normal);
        assert_eq!(calc.history()[0].equation, "80+MU(25%)");
    }

    #[test]
    fn test_fraction_divide_by_zero() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "1");
        calc.handle_key(Key::Function(Function::Fraction));
        type_keys(&mut calc, "0");
        assert_eq!(equals(&mut calc), CoreOutcome::Error(CalcError::DivisionByZero));
        assert_eq!(calc.buffer(), ERROR_TEXT);
        assert_eq!(calc.mode(), &Mode::Normal);
    }

    #[test]
    fn test_fraction_sub_expressions() {
        let mut calc = CalculatorCore::new();
        calc.handle_key(Key::Function(Function::Fraction));
        type_keys(&mut calc, "1+2");
        calc.handle_key(Key::Navigate(Direction::Down));
        type_keys(&mut calc, "4");
        calc.handle_key(Key::Function(Function::Fraction));
        assert_eq!(calc.buffer(), "0.75");
        assert_eq!(calc.history()[0].equation, "(1+2)/4");
    }

    #[test]
    fn test_fraction_with_prefix_continues_expression() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "3+1");
        calc.handle_key(Key::Function(Function::Fraction));
        type_keys(&mut calc, "2");
        equals(&mut calc);
        assert_eq!(calc.buffer(), "3+0.5");
        assert!(!calc.is_result_shown());
        equals(&mut calc);
        assert_eq!(calc.buffer(), "3.5");
    }

    #[test]
    fn test_fraction_from_shown_result() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "3÷4=");
        calc.handle_key(Key::Function(Function::Fraction));
        let Mode::FractionEntry(entry) = calc.mode() else {
            panic!("expected fraction entry");
        };
        assert_eq!(entry.numerator.as_str(), "3");
        assert_eq!(entry.denominator.as_str(), "4");
    }

    #[test]
    fn test_root_mode() {
        let mut calc = CalculatorCore::new();
        calc.handle_key(Key::Function(Function::Root));
        type_keys(&mut calc, "9");
        equals(&mut calc);
        assert_eq!(calc.buffer(), "3");

        calc.handle_key(Key::Function(Function::Root));
        calc.handle_key(Key::Navigate(Direction::Up));
        calc.handle_key(Key::Control(Control::Delete));
        type_keys(&mut calc, "3");
        calc.handle_key(Key::Navigate(Direction::Down));
        calc.handle_key(Key::Control(Control::ClearEntry));
        type_keys(&mut calc, "27");
        equals(&mut calc);
        assert_eq!(calc.buffer(), "3");
        assert_eq!(calc.history()[1].equation, "3√27");
    }

    #[test]
    fn test_root_errors() {
        let mut calc = CalculatorCore::new();
        calc.handle_key(Key::Function(Function::Root));
        type_keys(&mut calc, "-4");
        equals(&mut calc);
        assert!(calc.is_error());

        calc.handle_key(Key::Control(Control::ClearAll));
        calc.handle_key(Key::Function(Function::Root));
        calc.handle_key(Key::Navigate(Direction::Up));
        calc.handle_key(Key::Control(Control::ClearEntry));
        type_keys(&mut calc, "0");
        calc.handle_key(Key::Navigate(Direction::Down));
        type_keys(&mut calc, "8");
        assert!(matches!(equals(&mut calc), CoreOutcome::Error(CalcError::Domain(_))));
    }

    #[test]
    fn test_functions_ignored_on_error() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "1÷0=");
        assert_eq!(
            calc.handle_key(Key::Function(Function::Sqrt)),
            CoreOutcome::Ignored
        );
        assert_eq!(
            calc.handle_key(Key::Function(Function::MemoryAdd)),
            CoreOutcome::Ignored
        );
        assert_eq!(calc.buffer(), ERROR_TEXT);

        calc.handle_key(Key::Function(Function::Root));
        type_keys(&mut calc, "16=");
        assert_eq!(calc.buffer(), "4");
    }

    #[test]
    fn test_memory_keys() {
        let mut calc = CalculatorCore::new();
        assert_eq!(
            calc.handle_key(Key::Function(Function::MemoryRecall)),
            CoreOutcome::Ignored
        );
        type_keys(&mut calc, "10");
        calc.handle_key(Key::Function(Function::MemoryAdd));
        type_keys(&mut calc, "4");
        calc.handle_key(Key::Function(Function::MemorySub));
        assert_eq!(calc.memory(), 6.0);

        calc.handle_key(Key::Control(Control::ClearAll));
        calc.handle_key(Key::Function(Function::MemoryRecall));
        assert_eq!(calc.buffer(), "6");

        calc.handle_key(Key::Function(Function::MemoryClear));
        assert_eq!(calc.memory(), 0.0);
    }

    #[test]
    fn test_grand_total() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "10.125");
        calc.handle_key(Key::Function(Function::GrandTotal));
        assert_eq!(calc.buffer(), "10.13");
        type_keys(&mut calc, "5");
        calc.handle_key(Key::Function(Function::GrandTotal));
        assert_eq!(calc.grand_total(), 15.125);
        assert_eq!(calc.buffer(), "15.13");
        calc.handle_key(Key::Control(Control::ClearAll));
        assert_eq!(calc.grand_total(), 0.0);
    }

    #[test]
    fn test_percent_round_sqrt_plus_minus() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "200+10");
        calc.handle_key(Key::Function(Function::Percent));
        assert_eq!(calc.buffer(), "200+0.1");

        calc.handle_key(Key::Control(Control::ClearAll));
        type_keys(&mut calc, "2.6");
        calc.handle_key(Key::Function(Function::Round));
        assert_eq!(calc.buffer(), "3");

        type_keys(&mut calc, "16");
        calc.handle_key(Key::Function(Function::Sqrt));
        assert_eq!(calc.buffer(), "4");

        calc.handle_key(Key::Function(Function::PlusMinus));
        assert_eq!(calc.buffer(), "-4");
        type_keys(&mut calc, "=");

        calc.handle_key(Key::Control(Control::ClearAll));
        type_keys(&mut calc, "9");
        calc.handle_key(Key::Function(Function::PlusMinus));
        calc.handle_key(Key::Function(Function::Sqrt));
        assert!(calc.is_error());
    }

    #[test]
    fn test_history_review() {
        let mut calc = CalculatorCore::new();
        assert_eq!(
            calc.handle_key(Key::Navigate(Direction::Up)),
            CoreOutcome::Ignored
        );
        type_keys(&mut calc, "1+1=");
        type_keys(&mut calc, "2+2=");
        type_keys(&mut calc, "3+3=");

        calc.handle_key(Key::Navigate(Direction::Up));
        assert_eq!(calc.mode(), &Mode::HistoryReview { index: 2 });
        assert_eq!(calc.buffer(), "6");
        calc.handle_key(Key::Navigate(Direction::Up));
        calc.handle_key(Key::Navigate(Direction::Up));
        calc.handle_key(Key::Navigate(Direction::Up));
        assert_eq!(calc.mode(), &Mode::HistoryReview { index: 0 });
        assert_eq!(calc.buffer(), "2");

        calc.handle_key(Key::Navigate(Direction::Down));
        calc.handle_key(Key::Navigate(Direction::Down));
        assert_eq!(calc.buffer(), "6");
        calc.handle_key(Key::Navigate(Direction::Down));
        assert_eq!(calc.mode(), &Mode::Normal);
        assert_eq!(calc.buffer(), "0");
    }

    #[test]
    fn test_history_review_exits_on_input() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "4+4=");
        type_keys(&mut calc, "1=");
        calc.handle_key(Key::Navigate(Direction::Up));
        calc.handle_key(Key::Navigate(Direction::Up));
        type_keys(&mut calc, "+2");
        assert_eq!(calc.mode(), &Mode::Normal);
        assert_eq!(calc.buffer(), "8+2");

        calc.handle_key(Key::Navigate(Direction::Up));
        type_keys(&mut calc, "5");
        assert_eq!(calc.buffer(), "5");
    }

    #[test]
    fn test_clear_entry_in_history_review_clears_all() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "2+2=");
        calc.handle_key(Key::Navigate(Direction::Up));
        assert_eq!(
            calc.handle_key(Key::Control(Control::ClearEntry)),
            CoreOutcome::Changed
        );
        assert_eq!(calc.mode(), &Mode::Normal);
        assert_eq!(calc.buffer(), "0");
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_reviewed_value_has_no_repeat_pair() {
        let mut calc = CalculatorCore::new();
        type_keys(&mut calc, "1+1=");
        type_keys(&mut calc, "7×3=");
        calc.handle_key(Key::Navigate(Direction::Up));
        calc.handle_key(Key::Navigate(Direction::Up));
        assert_eq!(calc.buffer(), "2");
        assert_eq!(equals(&mut calc), CoreOutcome::Changed);
        assert_eq!(calc.buffer(), "2");
        assert_eq!(calc.history().len(), 2);
    }

    #[test]
    fn test_history_limit() {
        let config = CalculatorConfig {
            history_limit: Some(2),
            ..Default::default()
        };
        let mut calc = CalculatorCore::with_config(config);
        type_keys(&mut calc, "1=2=3=");
        let results: Vec<&str> = calc.history().iter().map(|e| e.result.as_str()).collect();
        assert_eq!(results, vec!["2", "3"]);
    }
}
