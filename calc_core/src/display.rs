//! Display model and sink abstraction
//!
//! The core never draws. `render` turns calculator state into a
//! `DisplayModel`; a host pushes it to whatever `DisplaySink` it owns
//! (terminal, test buffer, GUI).

use serde::{Deserialize, Serialize};

use crate::{
    core::CalculatorCore,
    format::{format_number, group_thousands},
    mode::{FractionPart, Mode, RootPart},
};

/// Sub-field holding the caret in fraction and root entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubField {
    Numerator,
    Denominator,
    Degree,
    Radicand,
}

/// Status indicators shown beside the main line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayFlags {
    pub memory_active: bool,
    pub markup_active: bool,
    pub grand_total_active: bool,
    pub open_paren_count: usize,
}

/// Everything a presentation surface needs for one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayModel {
    pub text: String,
    /// Caret position in chars within `text`, or within the active
    /// sub-field when `field` is set
    pub cursor_offset: usize,
    pub field: Option<SubField>,
    /// Char offset in `text` where the active sub-field starts
    pub field_start: usize,
    pub flags: DisplayFlags,
    pub is_error: bool,
    pub caption: String,
}

impl DisplayModel {
    /// Main line with the caret drawn as `[x]`, `[ ]` at the end
    pub fn line_with_cursor(&self) -> String {
        let caret = self.caret_in_text();
        let mut line = String::new();
        let mut count = 0;
        for (i, ch) in self.text.chars().enumerate() {
            if i == caret {
                line.push('[');
                line.push(ch);
                line.push(']');
            } else {
                line.push(ch);
            }
            count += 1;
        }
        if caret >= count {
            line.push_str("[ ]");
        }
        line
    }

    /// Status line: caption followed by the active indicators
    pub fn status_line(&self) -> String {
        let mut status = self.caption.clone();
        if self.flags.memory_active {
            status.push_str(" M");
        }
        if self.flags.grand_total_active {
            status.push_str(" GT");
        }
        if self.flags.markup_active {
            status.push_str(" MU");
        }
        if self.flags.open_paren_count > 0 {
            status.push_str(&format!(" ({}", self.flags.open_paren_count));
        }
        status
    }

    /// Caret as a char offset into `text`
    fn caret_in_text(&self) -> usize {
        self.field_start + self.cursor_offset
    }
}

/// Output surface for rendered frames
pub trait DisplaySink {
    /// Shows one frame, replacing the previous one
    fn present(&mut self, model: &DisplayModel);
}

/// Renders the calculator's current state
pub fn render(calc: &CalculatorCore) -> DisplayModel {
    let flags = DisplayFlags {
        memory_active: calc.memory() != 0.0,
        markup_active: matches!(calc.mode(), Mode::MarkupEntry { .. }),
        grand_total_active: calc.grand_total() != 0.0,
        open_paren_count: calc.open_paren_count(),
    };
    let label = calc.mode().as_str().to_string();

    match calc.mode() {
        Mode::SettingTaxRate { text, .. } => {
            let text = format!("TAX RATE: {}", text);
            DisplayModel {
                cursor_offset: text.chars().count(),
                text,
                field: None,
                field_start: 0,
                flags,
                is_error: false,
                caption: label,
            }
        }
        Mode::FractionEntry(entry) => {
            let prefix_len = entry.prefix.chars().count();
            let (field, field_start) = match entry.active {
                FractionPart::Numerator => (SubField::Numerator, prefix_len),
                FractionPart::Denominator => {
                    (SubField::Denominator, prefix_len + entry.numerator.len() + 1)
                }
            };
            DisplayModel {
                text: format!(
                    "{}{}/{}",
                    entry.prefix,
                    entry.numerator.as_str(),
                    entry.denominator.as_str()
                ),
                cursor_offset: entry.active_field().cursor(),
                field: Some(field),
                field_start,
                flags,
                is_error: false,
                caption: label,
            }
        }
        Mode::RootEntry(entry) => {
            let prefix_len = entry.prefix.chars().count();
            let (field, field_start) = match entry.active {
                RootPart::Degree => (SubField::Degree, prefix_len),
                RootPart::Radicand => (SubField::Radicand, prefix_len + entry.degree.len() + 1),
            };
            DisplayModel {
                text: format!(
                    "{}{}√{}",
                    entry.prefix,
                    entry.degree.as_str(),
                    entry.radicand.as_str()
                ),
                cursor_offset: entry.active_field().cursor(),
                field: Some(field),
                field_start,
                flags,
                is_error: false,
                caption: label,
            }
        }
        mode => {
            let (text, cursor_offset) = if calc.is_error() {
                (calc.buffer().to_string(), calc.cursor())
            } else {
                group_thousands(calc.buffer(), calc.cursor())
            };
            let caption = match mode {
                Mode::HistoryReview { index } => calc
                    .history()
                    .get(*index)
                    .map(|entry| entry.equation.clone())
                    .unwrap_or(label),
                Mode::MarkupEntry { base } => {
                    match format_number(*base, calc.config().result_precision) {
                        Ok(base) => format!("MU {}", base),
                        Err(_) => label,
                    }
                }
                _ => label,
            };
            DisplayModel {
                text,
                cursor_offset,
                field: None,
                field_start: 0,
                flags,
                is_error: calc.is_error(),
                caption,
            }
        }
    }
}
