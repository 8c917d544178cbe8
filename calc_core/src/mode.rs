//! Calculator entry modes
//!
//! Each variant owns only the sub-state its grammar needs, so a fraction
//! numerator can never leak into root entry and vice versa.

use serde::{Deserialize, Serialize};

use crate::buffer::ExprBuffer;

/// Which half of a fraction is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FractionPart {
    Numerator,
    Denominator,
}

/// Fraction entry sub-state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FractionEntry {
    pub numerator: ExprBuffer,
    pub denominator: ExprBuffer,
    pub active: FractionPart,
    /// Expression text before the fraction; the result is spliced after it
    pub prefix: String,
}

impl FractionEntry {
    /// Starts a fraction; a seeded numerator puts the caret in the denominator
    pub fn new(prefix: String, numerator: &str) -> Self {
        let active = if numerator.is_empty() {
            FractionPart::Numerator
        } else {
            FractionPart::Denominator
        };
        Self {
            numerator: ExprBuffer::new(numerator),
            denominator: ExprBuffer::default(),
            active,
            prefix,
        }
    }

    /// Fraction with both halves filled, caret in the denominator
    pub fn seeded(numerator: &str, denominator: &str) -> Self {
        Self {
            numerator: ExprBuffer::new(numerator),
            denominator: ExprBuffer::new(denominator),
            active: FractionPart::Denominator,
            prefix: String::new(),
        }
    }

    pub fn active_field(&self) -> &ExprBuffer {
        match self.active {
            FractionPart::Numerator => &self.numerator,
            FractionPart::Denominator => &self.denominator,
        }
    }

    pub fn active_field_mut(&mut self) -> &mut ExprBuffer {
        match self.active {
            FractionPart::Numerator => &mut self.numerator,
            FractionPart::Denominator => &mut self.denominator,
        }
    }

    pub fn select(&mut self, part: FractionPart) -> bool {
        let changed = self.active != part;
        self.active = part;
        self.active_field_mut().move_to_end();
        changed
    }
}

/// Which half of a root is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RootPart {
    Degree,
    Radicand,
}

/// Root entry sub-state, displayed as `degree√radicand`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootEntry {
    pub degree: ExprBuffer,
    pub radicand: ExprBuffer,
    pub active: RootPart,
    pub prefix: String,
}

impl RootEntry {
    pub const DEFAULT_DEGREE: &'static str = "2";

    pub fn new(prefix: String, radicand: &str) -> Self {
        Self {
            degree: ExprBuffer::new(Self::DEFAULT_DEGREE),
            radicand: ExprBuffer::new(radicand),
            active: RootPart::Radicand,
            prefix,
        }
    }

    pub fn active_field(&self) -> &ExprBuffer {
        match self.active {
            RootPart::Degree => &self.degree,
            RootPart::Radicand => &self.radicand,
        }
    }

    pub fn active_field_mut(&mut self) -> &mut ExprBuffer {
        match self.active {
            RootPart::Degree => &mut self.degree,
            RootPart::Radicand => &mut self.radicand,
        }
    }

    pub fn select(&mut self, part: RootPart) -> bool {
        let changed = self.active != part;
        self.active = part;
        self.active_field_mut().move_to_end();
        changed
    }
}

/// Active input grammar
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Mode {
    /// Live expression editing
    #[default]
    Normal,
    /// Editing the tax percentage; `text` is the rate being typed
    ///
    /// Until `touched`, `text` shows the current rate and the first digit
    /// replaces it.
    SettingTaxRate { text: String, touched: bool },
    /// Buffer holds the markup percentage applied to `base`
    MarkupEntry { base: f64 },
    FractionEntry(FractionEntry),
    RootEntry(RootEntry),
    /// Browsing `history[index]`
    HistoryReview { index: usize },
}

/// Data-free mode tag, for snapshots and dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeKind {
    Normal,
    SettingTaxRate,
    MarkupEntry,
    FractionEntry,
    RootEntry,
    HistoryReview,
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Normal => ModeKind::Normal,
            Mode::SettingTaxRate { .. } => ModeKind::SettingTaxRate,
            Mode::MarkupEntry { .. } => ModeKind::MarkupEntry,
            Mode::FractionEntry(_) => ModeKind::FractionEntry,
            Mode::RootEntry(_) => ModeKind::RootEntry,
            Mode::HistoryReview { .. } => ModeKind::HistoryReview,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.kind().as_str()
    }
}

impl ModeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::Normal => "NORMAL",
            ModeKind::SettingTaxRate => "TAX RATE",
            ModeKind::MarkupEntry => "MU",
            ModeKind::FractionEntry => "FRACTION",
            ModeKind::RootEntry => "ROOT",
            ModeKind::HistoryReview => "HISTORY",
        }
    }
}
