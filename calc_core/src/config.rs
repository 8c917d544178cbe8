//! Engine configuration

use serde::{Deserialize, Serialize};

/// Tunables for a calculator session
///
/// Every field has a default, so a partial JSON document is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Initial tax percentage, clamped to [0, 100]
    pub default_tax_rate: f64,
    /// Hold time that turns a press into a long press
    pub long_press_ms: u64,
    /// Decimal places results are rounded to before trailing zeros are stripped
    pub result_precision: usize,
    /// Decimal places of the grand total display
    pub grand_total_decimals: usize,
    /// Oldest history entries are dropped past this length; `None` keeps all
    pub history_limit: Option<usize>,
}

impl CalculatorConfig {
    pub const MAX_PRECISION: usize = 15;

    /// Returns the config with out-of-range values pulled back into range
    pub fn validated(mut self) -> Self {
        if !self.default_tax_rate.is_finite() {
            self.default_tax_rate = Self::default().default_tax_rate;
        }
        self.default_tax_rate = self.default_tax_rate.clamp(0.0, 100.0);
        self.result_precision = self.result_precision.min(Self::MAX_PRECISION);
        self.grand_total_decimals = self.grand_total_decimals.min(Self::MAX_PRECISION);
        self
    }
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            default_tax_rate: 5.0,
            long_press_ms: 1000,
            result_precision: 10,
            grand_total_decimals: 2,
            history_limit: None,
        }
    }
}
