//! Calculator snapshot for deterministic parity testing

use serde::{Deserialize, Serialize};

use crate::mode::ModeKind;

/// Complete calculator state snapshot for parity testing
///
/// Two hosts replaying the same key trace must produce equal snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorSnapshot {
    pub mode: ModeKind,
    pub buffer: String,
    pub cursor: usize,
    pub is_result_shown: bool,
    pub memory: f64,
    pub tax_rate: f64,
    pub grand_total: f64,
    pub history_len: usize,
    pub open_paren_count: usize,
}

impl CalculatorSnapshot {
    /// Compute a deterministic hash of the snapshot state
    /// This is used for fast comparison in parity tests
    #[cfg(test)]
    pub fn hash(&self) -> u64 {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();

        hasher.update(self.mode.as_str().as_bytes());
        hasher.update(self.buffer.as_bytes());
        hasher.update(self.cursor.to_le_bytes());
        hasher.update([self.is_result_shown as u8]);

        // Accumulators by bit pattern so -0.0 and 0.0 differ
        hasher.update(self.memory.to_bits().to_le_bytes());
        hasher.update(self.tax_rate.to_bits().to_le_bytes());
        hasher.update(self.grand_total.to_bits().to_le_bytes());

        hasher.update(self.history_len.to_le_bytes());
        hasher.update(self.open_paren_count.to_le_bytes());

        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        u64::from_le_bytes(bytes)
    }
}
