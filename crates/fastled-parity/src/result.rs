//! Parity check result types.

use serde::{Deserialize, Serialize};

/// A key whose value differs between the two argument lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParityMismatch {
    /// Name of the offending key.
    pub key: String,

    /// Value in the sketch arguments. None when absent.
    pub sketch: Option<String>,

    /// Value in the library arguments. None when absent.
    pub library: Option<String>,
}

impl ParityMismatch {
    /// Machine-readable form, e.g. `PARITY_MISMATCH:-std=:-std=gnu++17!=-std=c++20`.
    pub fn to_code(&self) -> String {
        format!(
            "PARITY_MISMATCH:{}:{}!={}",
            self.key,
            self.sketch.as_deref().unwrap_or(ABSENT),
            self.library.as_deref().unwrap_or(ABSENT)
        )
    }
}

/// Placeholder used when a key is missing from one side.
pub const ABSENT: &str = "<absent>";

/// A key that agreed on both sides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckedKey {
    pub key: String,

    /// Shared value. None when both sides omit the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Outcome of comparing two argument lists over a key set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParityResult {
    /// Whether every key agreed.
    pub consistent: bool,

    /// Keys that agreed, in key-set order.
    #[serde(default)]
    pub matched: Vec<CheckedKey>,

    /// Keys that diverged, in key-set order.
    #[serde(default)]
    pub mismatches: Vec<ParityMismatch>,
}

impl ParityResult {
    /// First mismatch in key-set order.
    pub fn first_mismatch(&self) -> Option<&ParityMismatch> {
        self.mismatches.first()
    }

    /// Mismatches as machine-readable strings.
    pub fn mismatch_codes(&self) -> Vec<String> {
        self.mismatches.iter().map(|m| m.to_code()).collect()
    }
}
