//! Dataset fingerprinting for result provenance.
//!
//! The hash covers the unit lengths and the exact bit patterns of `y` and
//! `x`, so two panels hash equal only if every estimator input is identical.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::panel::Panel;

/// Hex-encoded BLAKE3 digest of a panel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    /// First `n` hex characters, for display.
    pub fn short(&self, n: usize) -> &str {
        &self.0[..n.min(self.0.len())]
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn dataset_hash(panel: &Panel) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(panel.units() as u64).to_le_bytes());
    for t in panel.lengths().iter() {
        hasher.update(&(t as u64).to_le_bytes());
    }
    for v in panel.y().iter().chain(panel.x()) {
        hasher.update(&v.to_bits().to_le_bytes());
    }
    DatasetHash(hasher.finalize().to_hex().to_string())
}
