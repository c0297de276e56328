// consensus/src/hardfork.rs

//! Versioned hardfork tables.
//!
//! Hardfork transition points are compiled-in. Index 0 is the genesis rule
//! set; entry `n` describes the nth hardfork. The table is validated at
//! startup: versions must be strictly increasing and times non-decreasing,
//! and a gap or out-of-order entry is a fatal configuration error.

use chain_core::{ChainError, ChainResult, ProtocolVersion, Timestamp};

/// The compiled-in hardfork transition table
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HardforkSchedule {
    versions: Vec<ProtocolVersion>,
    times: Vec<Timestamp>,
}

impl HardforkSchedule {
    /// Build and validate a table. `entries[0]` is the genesis rule set.
    pub fn new(entries: &[(ProtocolVersion, Timestamp)]) -> ChainResult<Self> {
        if entries.is_empty() {
            return Err(ChainError::Consistency(
                "hardfork table must at least carry the genesis entry".into(),
            ));
        }
        for window in entries.windows(2) {
            if window[1].0 <= window[0].0 {
                return Err(ChainError::Consistency(format!(
                    "hardfork versions out of order: {} follows {}",
                    window[1].0, window[0].0
                )));
            }
            if window[1].1 < window[0].1 {
                return Err(ChainError::Consistency(format!(
                    "hardfork times out of order: {} follows {}",
                    window[1].1, window[0].1
                )));
            }
        }
        Ok(Self {
            versions: entries.iter().map(|(v, _)| *v).collect(),
            times: entries.iter().map(|(_, t)| *t).collect(),
        })
    }

    /// Number of hardforks in the table (excluding the genesis entry)
    pub fn num_hardforks(&self) -> u32 {
        (self.versions.len() - 1) as u32
    }

    pub fn version(&self, n: u32) -> ChainResult<ProtocolVersion> {
        self.versions
            .get(n as usize)
            .copied()
            .ok_or(ChainError::UnknownHardfork(n))
    }

    pub fn time(&self, n: u32) -> ChainResult<Timestamp> {
        self.times
            .get(n as usize)
            .copied()
            .ok_or(ChainError::UnknownHardfork(n))
    }

    pub fn latest_version(&self) -> ProtocolVersion {
        *self.versions.last().expect("table is never empty")
    }

    pub fn latest_time(&self) -> Timestamp {
        *self.times.last().expect("table is never empty")
    }
}
