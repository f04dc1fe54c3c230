// shared identifier types
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Small positive category a slot is scoped to (session level 1..=5).
pub type Category = u32;

/// Per-category counter value underlying a stable identifier. Starts at 1.
pub type Sequence = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Active,
    //the source record disappeared; the reservation is kept indefinitely
    Orphaned,
}

/// Human-facing identifier for a slot: `"{category}-{sequence:02}"`.
///
/// Formatting here is presentation only; allocation guarantees live in
/// `MappingTable` (sequence >= 1, per-category monotonicity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId {
    pub category: Category,
    pub sequence: Sequence,
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.category, self.sequence)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed slot id {0:?} (expected \"<category>-<sequence>\")")]
pub struct SlotIdParseError(pub String);

impl FromStr for SlotId {
    type Err = SlotIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || SlotIdParseError(s.to_string());

        let (cat, seq) = s.split_once('-').ok_or_else(bad)?;
        let category: Category = cat.parse().map_err(|_| bad())?;
        let sequence: Sequence = seq.parse().map_err(|_| bad())?;

        // zero is never issued; a zero here means the document was tampered with
        if category == 0 || sequence == 0 {
            return Err(bad());
        }

        Ok(SlotId { category, sequence })
    }
}

/// Outcome of reconciling one slot against its existing artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Create,
    Update,
    //no write is issued for an unchanged slot
    Unchanged,
    /// Slot has no current source record. The reservation is kept either way;
    /// `remove_artifact` tells the materializer what to do with the file.
    Orphan { remove_artifact: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_id_display_zero_pads_to_two_digits() {
        assert_eq!(SlotId { category: 1, sequence: 1 }.to_string(), "1-01");
        assert_eq!(SlotId { category: 2, sequence: 1 }.to_string(), "2-01");
        assert_eq!(SlotId { category: 3, sequence: 42 }.to_string(), "3-42");
        // padding is a minimum width, not a cap
        assert_eq!(SlotId { category: 1, sequence: 100 }.to_string(), "1-100");
    }

    #[test]
    fn slot_id_parse_roundtrip() {
        for id in [
            SlotId { category: 1, sequence: 1 },
            SlotId { category: 5, sequence: 99 },
            SlotId { category: 2, sequence: 100 },
        ] {
            assert_eq!(id.to_string().parse::<SlotId>().unwrap(), id);
        }
    }

    #[test]
    fn slot_id_parse_rejects_malformed() {
        for bad in ["", "acd101", "1-", "-01", "1-xx", "0-01", "1-00", "1_01"] {
            assert!(bad.parse::<SlotId>().is_err(), "accepted {bad:?}");
        }
    }
}
