// identity allocation: slots + per-category counters
use std::collections::{BTreeMap, BTreeSet};

use crate::core::error::TableError;
use crate::core::types::{Category, Sequence, SlotId, SlotStatus};

/// One source key's permanent reservation. Never deleted, never renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAssignment {
    pub category: Category,
    pub sequence: Sequence,
    pub status: SlotStatus,
}

impl SlotAssignment {
    pub fn slot_id(&self) -> SlotId {
        SlotId {
            category: self.category,
            sequence: self.sequence,
        }
    }
}

/// Side note attached to an assignment when something is worth surfacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignNote {
    /// The record's category differs from the stored one. The stored pair
    /// stays authoritative; `rekey` is the only sanctioned way to move a slot.
    CategoryConflict {
        stored: Category,
        requested: Category,
    },
    /// A previously orphaned key reappeared and got its old slot back.
    Reactivated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub slot: SlotId,
    pub note: Option<AssignNote>,
}

/// The aggregate of all slot assignments plus all category counters.
///
/// Unit of durability: loaded once at run start, written back atomically once
/// at run end. Invariants:
/// 1. `(category, sequence)` is unique for all time.
/// 2. A source key maps to exactly one assignment for its lifetime.
/// 3. Counters hold `next_sequence`, strictly greater than every sequence
///    ever issued for their category, and never decrease.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    slots: BTreeMap<String, SlotAssignment>,
    counters: BTreeMap<Category, Sequence>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    //rebuild from persisted parts; a behind counter or a doubly-claimed slot
    //means the document was corrupted
    pub fn from_parts(
        slots: BTreeMap<String, SlotAssignment>,
        counters: BTreeMap<Category, Sequence>,
    ) -> Result<Self, TableError> {
        let mut claimed: BTreeSet<SlotId> = BTreeSet::new();

        for (source_key, slot) in &slots {
            if slot.category == 0 || slot.sequence == 0 {
                return Err(TableError::InvalidSlot {
                    source_key: source_key.clone(),
                });
            }

            let next = counters.get(&slot.category).copied().unwrap_or(1);
            if next <= slot.sequence {
                return Err(TableError::CounterBehindIssued {
                    category: slot.category,
                    next_sequence: next,
                    issued: slot.sequence,
                });
            }

            if !claimed.insert(slot.slot_id()) {
                return Err(TableError::DuplicateSlot {
                    slot: slot.slot_id(),
                });
            }
        }

        Ok(Self { slots, counters })
    }

    /// Allocate or look up the slot for `source_key`.
    ///
    /// A known key (active or orphaned) is marked active and keeps its stored
    /// pair unchanged; a differing requested category is flagged, never acted
    /// on. An unknown key takes `next_sequence` for its category, and the
    /// counter bump and slot insert happen in the same in-memory step so the
    /// single atomic save can never persist one without the other.
    pub fn assign(
        &mut self,
        source_key: &str,
        category: Category,
    ) -> Result<Assignment, TableError> {
        // category 0 is never issued; letting it through here would build a
        // table that saves fine but can never be loaded again
        if category == 0 {
            return Err(TableError::InvalidCategory(category));
        }

        if let Some(slot) = self.slots.get_mut(source_key) {
            let was_orphaned = slot.status == SlotStatus::Orphaned;
            slot.status = SlotStatus::Active;

            let note = if slot.category != category {
                Some(AssignNote::CategoryConflict {
                    stored: slot.category,
                    requested: category,
                })
            } else if was_orphaned {
                Some(AssignNote::Reactivated)
            } else {
                None
            };

            return Ok(Assignment {
                slot: slot.slot_id(),
                note,
            });
        }

        let sequence = self.counters.get(&category).copied().unwrap_or(1);
        self.counters.insert(category, sequence + 1);
        self.slots.insert(
            source_key.to_string(),
            SlotAssignment {
                category,
                sequence,
                status: SlotStatus::Active,
            },
        );

        let slot = SlotId { category, sequence };
        tracing::debug!(%slot, source_key, "allocated new slot");

        Ok(Assignment { slot, note: None })
    }

    /// Flip every active slot whose key was not seen this run to orphaned and
    /// return the newly orphaned pairs. Already-orphaned slots are left alone.
    pub fn mark_orphans(&mut self, seen: &BTreeSet<String>) -> Vec<(String, SlotId)> {
        let mut newly = Vec::new();

        for (source_key, slot) in self.slots.iter_mut() {
            if slot.status == SlotStatus::Active && !seen.contains(source_key) {
                slot.status = SlotStatus::Orphaned;
                newly.push((source_key.clone(), slot.slot_id()));
            }
        }

        newly
    }

    /// The only sanctioned way to move a slot to another category.
    ///
    /// Allocates a fresh sequence in the new category; the old pair stays
    /// burned because counters never decrement, so it can never be reissued.
    pub fn rekey(&mut self, source_key: &str, new_category: Category) -> Result<SlotId, TableError> {
        if new_category == 0 {
            return Err(TableError::InvalidCategory(new_category));
        }

        let current = self
            .slots
            .get(source_key)
            .copied()
            .ok_or_else(|| TableError::UnknownSourceKey(source_key.to_string()))?;

        if current.category == new_category {
            return Ok(current.slot_id());
        }

        let sequence = self.counters.get(&new_category).copied().unwrap_or(1);
        self.counters.insert(new_category, sequence + 1);

        let moved = SlotAssignment {
            category: new_category,
            sequence,
            status: current.status,
        };
        self.slots.insert(source_key.to_string(), moved);

        tracing::debug!(
            source_key,
            from = %current.slot_id(),
            to = %moved.slot_id(),
            "rekeyed slot"
        );

        Ok(moved.slot_id())
    }

    pub fn get(&self, source_key: &str) -> Option<&SlotAssignment> {
        self.slots.get(source_key)
    }

    /// `next_sequence` for a category; 1 when nothing was ever issued.
    pub fn next_sequence(&self, category: Category) -> Sequence {
        self.counters.get(&category).copied().unwrap_or(1)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter_slots(&self) -> impl Iterator<Item = (&str, &SlotAssignment)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_counters(&self) -> impl Iterator<Item = (Category, Sequence)> + '_ {
        self.counters.iter().map(|(&c, &n)| (c, n))
    }
}
