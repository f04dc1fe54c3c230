// run summary: warnings are surfaced, never silent
use std::fmt;

use serde::Serialize;

use crate::core::types::{Category, Decision, SlotId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunWarning {
    /// More than one valid duration class; candidates were emitted in inert
    /// form and the record needs manual resolution.
    AmbiguousDuration {
        source_key: String,
        candidates: Vec<u32>,
    },
    /// The source record disappeared; the identifier reservation is retained.
    Orphaned { source_key: String, slot: SlotId },
    /// The record's category no longer matches the stored slot. The stored
    /// pair stays authoritative.
    CategoryConflict {
        source_key: String,
        stored: Category,
        requested: Category,
    },
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::AmbiguousDuration { source_key, candidates } => write!(
                f,
                "{source_key}: multiple duration classes {candidates:?}, needs manual resolution"
            ),
            RunWarning::Orphaned { source_key, slot } => {
                write!(f, "{source_key}: source record removed, slot {slot} stays reserved")
            }
            RunWarning::CategoryConflict { source_key, stored, requested } => write!(
                f,
                "{source_key}: category changed {stored} -> {requested}, keeping stored slot"
            ),
        }
    }
}

/// Per-decision counts for the final report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub orphaned: usize,
    pub needs_manual_resolution: usize,
}

impl RunSummary {
    pub fn record(&mut self, decision: Decision) {
        match decision {
            Decision::Create => self.created += 1,
            Decision::Update => self.updated += 1,
            Decision::Unchanged => self.unchanged += 1,
            Decision::Orphan { .. } => self.orphaned += 1,
        }
    }
}
