// raw submission groups -> canonical source records
use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::record::{
    CanonicalContent, SourceRecord, canonical_room, canonical_schedule, classify_duration,
};
use crate::core::types::Category;

/// One grouped submission as handed over by the tabular loader: a session and
/// the speakers attached to it, all fields still free text.
#[derive(Debug, Clone, Default)]
pub struct RawSubmission {
    /// Upstream-declared unique session id.
    pub session_id: String,
    /// Free-text level label, e.g. "300 (Advanced)".
    pub level: String,
    pub title: String,
    pub abstract_text: String,
    pub duration: String,
    pub room: String,
    /// Agenda time in HHMM, e.g. "1100".
    pub agenda: String,
    /// Speaker slugs in upstream-declared order.
    pub speaker_slugs: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("submission {title:?} has an empty session id")]
    EmptySourceKey { title: String },

    #[error("duplicate session id in input: {0:?}")]
    DuplicateSourceKey(String),

    #[error("unrecognized session level label: {0:?}")]
    UnknownLevelLabel(String),
}

//exact enumerated mapping; anything else is a validation error, never a guess
fn category_for_level(label: &str) -> Option<Category> {
    match label.trim() {
        "100 (Beginner)" => Some(1),
        "200 (Intermediate)" => Some(2),
        "300 (Advanced)" => Some(3),
        "400 (Expert)" => Some(4),
        "500 (Principal)" => Some(5),
        _ => None,
    }
}

/// A validated batch of records, sorted by source key and guaranteed free of
/// duplicates. Only the normalizer can construct one, so the run driver can
/// rely on both properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBatch {
    records: Vec<SourceRecord>,
}

impl NormalizedBatch {
    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Event date (`YYYY-MM-DD`) the agenda times are anchored to.
    event_date: String,
}

impl Normalizer {
    pub fn new(event_date: impl Into<String>) -> Self {
        Self {
            event_date: event_date.into(),
        }
    }

    /// Normalize a whole input batch.
    ///
    /// Fatal: empty session id, duplicate session id, unrecognized level
    /// label. Missing non-identity fields become the explicit empty marker
    /// and the record continues.
    pub fn normalize_batch(
        &self,
        groups: Vec<RawSubmission>,
    ) -> Result<NormalizedBatch, NormalizeError> {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut records = Vec::with_capacity(groups.len());

        for group in groups {
            let record = self.normalize(&group)?;
            if !seen.insert(record.source_key.clone()) {
                // two claims on the same key would race for one sequence
                return Err(NormalizeError::DuplicateSourceKey(record.source_key));
            }
            records.push(record);
        }

        // deterministic processing order for the whole run
        records.sort_by(|a, b| a.source_key.cmp(&b.source_key));

        Ok(NormalizedBatch { records })
    }

    fn normalize(&self, group: &RawSubmission) -> Result<SourceRecord, NormalizeError> {
        let source_key = group.session_id.trim().to_string();
        if source_key.is_empty() {
            return Err(NormalizeError::EmptySourceKey {
                title: group.title.trim().to_string(),
            });
        }

        let category = category_for_level(&group.level)
            .ok_or_else(|| NormalizeError::UnknownLevelLabel(group.level.trim().to_string()))?;

        // declared order preserved: the normalizer never re-sorts speakers
        let participants = group
            .speaker_slugs
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(SourceRecord {
            source_key,
            category,
            content: CanonicalContent {
                title: group.title.trim().to_string(),
                schedule: canonical_schedule(&group.agenda, &self.event_date),
                room: canonical_room(&group.room),
                duration: classify_duration(&group.duration),
                participants,
                body: group.abstract_text.trim().to_string(),
            },
        })
    }
}
