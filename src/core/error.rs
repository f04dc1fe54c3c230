use thiserror::Error;

use crate::core::types::{Category, Sequence, SlotId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("unknown source key: {0:?}")]
    UnknownSourceKey(String),

    #[error("invalid category {0} (categories start at 1)")]
    InvalidCategory(Category),

    #[error(
        "counter for category {category} is {next_sequence} but sequence {issued} was already issued"
    )]
    CounterBehindIssued {
        category: Category,
        next_sequence: Sequence,
        issued: Sequence,
    },

    #[error("slot {slot} is claimed by more than one source key")]
    DuplicateSlot { slot: SlotId },

    #[error("source key {source_key:?} carries an invalid slot assignment")]
    InvalidSlot { source_key: String },
}

//fatal: a slot we cannot inspect cannot be classified safely
#[derive(Debug, Error)]
#[error("failed to read existing artifact {slot}: {reason}")]
pub struct ArtifactError {
    pub slot: SlotId,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}
