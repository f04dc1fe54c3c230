//! Stable session identity and change reconciliation.
//!
//! Allocates compact, per-category sequence numbers to opaque source keys,
//! persists the allocation durably across runs, and classifies every
//! candidate output as create/update/unchanged/orphan by diffing fresh
//! records against previously materialized content. Identifiers are never
//! reused or renumbered, even across remove/re-add cycles.

pub mod core;
pub mod normalize;
pub mod report;
pub mod store;

pub use crate::core::error::{ArtifactError, RunError, TableError};
pub use crate::core::record::{
    CanonicalContent, DurationField, SourceRecord, canonical_room, canonical_schedule,
    classify_duration,
};
pub use crate::core::reconcile::{ArtifactFields, ArtifactSource, OrphanPolicy, Reconciler};
pub use crate::core::run::{RunOptions, RunPlan, SlotDecision, plan_run};
pub use crate::core::table::{Assignment, AssignNote, MappingTable, SlotAssignment};
pub use crate::core::types::{Category, Decision, Sequence, SlotId, SlotIdParseError, SlotStatus};
pub use crate::normalize::{NormalizeError, NormalizedBatch, Normalizer, RawSubmission};
pub use crate::report::{RunSummary, RunWarning};
pub use crate::store::{MappingStore, StoreError};
