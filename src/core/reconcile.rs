// change classification against existing artifacts
use crate::core::error::ArtifactError;
use crate::core::record::{CanonicalContent, DurationField, canonical_room};
use crate::core::types::{Decision, SlotId};

/// Canonical structured fields re-derived from a previously materialized
/// artifact, read back purely to detect content drift (which keeps
/// out-of-band manual edits visible to the diff).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactFields {
    pub title: String,
    pub schedule: String,
    pub room: String,
    //None when the artifact holds no resolved class (empty or inert candidates)
    pub duration: Option<u32>,
    pub participants: Vec<String>,
    pub body: String,
}

/// Where existing artifacts come from. Implemented by the materializer side;
/// the core never touches the filesystem for artifacts itself.
pub trait ArtifactSource {
    fn existing(&self, slot: SlotId) -> Result<Option<ArtifactFields>, ArtifactError>;
}

/// What happens to an orphaned slot's artifact. The sequence reservation is
/// kept under both policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrphanPolicy {
    /// Leave the artifact in place; cleanup is a manual decision.
    #[default]
    RetainArtifact,
    /// Tell the materializer to delete the artifact.
    RemoveArtifact,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    /// Emit `Update` for every record with an artifact, bypassing the diff.
    /// Never affects allocation.
    pub force_regenerate: bool,
    pub orphan_policy: OrphanPolicy,
}

impl Reconciler {
    pub fn classify(
        &self,
        content: &CanonicalContent,
        slot: SlotId,
        artifacts: &impl ArtifactSource,
    ) -> Result<Decision, ArtifactError> {
        let Some(existing) = artifacts.existing(slot)? else {
            return Ok(Decision::Create);
        };

        if self.force_regenerate {
            return Ok(Decision::Update);
        }

        if content_differs(content, &existing) {
            Ok(Decision::Update)
        } else {
            Ok(Decision::Unchanged)
        }
    }

    pub fn orphan_decision(&self) -> Decision {
        Decision::Orphan {
            remove_artifact: matches!(self.orphan_policy, OrphanPolicy::RemoveArtifact),
        }
    }
}

//field-by-field; representation-only differences are canonicalized on both
//sides so they never trigger a spurious update
fn content_differs(fresh: &CanonicalContent, existing: &ArtifactFields) -> bool {
    if fresh.title.trim() != existing.title.trim() {
        return true;
    }
    if fresh.schedule.trim() != existing.schedule.trim() {
        return true;
    }
    if canonical_room(&fresh.room) != canonical_room(&existing.room) {
        return true;
    }
    // order-sensitive: a reorder is a change
    if fresh.participants != existing.participants {
        return true;
    }
    if fresh.body.trim() != existing.body.trim() {
        return true;
    }

    match &fresh.duration {
        // unresolved candidates always need a rewrite, never a silent skip
        DurationField::Ambiguous(_) => true,
        DurationField::Resolved(class) => existing.duration != Some(*class),
        DurationField::Empty => existing.duration.is_some(),
    }
}
