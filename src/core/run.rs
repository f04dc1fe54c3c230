// batch driver: allocate, classify, sweep orphans
use std::collections::BTreeSet;

use crate::core::error::RunError;
use crate::core::record::{CanonicalContent, DurationField};
use crate::core::reconcile::{ArtifactSource, OrphanPolicy, Reconciler};
use crate::core::table::{AssignNote, MappingTable};
use crate::core::types::{Decision, SlotId};
use crate::normalize::NormalizedBatch;
use crate::report::{RunSummary, RunWarning};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub force_regenerate: bool,
    pub orphan_policy: OrphanPolicy,
}

/// One instruction for the materializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDecision {
    pub source_key: String,
    pub slot: SlotId,
    pub decision: Decision,
    /// Present for Create/Update; the materializer renders it.
    pub content: Option<CanonicalContent>,
}

/// Everything one run decided, plus the surfaced warnings. The caller
/// executes the decisions and then saves the table exactly once.
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    pub decisions: Vec<SlotDecision>,
    pub warnings: Vec<RunWarning>,
    pub summary: RunSummary,
}

/// Run the core over one normalized batch.
///
/// Pure in-memory computation: the table is mutated here but nothing is
/// persisted, so an abort anywhere leaves the stored table exactly as loaded.
/// Batch order is already deterministic (sorted by source key, duplicates
/// rejected by the normalizer).
pub fn plan_run(
    table: &mut MappingTable,
    batch: &NormalizedBatch,
    artifacts: &impl ArtifactSource,
    options: RunOptions,
) -> Result<RunPlan, RunError> {
    let reconciler = Reconciler {
        force_regenerate: options.force_regenerate,
        orphan_policy: options.orphan_policy,
    };

    let mut plan = RunPlan::default();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for record in batch.records() {
        seen.insert(record.source_key.clone());

        let assignment = table.assign(&record.source_key, record.category)?;
        match assignment.note {
            Some(AssignNote::CategoryConflict { stored, requested }) => {
                let warning = RunWarning::CategoryConflict {
                    source_key: record.source_key.clone(),
                    stored,
                    requested,
                };
                tracing::warn!(%warning);
                plan.warnings.push(warning);
            }
            Some(AssignNote::Reactivated) => {
                tracing::debug!(source_key = %record.source_key, slot = %assignment.slot, "orphaned slot reactivated");
            }
            None => {}
        }

        if let DurationField::Ambiguous(candidates) = &record.content.duration {
            let warning = RunWarning::AmbiguousDuration {
                source_key: record.source_key.clone(),
                candidates: candidates.clone(),
            };
            tracing::warn!(%warning);
            plan.warnings.push(warning);
            plan.summary.needs_manual_resolution += 1;
        }

        let decision = reconciler.classify(&record.content, assignment.slot, artifacts)?;
        plan.summary.record(decision);

        let content = match decision {
            Decision::Create | Decision::Update => Some(record.content.clone()),
            _ => None,
        };
        plan.decisions.push(SlotDecision {
            source_key: record.source_key.clone(),
            slot: assignment.slot,
            decision,
            content,
        });
    }

    for (source_key, slot) in table.mark_orphans(&seen) {
        let warning = RunWarning::Orphaned {
            source_key: source_key.clone(),
            slot,
        };
        tracing::warn!(%warning);
        plan.warnings.push(warning);

        let decision = reconciler.orphan_decision();
        plan.summary.record(decision);
        plan.decisions.push(SlotDecision {
            source_key,
            slot,
            decision,
            content: None,
        });
    }

    Ok(plan)
}
