//! Reconciliation of the local list with a fetched remote list.
//!
//! Identity across the sync boundary is the record identifier only; content
//! equality is never used to match records here.

use log::debug;
use std::collections::HashSet;

use super::sync_model::{ConflictPolicy, ConflictRecord, MergeOutcome};
use crate::errors::Result;
use crate::quotes::{Origin, QuoteId, QuoteRecord, QuoteStore};

/// Records present on both sides with differing text or category.
pub fn detect_conflicts(local: &[QuoteRecord], remote: &[QuoteRecord]) -> Vec<ConflictRecord> {
    let mut seen: HashSet<&QuoteId> = HashSet::new();
    remote
        .iter()
        .filter(|r| seen.insert(&r.id))
        .filter_map(|r| {
            let existing = local.iter().find(|l| l.id == r.id)?;
            (!existing.same_content(r)).then(|| ConflictRecord {
                id: r.id.clone(),
                local_version: existing.clone(),
                remote_version: r.clone(),
            })
        })
        .collect()
}

/// Apply `remote` to the store under `policy` and persist once.
///
/// Remote-only records are appended; records present on both sides take the
/// remote origin and timestamp (and, under `RemoteWins`, the remote content).
/// Local-only records are left untouched.
pub fn merge(
    store: &mut QuoteStore,
    remote: &[QuoteRecord],
    policy: ConflictPolicy,
) -> Result<MergeOutcome> {
    let conflicts = detect_conflicts(store.all(), remote);
    let mut outcome = MergeOutcome::default();

    for incoming in remote {
        let Some(index) = store.position(&incoming.id) else {
            store.push_unsaved(incoming.clone());
            outcome.added += 1;
            continue;
        };

        let local = &mut store.records_mut()[index];
        let conflicting = !local.same_content(incoming);
        if conflicting && policy == ConflictPolicy::Manual {
            continue;
        }
        if conflicting {
            local.text = incoming.text.clone();
            local.category = incoming.category.clone();
        }
        local.origin = Origin::Remote;
        local.last_modified = incoming.last_modified;
        outcome.updated += 1;
    }

    if outcome.added > 0 || outcome.updated > 0 {
        store.commit()?;
    }
    debug!(
        "[Sync] merge applied: added={} updated={} conflicts={} policy={:?}",
        outcome.added,
        outcome.updated,
        conflicts.len(),
        policy
    );
    outcome.conflicts = conflicts;
    Ok(outcome)
}
