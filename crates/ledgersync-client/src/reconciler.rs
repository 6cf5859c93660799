//! Natural-key reconciler.
//!
//! Merges a batch of remote-sourced records into the mirror store keyed by
//! remote id. The batch is all-or-nothing: every change is staged first and
//! handed to the store as one [`UpsertPlan`], which the store commits
//! atomically. A rejected commit leaves the store untouched.

use std::collections::HashSet;

use ledgersync_db::{MirrorRecord, MirrorStore, UpsertPlan};
use tracing::{debug, info};

use crate::error::ReconcileError;

/// Outcome of one upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    pub entity: &'static str,
    pub inserted: usize,
    pub updated: usize,
    /// Records that matched their stored row exactly and were not written.
    pub unchanged: usize,
    /// Records dropped before reconciliation (e.g. unresolved owner).
    pub skipped: usize,
}

impl UpsertReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.unchanged + self.skipped
    }
}

/// Stateless natural-key upsert engine.
pub struct Reconciler;

impl Reconciler {
    /// Upsert `batch` into `store`.
    ///
    /// Every record must carry a remote id and no two may share one; either
    /// violation rejects the whole batch before anything is written. Matching
    /// rows have their remote-sourced fields overwritten and local-only fields
    /// kept; rows whose merge changes nothing are left alone, so re-running
    /// the same batch writes nothing.
    pub async fn upsert<E, S>(store: &S, batch: Vec<E>) -> Result<UpsertReport, ReconcileError>
    where
        E: MirrorRecord,
        S: MirrorStore<E> + ?Sized,
    {
        Self::check_keys(&batch)?;

        let mut report = UpsertReport {
            entity: E::ENTITY,
            ..UpsertReport::default()
        };
        let mut plan = UpsertPlan::default();

        for incoming in batch {
            // Checked above.
            let Some(remote_id) = incoming.remote_id() else {
                continue;
            };
            let existing = store
                .get_by_remote_id(remote_id)
                .await
                .map_err(|source| ReconcileError::Commit {
                    entity: E::ENTITY,
                    source,
                })?;

            match existing {
                Some(mut row) => {
                    if row.merge_remote(&incoming) {
                        debug!(entity = E::ENTITY, remote_id, local_id = row.id(), "Record changed");
                        plan.updates.push(row);
                        report.updated += 1;
                    } else {
                        report.unchanged += 1;
                    }
                }
                None => {
                    debug!(entity = E::ENTITY, remote_id, "New record");
                    plan.inserts.push(incoming);
                    report.inserted += 1;
                }
            }
        }

        if !plan.is_empty() {
            store
                .commit(plan)
                .await
                .map_err(|source| ReconcileError::Commit {
                    entity: E::ENTITY,
                    source,
                })?;
        }

        info!(
            entity = report.entity,
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            "Upsert batch committed"
        );
        Ok(report)
    }

    fn check_keys<E: MirrorRecord>(batch: &[E]) -> Result<(), ReconcileError> {
        let mut seen = HashSet::with_capacity(batch.len());
        for record in batch {
            let remote_id = record
                .remote_id()
                .ok_or(ReconcileError::MissingRemoteId { entity: E::ENTITY })?;
            if !seen.insert(remote_id) {
                return Err(ReconcileError::DuplicateRemoteId {
                    entity: E::ENTITY,
                    remote_id,
                });
            }
        }
        Ok(())
    }
}
