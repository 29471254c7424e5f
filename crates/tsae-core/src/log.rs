//! Per-origin operation log.
//!
//! The log keeps one list per participant. Each list is strictly increasing
//! by sequence number: an insertion that is not newer than the last stored
//! operation of its origin is rejected, which makes re-delivery of already
//! seen operations a no-op.
//!
//! The log does no locking of its own. A replica guards it together with
//! its summary vector and ack matrix under one lock, because `add`,
//! `list_newer` and `purge_log` all read-then-use per-origin lists.

use crate::{Operation, ReplicaId, Timestamp, TimestampMatrix, TimestampVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Append-only, per-origin ordered operation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log<P> {
    entries: BTreeMap<ReplicaId, Vec<Operation<P>>>,
}

impl<P> Default for Log<P> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<P: Clone> Log<P> {
    /// Create an empty log with one list per participant.
    pub fn new<'a, I>(participants: I) -> Self
    where
        I: IntoIterator<Item = &'a ReplicaId>,
    {
        let entries = participants
            .into_iter()
            .map(|id| (id.clone(), Vec::new()))
            .collect();
        Self { entries }
    }

    /// Append `op` to its origin's list if it is strictly newer than the
    /// last stored operation of that origin.
    ///
    /// Returns `true` when the operation was inserted. Duplicates and
    /// out-of-order operations leave the log unchanged and return `false`.
    /// Operations from an origin outside the participant set are rejected.
    pub fn add(&mut self, op: Operation<P>) -> bool {
        let Some(operations) = self.entries.get_mut(op.timestamp.origin()) else {
            tracing::debug!(timestamp = %op.timestamp, "rejecting operation from unknown origin");
            return false;
        };

        match operations.last() {
            Some(last) if !op.timestamp.is_newer_than(&last.timestamp) => {
                tracing::trace!(
                    timestamp = %op.timestamp,
                    last = %last.timestamp,
                    "rejecting operation not newer than log tail"
                );
                false
            }
            _ => {
                operations.push(op);
                true
            }
        }
    }

    /// Every stored operation the owner of `summary` has not seen.
    ///
    /// Grouped by origin in the log's origin order; ascending within an
    /// origin.
    pub fn list_newer(&self, summary: &TimestampVector) -> Vec<Operation<P>> {
        let mut newer = Vec::new();
        for (origin, operations) in &self.entries {
            let Some(last) = operations.last() else {
                continue;
            };
            let seen = summary.get_last(origin);
            if !last.timestamp.is_newer_than(&seen) {
                continue;
            }
            if seen.is_null() {
                newer.extend(operations.iter().cloned());
            } else {
                newer.extend(
                    operations
                        .iter()
                        .filter(|op| op.timestamp.is_newer_than(&seen))
                        .cloned(),
                );
            }
        }
        newer
    }

    /// Operations of `origin` strictly newer than `after`, ascending.
    pub fn list_since(&self, origin: &ReplicaId, after: &Timestamp) -> Vec<Operation<P>> {
        self.entries
            .get(origin)
            .map(|operations| {
                operations
                    .iter()
                    .filter(|op| op.timestamp.is_newer_than(after))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop every operation acknowledged by all replicas.
    ///
    /// For each origin with a non-null watermark in
    /// `ack.min_timestamp_vector()`, operations strictly older than the
    /// watermark are removed. The operation at the watermark is retained.
    pub fn purge_log(&mut self, ack: &TimestampMatrix) {
        let watermark = ack.min_timestamp_vector();
        for (origin, operations) in self.entries.iter_mut() {
            let floor = watermark.get_last(origin);
            if floor.is_null() {
                continue;
            }
            let before = operations.len();
            operations.retain(|op| !op.timestamp.is_older_than(&floor));
            let purged = before - operations.len();
            if purged > 0 {
                tracing::debug!(origin = %origin, watermark = %floor, purged, "purged log prefix");
            }
        }
    }
}

impl<P> Log<P> {
    /// Stored operations of one origin, ascending.
    pub fn operations(&self, origin: &ReplicaId) -> &[Operation<P>] {
        self.entries
            .get(origin)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Last stored timestamp of `origin`, if any.
    pub fn last_timestamp(&self, origin: &ReplicaId) -> Option<&Timestamp> {
        self.entries
            .get(origin)
            .and_then(|operations| operations.last())
            .map(|op| &op.timestamp)
    }

    /// Origins with a list in this log, in order.
    pub fn participants(&self) -> impl Iterator<Item = &ReplicaId> {
        self.entries.keys()
    }

    /// Total number of stored operations across all origins.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether every origin's list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
}

impl<P: fmt::Display> fmt::Display for Log<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in self.entries.values().flatten() {
            writeln!(f, "{op}")?;
        }
        Ok(())
    }
}
