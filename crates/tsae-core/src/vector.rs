//! Timestamp vectors: the last operation seen from every origin.

use crate::{ReplicaId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One timestamp per participant.
///
/// The key set is fixed at construction to the participant set. Merges only
/// replace entries, they never add or remove origins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimestampVector {
    entries: BTreeMap<ReplicaId, Timestamp>,
}

impl TimestampVector {
    /// Create a vector with a null timestamp for every participant.
    pub fn new<'a, I>(participants: I) -> Self
    where
        I: IntoIterator<Item = &'a ReplicaId>,
    {
        let entries = participants
            .into_iter()
            .map(|id| (id.clone(), Timestamp::null(id.clone())))
            .collect();
        Self { entries }
    }

    /// Replace the entry for the timestamp's origin.
    ///
    /// No monotonicity check is made. An origin outside the participant set
    /// is ignored.
    pub fn update_timestamp(&mut self, timestamp: Timestamp) {
        match self.entries.get_mut(timestamp.origin()) {
            Some(slot) => {
                tracing::trace!(timestamp = %timestamp, "updating timestamp vector");
                *slot = timestamp;
            }
            None => {
                tracing::debug!(
                    origin = %timestamp.origin(),
                    "ignoring timestamp for unknown origin"
                );
            }
        }
    }

    /// Element-wise maximum: take `other`'s entry wherever it is strictly newer.
    pub fn update_max(&mut self, other: &TimestampVector) {
        for (origin, current) in self.entries.iter_mut() {
            if let Some(candidate) = other.entries.get(origin) {
                if candidate.is_newer_than(current) {
                    *current = candidate.clone();
                }
            }
        }
    }

    /// Element-wise minimum: take `other`'s entry wherever it is strictly older.
    pub fn merge_min(&mut self, other: &TimestampVector) {
        for (origin, candidate) in &other.entries {
            if let Some(current) = self.entries.get_mut(origin) {
                if candidate.is_older_than(current) {
                    *current = candidate.clone();
                }
            }
        }
    }

    /// Last timestamp seen from `origin`; null when the origin is unknown.
    pub fn get_last(&self, origin: &ReplicaId) -> Timestamp {
        self.entries
            .get(origin)
            .cloned()
            .unwrap_or_else(|| Timestamp::null(origin.clone()))
    }

    /// Origins tracked by this vector, in order.
    pub fn participants(&self) -> impl Iterator<Item = &ReplicaId> {
        self.entries.keys()
    }

    /// Last timestamp per origin, in origin order.
    pub fn iter(&self) -> impl Iterator<Item = (&ReplicaId, &Timestamp)> {
        self.entries.iter()
    }

    /// Number of tracked origins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no origin is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for TimestampVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for timestamp in self.entries.values() {
            writeln!(f, "{timestamp}")?;
        }
        Ok(())
    }
}
