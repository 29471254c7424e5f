//! Acknowledgment matrix: every replica's summary as last reported.

use crate::{ReplicaId, TimestampVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One [`TimestampVector`] row per participant, recording what that replica
/// has told us it has seen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimestampMatrix {
    rows: BTreeMap<ReplicaId, TimestampVector>,
}

impl TimestampMatrix {
    /// Create a matrix with an all-null row for every participant.
    pub fn new(participants: &[ReplicaId]) -> Self {
        let rows = participants
            .iter()
            .map(|id| (id.clone(), TimestampVector::new(participants)))
            .collect();
        Self { rows }
    }

    /// Record `vector` as the row for `replica`.
    pub fn update(&mut self, replica: &ReplicaId, vector: &TimestampVector) {
        match self.rows.get_mut(replica) {
            Some(row) => *row = vector.clone(),
            None => {
                tracing::debug!(replica = %replica, "ignoring ack row for unknown replica");
            }
        }
    }

    /// Row-wise [`TimestampVector::update_max`] against `other`.
    pub fn update_max(&mut self, other: &TimestampMatrix) {
        for (replica, row) in self.rows.iter_mut() {
            if let Some(other_row) = other.rows.get(replica) {
                row.update_max(other_row);
            }
        }
    }

    /// Last reported summary of `replica`.
    pub fn row(&self, replica: &ReplicaId) -> Option<&TimestampVector> {
        self.rows.get(replica)
    }

    /// Column-wise minimum over all rows: the watermark every replica is known
    /// to have incorporated. Recomputed on every call.
    pub fn min_timestamp_vector(&self) -> TimestampVector {
        let mut rows = self.rows.values();
        let Some(first) = rows.next() else {
            return TimestampVector::default();
        };
        let mut watermark = first.clone();
        for row in rows {
            watermark.merge_min(row);
        }
        watermark
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for TimestampMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (replica, row) in &self.rows {
            writeln!(f, "{replica}:")?;
            write!(f, "{row}")?;
        }
        Ok(())
    }
}
