//! Per-origin logical timestamps.

use crate::ReplicaId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Sequence number reserved for the null timestamp ("nothing seen yet").
pub const NULL_SEQUENCE_NUMBER: i64 = -1;

/// Identity of one issued operation: the replica that issued it and its
/// position in that replica's sequence.
///
/// Timestamps are only ordered against timestamps of the same origin, so
/// there is no `Ord` impl; use [`Timestamp::compare`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    origin: ReplicaId,
    sequence_number: i64,
}

impl Timestamp {
    /// Timestamp `sequence_number` of `origin`.
    pub fn new(origin: ReplicaId, sequence_number: i64) -> Self {
        Self {
            origin,
            sequence_number,
        }
    }

    /// The null timestamp for `origin`.
    pub fn null(origin: ReplicaId) -> Self {
        Self::new(origin, NULL_SEQUENCE_NUMBER)
    }

    /// Replica that issued the operation.
    pub fn origin(&self) -> &ReplicaId {
        &self.origin
    }

    /// Position in the origin's sequence, or [`NULL_SEQUENCE_NUMBER`].
    pub fn sequence_number(&self) -> i64 {
        self.sequence_number
    }

    /// Whether this stands for "nothing seen yet".
    pub fn is_null(&self) -> bool {
        self.sequence_number == NULL_SEQUENCE_NUMBER
    }

    /// The timestamp the origin issues after this one. The successor of the
    /// null timestamp is sequence number 0.
    pub fn next(&self) -> Self {
        Self::new(self.origin.clone(), self.sequence_number + 1)
    }

    /// Compare sequence numbers. Callers only compare timestamps known to
    /// belong to the same origin slot.
    pub fn compare(&self, other: &Timestamp) -> Ordering {
        self.sequence_number.cmp(&other.sequence_number)
    }

    /// Strictly greater sequence number than `other`.
    pub fn is_newer_than(&self, other: &Timestamp) -> bool {
        self.compare(other) == Ordering::Greater
    }

    /// Strictly smaller sequence number than `other`.
    pub fn is_older_than(&self, other: &Timestamp) -> bool {
        self.compare(other) == Ordering::Less
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.origin, self.sequence_number)
    }
}
