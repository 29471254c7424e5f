//! Timestamped operations carrying an opaque payload.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One replicated operation. The payload is never inspected by the
/// replication machinery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation<P> {
    /// Origin and sequence number
    pub timestamp: Timestamp,
    /// Business content applied by the replica's handler
    pub payload: P,
}

impl<P> Operation<P> {
    /// Pair a payload with the timestamp it was issued under.
    pub fn new(timestamp: Timestamp, payload: P) -> Self {
        Self { timestamp, payload }
    }
}

impl<P: fmt::Display> fmt::Display for Operation<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp, self.payload)
    }
}
