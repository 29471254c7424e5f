//! # TSAE Core - Causal Summaries and the Operation Log
//!
//! Pure data structures behind timestamped anti-entropy replication:
//! - [`Timestamp`]: an `(origin, sequence)` pair with a distinguished null value
//! - [`TimestampVector`]: the last timestamp seen per origin (a replica's summary)
//! - [`TimestampMatrix`]: what every replica has acknowledged seeing
//! - [`Log`]: the per-origin, strictly ordered operation log
//!
//! Nothing in this crate performs I/O or locking. Callers that share these
//! structures across sessions wrap them in a single lock per replica.

pub mod identifiers;
pub mod log;
pub mod matrix;
pub mod operation;
pub mod timestamp;
pub mod vector;

pub use identifiers::ReplicaId;
pub use log::Log;
pub use matrix::TimestampMatrix;
pub use operation::Operation;
pub use timestamp::{Timestamp, NULL_SEQUENCE_NUMBER};
pub use vector::TimestampVector;
