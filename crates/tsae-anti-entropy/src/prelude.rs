//! TSAE anti-entropy prelude.
//!
//! Curated re-exports for running replicas.

pub use crate::{
    run_originator, run_partner, ConfigError, NoopHandler, OperationHandler, PeerConfig, Replica,
    ReplicaNode, SessionError, SessionReport, TsaeConfig,
};
pub use tsae_core::{Operation, ReplicaId, Timestamp, TimestampMatrix, TimestampVector};
