//! # TSAE Anti-Entropy - Sessions and Replica Runtime
//!
//! Timestamped anti-entropy between replicas of a per-origin operation log:
//! - [`Replica`]: the shared state of one replica under a single coarse lock
//! - [`session`]: originator and partner roles of the pairwise session
//! - [`wire`]: length-prefixed `bincode` framing of session messages
//! - [`runtime`]: TCP listener and periodic originator scheduler
//!
//! ## Design Principles
//!
//! - **Summary Exchange**: replicas swap timestamp vectors and send exactly
//!   the operations the other side has not seen
//! - **Idempotent Admission**: the log rejects anything not newer than its
//!   tail, so partial sessions and re-delivery are safe
//! - **Acknowledged Purge**: history is dropped only once every replica is
//!   known to have it
//! - **Session Isolation**: a failed session is abandoned on its own; no
//!   error reaches the scheduler or other sessions

pub mod config;
pub mod error;
pub mod prelude;
pub mod replica;
pub mod runtime;
pub mod session;
pub mod wire;

pub use config::{PeerConfig, TsaeConfig};
pub use error::{ConfigError, SessionError, SessionResult};
pub use replica::{NoopHandler, OperationHandler, Payload, Replica, ReplicaState};
pub use runtime::ReplicaNode;
pub use session::{run_originator, run_partner, SessionReport, SessionRole};
