//! Shared fixtures for session and runtime tests.

#![allow(dead_code)]

use std::sync::Arc;
use tsae_anti_entropy::{
    run_originator, run_partner, NoopHandler, PeerConfig, Replica, SessionReport, SessionResult,
};
use tsae_core::{Operation, ReplicaId, Timestamp};

pub const MAX_FRAME: usize = 1024 * 1024;

pub type TestReplica = Replica<String, NoopHandler>;

pub fn id(name: &str) -> ReplicaId {
    ReplicaId::from(name)
}

/// Replica `name` whose peers are `all` minus itself.
pub fn replica(name: &str, all: &[&str]) -> Arc<TestReplica> {
    let peers = all
        .iter()
        .filter(|p| **p != name)
        .map(|p| PeerConfig {
            id: id(p),
            addr: "127.0.0.1:0".to_string(),
        })
        .collect();
    Arc::new(Replica::new(id(name), peers, NoopHandler))
}

pub fn op(origin: &str, seq: i64) -> Operation<String> {
    Operation::new(Timestamp::new(id(origin), seq), format!("{origin}-{seq}"))
}

/// `(origin, seq)` pairs of every operation in the replica's log.
pub fn log_entries(replica: &TestReplica) -> Vec<(String, i64)> {
    let log = replica.log_snapshot();
    let entries = log
        .participants()
        .flat_map(|p| {
            log.operations(p)
                .iter()
                .map(|o| (o.timestamp.origin().to_string(), o.timestamp.sequence_number()))
                .collect::<Vec<_>>()
        })
        .collect();
    entries
}

pub fn last_seen(replica: &TestReplica, origin: &str) -> i64 {
    replica.summary().get_last(&id(origin)).sequence_number()
}

/// Run one in-memory session with `originator` dialing `partner`.
pub async fn session(
    originator: &TestReplica,
    partner: &TestReplica,
) -> (SessionResult<SessionReport>, SessionResult<SessionReport>) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let session_number = tsae_anti_entropy::session::next_session_number();
    tokio::join!(
        run_originator(originator, client, session_number, MAX_FRAME),
        run_partner(partner, server, MAX_FRAME),
    )
}
