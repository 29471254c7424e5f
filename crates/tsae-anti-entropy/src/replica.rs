//! Replica state shared by every session of one replica.
//!
//! The log, summary vector and ack matrix live behind a single coarse lock.
//! Every read-then-write that must be consistent as a unit (snapshot before
//! sending, admission of a received operation, finalization after a clean
//! session) runs as one critical section. The lock is synchronous and is
//! never held across an `.await`, so network I/O never blocks unrelated
//! sessions.

use crate::config::{PeerConfig, TsaeConfig};
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tsae_core::{Log, Operation, ReplicaId, TimestampMatrix, TimestampVector};

/// Bounds every replicated payload type satisfies.
pub trait Payload: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

// Blanket impl for any type with the required bounds
impl<T> Payload for T where T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

/// Applies the business effect of an operation once it has been admitted to
/// the log. Called exactly once per admitted operation, under the replica
/// lock, so implementations must not block.
pub trait OperationHandler<P>: Send + Sync {
    /// Apply `operation` to the replicated business state.
    fn apply(&self, operation: &Operation<P>);
}

impl<P, F> OperationHandler<P> for F
where
    F: Fn(&Operation<P>) + Send + Sync,
{
    fn apply(&self, operation: &Operation<P>) {
        self(operation);
    }
}

/// Handler for replicas that only keep the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl<P> OperationHandler<P> for NoopHandler {
    fn apply(&self, _operation: &Operation<P>) {}
}

/// Mutable replicated state guarded as one unit.
#[derive(Debug, Clone)]
pub struct ReplicaState<P> {
    /// Operations not yet acknowledged by every replica
    pub log: Log<P>,
    /// Last operation seen per origin
    pub summary: TimestampVector,
    /// Each replica's summary as last reported to us
    pub ack: TimestampMatrix,
}

impl<P: Clone> ReplicaState<P> {
    fn new(participants: &[ReplicaId]) -> Self {
        Self {
            log: Log::new(participants),
            summary: TimestampVector::new(participants),
            ack: TimestampMatrix::new(participants),
        }
    }
}

/// One replica: identity, peers, and the shared replicated state.
pub struct Replica<P, H = NoopHandler> {
    id: ReplicaId,
    participants: Vec<ReplicaId>,
    peers: Vec<PeerConfig>,
    state: Mutex<ReplicaState<P>>,
    handler: H,
    connected: AtomicBool,
    sessions_per_round: usize,
}

impl<P: Payload, H: OperationHandler<P>> Replica<P, H> {
    /// Create a replica with default settings. The participant set is `id`
    /// plus every peer id.
    pub fn new(id: ReplicaId, peers: Vec<PeerConfig>, handler: H) -> Self {
        let config = TsaeConfig {
            replica_id: id,
            peers,
            ..TsaeConfig::default()
        };
        Self::from_config(&config, handler)
    }

    /// Create a replica from a validated configuration.
    pub fn from_config(config: &TsaeConfig, handler: H) -> Self {
        let participants = config.participants();
        Self {
            state: Mutex::new(ReplicaState::new(&participants)),
            id: config.replica_id.clone(),
            participants,
            peers: config.peers.clone(),
            handler,
            connected: AtomicBool::new(true),
            sessions_per_round: config.sessions_per_round,
        }
    }

    /// This replica's identifier.
    pub fn id(&self) -> &ReplicaId {
        &self.id
    }

    /// This replica followed by every peer.
    pub fn participants(&self) -> &[ReplicaId] {
        &self.participants
    }

    /// Peers eligible as session partners.
    pub fn peers(&self) -> &[PeerConfig] {
        &self.peers
    }

    /// Handler applying admitted operations.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Number of partners contacted per scheduled round.
    pub fn sessions_per_round(&self) -> usize {
        self.sessions_per_round
    }

    /// Whether the replica currently takes part in originator rounds.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Simulate leaving or rejoining the network. While disconnected the
    /// scheduler skips originator rounds.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
        tracing::info!(replica = %self.id, connected, "replica connectivity changed");
    }

    /// Originate a new operation stamped with the next local sequence number.
    pub fn issue(&self, payload: P) -> Operation<P> {
        let mut state = self.state.lock();
        let timestamp = state.summary.get_last(&self.id).next();
        let operation = Operation::new(timestamp.clone(), payload);

        if state.log.add(operation.clone()) {
            state.summary.update_timestamp(timestamp);
            self.handler.apply(&operation);
        }
        tracing::trace!(timestamp = %operation.timestamp, "issued operation");
        operation
    }

    /// Admit an operation received from a peer.
    ///
    /// Returns `true` when the log accepted it, in which case the summary
    /// entry of its origin advances and the handler applies it. Duplicates
    /// and out-of-order deliveries are ignored.
    pub fn perform_operation(&self, operation: Operation<P>) -> bool {
        let mut state = self.state.lock();
        if !state.log.add(operation.clone()) {
            return false;
        }

        let origin = operation.timestamp.origin();
        if operation
            .timestamp
            .is_newer_than(&state.summary.get_last(origin))
        {
            state.summary.update_timestamp(operation.timestamp.clone());
        }
        self.handler.apply(&operation);
        tracing::trace!(timestamp = %operation.timestamp, "admitted operation");
        true
    }

    /// Clone the summary, record it as our own ack row, and clone the ack
    /// matrix, as one critical section.
    pub fn snapshot(&self) -> (TimestampVector, TimestampMatrix) {
        let mut state = self.state.lock();
        let summary = state.summary.clone();
        state.ack.update(&self.id, &summary);
        (summary, state.ack.clone())
    }

    /// Operations the owner of `summary` is missing.
    pub fn list_newer(&self, summary: &TimestampVector) -> Vec<Operation<P>> {
        self.state.lock().log.list_newer(summary)
    }

    /// Fold a peer's summary and ack matrix in after a clean session, then
    /// purge what every replica has acknowledged.
    pub fn finalize_session(&self, peer_summary: &TimestampVector, peer_ack: &TimestampMatrix) {
        let mut state = self.state.lock();
        state.summary.update_max(peer_summary);
        state.ack.update_max(peer_ack);
        let ReplicaState { log, ack, .. } = &mut *state;
        log.purge_log(ack);
    }

    /// Up to `n` distinct peers chosen uniformly at random.
    pub fn random_partners(&self, n: usize) -> Vec<PeerConfig> {
        let mut rng = rand::thread_rng();
        self.peers
            .choose_multiple(&mut rng, n)
            .cloned()
            .collect()
    }

    /// Run `f` against the state under the lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&ReplicaState<P>) -> R) -> R {
        f(&self.state.lock())
    }

    /// Copy of the current log.
    pub fn log_snapshot(&self) -> Log<P> {
        self.with_state(|state| state.log.clone())
    }

    /// Copy of the current summary vector.
    pub fn summary(&self) -> TimestampVector {
        self.with_state(|state| state.summary.clone())
    }

    /// Copy of the current ack matrix.
    pub fn ack(&self) -> TimestampMatrix {
        self.with_state(|state| state.ack.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tsae_core::Timestamp;

    fn peer(id: &str) -> PeerConfig {
        PeerConfig {
            id: ReplicaId::from(id),
            addr: "127.0.0.1:0".to_string(),
        }
    }

    fn replica(id: &str, peers: &[&str]) -> Replica<String> {
        Replica::new(
            ReplicaId::from(id),
            peers.iter().map(|p| peer(p)).collect(),
            NoopHandler,
        )
    }

    #[test]
    fn issue_stamps_consecutive_sequence_numbers() {
        let r = replica("x", &["y"]);
        let first = r.issue("a".to_string());
        let second = r.issue("b".to_string());
        assert_eq!(first.timestamp, Timestamp::new(ReplicaId::from("x"), 0));
        assert_eq!(second.timestamp, Timestamp::new(ReplicaId::from("x"), 1));
        assert_eq!(r.summary().get_last(&ReplicaId::from("x")).sequence_number(), 1);
        assert_eq!(r.log_snapshot().len(), 2);
    }

    #[test]
    fn perform_operation_applies_each_admitted_op_once() {
        let applied = Arc::new(AtomicUsize::new(0));
        let counter = applied.clone();
        let r: Replica<String, _> = Replica::new(
            ReplicaId::from("y"),
            vec![peer("x")],
            move |_: &Operation<String>| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        let op = Operation::new(Timestamp::new(ReplicaId::from("x"), 0), "hello".to_string());
        assert!(r.perform_operation(op.clone()));
        assert!(!r.perform_operation(op));
        assert_eq!(applied.load(Ordering::SeqCst), 1);
        assert_eq!(r.summary().get_last(&ReplicaId::from("x")).sequence_number(), 0);
    }

    #[test]
    fn snapshot_records_own_row() {
        let r = replica("x", &["y"]);
        r.issue("a".to_string());
        let (summary, ack) = r.snapshot();
        assert_eq!(ack.row(&ReplicaId::from("x")), Some(&summary));
        assert_eq!(r.ack().row(&ReplicaId::from("x")), Some(&summary));
    }

    #[test]
    fn finalize_merges_and_purges() {
        let x = replica("x", &["y"]);
        for n in 0..3 {
            x.issue(format!("op{n}"));
        }
        // Both replicas claim to have seen x:2.
        let (summary, mut ack) = x.snapshot();
        ack.update(&ReplicaId::from("y"), &summary);
        x.finalize_session(&summary, &ack);

        let log = x.log_snapshot();
        let kept: Vec<i64> = log
            .operations(&ReplicaId::from("x"))
            .iter()
            .map(|o| o.timestamp.sequence_number())
            .collect();
        assert_eq!(kept, vec![2]);
    }

    #[test]
    fn random_partners_are_distinct_and_bounded() {
        let r = replica("x", &["a", "b", "c"]);
        let partners = r.random_partners(2);
        assert_eq!(partners.len(), 2);
        assert_ne!(partners[0].id, partners[1].id);
        assert_eq!(r.random_partners(10).len(), 3);
        assert!(r.random_partners(0).is_empty());
    }

    #[test]
    fn from_config_takes_participants_and_round_size() {
        let config = TsaeConfig {
            replica_id: ReplicaId::from("x"),
            peers: vec![peer("y"), peer("z")],
            sessions_per_round: 2,
            ..TsaeConfig::default()
        };
        let r: Replica<String> = Replica::from_config(&config, NoopHandler);

        assert_eq!(r.participants(), config.participants().as_slice());
        assert_eq!(r.sessions_per_round(), 2);
        assert_eq!(r.summary().len(), 3);
        assert_eq!(r.ack().len(), 3);
    }

    #[test]
    fn connectivity_toggles() {
        let r = replica("x", &[]);
        assert!(r.is_connected());
        r.set_connected(false);
        assert!(!r.is_connected());
    }
}
