//! Periodic originator rounds.

use super::{log_session_failure, with_deadline};
use crate::config::{PeerConfig, TsaeConfig};
use crate::error::{SessionError, SessionResult};
use crate::replica::{OperationHandler, Payload, Replica};
use crate::session::{next_session_number, run_originator, SessionReport};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

/// Run an originator round every `session_interval`, forever.
pub async fn run_rounds<P, H>(replica: Arc<Replica<P, H>>, config: Arc<TsaeConfig>)
where
    P: Payload,
    H: OperationHandler<P> + 'static,
{
    let mut interval = tokio::time::interval(config.session_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; start after one full period.
    interval.tick().await;

    loop {
        interval.tick().await;
        session_with_n(&replica, replica.sessions_per_round(), &config).await;
    }
}

/// Run sessions with up to `n` random partners, one after another.
///
/// Returns the reports of the sessions that completed; failures are logged
/// and do not stop the round. A disconnected replica runs no sessions.
pub async fn session_with_n<P, H>(
    replica: &Replica<P, H>,
    n: usize,
    config: &TsaeConfig,
) -> Vec<SessionReport>
where
    P: Payload,
    H: OperationHandler<P>,
{
    let mut completed = Vec::new();
    if !replica.is_connected() {
        tracing::trace!(replica = %replica.id(), "disconnected, skipping round");
        return completed;
    }

    for peer in replica.random_partners(n) {
        let session_number = next_session_number();
        let span =
            tracing::info_span!("originator_session", session = session_number, peer = %peer.id);
        match session_with_peer(replica, &peer, session_number, config)
            .instrument(span.clone())
            .await
        {
            Ok(report) => completed.push(report),
            Err(e) => span.in_scope(|| log_session_failure(&e)),
        }
    }
    completed
}

/// Dial `peer` and run one originator session.
async fn session_with_peer<P, H>(
    replica: &Replica<P, H>,
    peer: &PeerConfig,
    session_number: u32,
    config: &TsaeConfig,
) -> SessionResult<SessionReport>
where
    P: Payload,
    H: OperationHandler<P>,
{
    tracing::debug!(addr = %peer.addr, "starting session");
    let stream = connect(&peer.addr, config).await?;
    with_deadline(
        config.session_timeout(),
        run_originator(replica, stream, session_number, config.max_frame_bytes),
    )
    .await
}

async fn connect(addr: &str, config: &TsaeConfig) -> SessionResult<TcpStream> {
    let stream = tokio::time::timeout(config.connect_timeout(), TcpStream::connect(addr))
        .await
        .map_err(|_| SessionError::Timeout)??;
    stream.set_nodelay(true)?;
    Ok(stream)
}
