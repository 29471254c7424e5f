//! Originator side: the replica that dialed the peer.

use super::{
    expect_end, expect_request, receive_operations, send_operations, SessionReport, SessionRole,
};
use crate::error::SessionResult;
use crate::replica::{OperationHandler, Payload, Replica};
use crate::wire::{self, SessionMessage};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Run one session as originator over `stream`.
///
/// Sends our request first, admits the partner's operations until its
/// request arrives, streams what the partner is missing, and finalizes once
/// the partner's end marker arrives.
pub async fn run_originator<S, P, H>(
    replica: &Replica<P, H>,
    mut stream: S,
    session_number: u32,
    max_frame_bytes: usize,
) -> SessionResult<SessionReport>
where
    S: AsyncRead + AsyncWrite + Unpin,
    P: Payload,
    H: OperationHandler<P>,
{
    let mut report = SessionReport::new(session_number, SessionRole::Originator);
    tracing::debug!(session = session_number, replica = %replica.id(), "originator session started");

    let (local_summary, local_ack) = replica.snapshot();
    wire::write_message(
        &mut stream,
        &SessionMessage::<P>::request(session_number, local_summary, local_ack),
    )
    .await?;

    let payload = receive_operations(replica, &mut stream, max_frame_bytes, &mut report).await?;
    let partner = expect_request(payload)?;

    let missing = replica.list_newer(&partner.summary);
    send_operations(&mut stream, session_number, missing, &mut report).await?;
    wire::write_message(&mut stream, &SessionMessage::<P>::end_session(session_number)).await?;

    let payload = receive_operations(replica, &mut stream, max_frame_bytes, &mut report).await?;
    expect_end(payload)?;
    replica.finalize_session(&partner.summary, &partner.ack);

    if let Err(e) = stream.shutdown().await {
        tracing::trace!(session = session_number, error = %e, "close after session failed");
    }

    tracing::debug!(
        session = session_number,
        sent = report.operations_sent,
        received = report.operations_received,
        admitted = report.operations_admitted,
        "originator session completed"
    );
    Ok(report)
}
