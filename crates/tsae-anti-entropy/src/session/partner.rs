//! Partner side: the replica that accepted the connection.

use super::{
    expect_end, expect_request, receive_operations, send_operations, SessionReport, SessionRole,
};
use crate::error::SessionResult;
use crate::replica::{OperationHandler, Payload, Replica};
use crate::wire::{self, SessionMessage};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Run one session as partner over `stream`.
///
/// Waits for the originator's request, streams what the originator is
/// missing followed by our own request, admits the originator's operations
/// until its end marker, replies with ours and finalizes.
pub async fn run_partner<S, P, H>(
    replica: &Replica<P, H>,
    mut stream: S,
    max_frame_bytes: usize,
) -> SessionResult<SessionReport>
where
    S: AsyncRead + AsyncWrite + Unpin,
    P: Payload,
    H: OperationHandler<P>,
{
    let (local_summary, local_ack) = replica.snapshot();

    let first: SessionMessage<P> = wire::read_message(&mut stream, max_frame_bytes).await?;
    let session_number = first.session_number;
    tracing::Span::current().record("session", session_number);
    let mut report = SessionReport::new(session_number, SessionRole::Partner);
    tracing::debug!(session = session_number, replica = %replica.id(), "partner session started");

    let originator = expect_request(first.payload)?;

    let missing = replica.list_newer(&originator.summary);
    send_operations(&mut stream, session_number, missing, &mut report).await?;
    wire::write_message(
        &mut stream,
        &SessionMessage::<P>::request(session_number, local_summary, local_ack),
    )
    .await?;

    let payload = receive_operations(replica, &mut stream, max_frame_bytes, &mut report).await?;
    expect_end(payload)?;

    wire::write_message(&mut stream, &SessionMessage::<P>::end_session(session_number)).await?;
    replica.finalize_session(&originator.summary, &originator.ack);

    if let Err(e) = stream.shutdown().await {
        tracing::trace!(session = session_number, error = %e, "close after session failed");
    }

    tracing::debug!(
        session = session_number,
        sent = report.operations_sent,
        received = report.operations_received,
        admitted = report.operations_admitted,
        "partner session completed"
    );
    Ok(report)
}
