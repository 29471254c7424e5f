//! Timestamped anti-entropy sessions.
//!
//! A session runs over one bidirectional stream between two replicas:
//!
//! 1. Each side snapshots its summary and ack matrix under the replica lock.
//! 2. The originator sends its request and the partner answers with the
//!    operations the originator is missing followed by its own request.
//! 3. The originator sends the operations the partner is missing followed by
//!    an end-of-session marker; the partner answers with its own marker.
//! 4. On the marker each side folds in the peer's summary and ack matrix and
//!    purges the log.
//!
//! Any error abandons the session. Operations admitted before the error stay
//! admitted, which is safe because admission and the final merge are both
//! idempotent and monotonic.

pub mod originator;
pub mod partner;

pub use originator::run_originator;
pub use partner::run_partner;

use crate::error::{SessionError, SessionResult};
use crate::replica::{OperationHandler, Payload, Replica};
use crate::wire::{self, SessionMessage, SessionPayload};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::io::{AsyncRead, AsyncWrite};
use tsae_core::{Operation, TimestampMatrix, TimestampVector};

static SESSION_NUMBER: AtomicU32 = AtomicU32::new(0);

/// Next process-wide session number, used only to correlate log lines.
pub fn next_session_number() -> u32 {
    SESSION_NUMBER.fetch_add(1, Ordering::Relaxed) + 1
}

/// Which side of the session this replica played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Dialed the peer
    Originator,
    /// Accepted the connection
    Partner,
}

/// Outcome of a session that reached the end-of-session handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Number carried by every message of the session
    pub session_number: u32,
    /// Side this replica played
    pub role: SessionRole,
    /// Operations streamed to the peer
    pub operations_sent: usize,
    /// Operation messages received from the peer
    pub operations_received: usize,
    /// Received operations the local log admitted
    pub operations_admitted: usize,
}

impl SessionReport {
    fn new(session_number: u32, role: SessionRole) -> Self {
        Self {
            session_number,
            role,
            operations_sent: 0,
            operations_received: 0,
            operations_admitted: 0,
        }
    }
}

/// Summary and ack matrix carried by a peer's request.
struct PeerView {
    summary: TimestampVector,
    ack: TimestampMatrix,
}

/// Stream `operations` to the peer, one message each.
async fn send_operations<S, P>(
    stream: &mut S,
    session_number: u32,
    operations: Vec<Operation<P>>,
    report: &mut SessionReport,
) -> SessionResult<()>
where
    S: AsyncWrite + Unpin,
    P: Payload,
{
    for operation in operations {
        wire::write_message(stream, &SessionMessage::operation(session_number, operation)).await?;
        report.operations_sent += 1;
    }
    Ok(())
}

/// Admit operation messages until a message of another kind arrives, and
/// return that message's payload.
async fn receive_operations<S, P, H>(
    replica: &Replica<P, H>,
    stream: &mut S,
    max_frame_bytes: usize,
    report: &mut SessionReport,
) -> SessionResult<SessionPayload<P>>
where
    S: AsyncRead + Unpin,
    P: Payload,
    H: OperationHandler<P>,
{
    loop {
        let msg: SessionMessage<P> = wire::read_message(stream, max_frame_bytes).await?;
        match msg.payload {
            SessionPayload::Operation(operation) => {
                report.operations_received += 1;
                if replica.perform_operation(operation) {
                    report.operations_admitted += 1;
                }
            }
            other => return Ok(other),
        }
    }
}

fn expect_request<P>(payload: SessionPayload<P>) -> SessionResult<PeerView> {
    match payload {
        SessionPayload::Request { summary, ack } => Ok(PeerView { summary, ack }),
        other => Err(SessionError::UnexpectedMessage {
            expected: "request",
            found: other.kind(),
        }),
    }
}

fn expect_end<P>(payload: SessionPayload<P>) -> SessionResult<()> {
    match payload {
        SessionPayload::EndSession => Ok(()),
        other => Err(SessionError::UnexpectedMessage {
            expected: "end-session",
            found: other.kind(),
        }),
    }
}
