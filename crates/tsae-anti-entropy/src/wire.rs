//! Session wire format.
//!
//! Every message is one frame: a 4-byte big-endian length followed by a
//! `bincode` body encoding a [`SessionMessage`].

use crate::error::{SessionError, SessionResult};
use crate::replica::Payload;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tsae_core::{Operation, TimestampMatrix, TimestampVector};

/// Version stamped on every message; peers must match exactly.
pub const SESSION_WIRE_SCHEMA_VERSION: u16 = 1;

/// The three message kinds of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionPayload<P> {
    /// Sender's summary and ack matrix
    Request {
        /// Last operation seen per origin
        summary: TimestampVector,
        /// Every replica's summary as the sender knows it
        ack: TimestampMatrix,
    },
    /// One operation the receiver is missing
    Operation(Operation<P>),
    /// Sender has finished its side of the session
    EndSession,
}

impl<P> SessionPayload<P> {
    /// Short name of the message kind, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionPayload::Request { .. } => "request",
            SessionPayload::Operation(_) => "operation",
            SessionPayload::EndSession => "end-session",
        }
    }
}

/// One framed message on a session stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage<P> {
    /// Must equal [`SESSION_WIRE_SCHEMA_VERSION`]
    pub schema_version: u16,
    /// Correlates the messages of one session in logs; no protocol meaning
    pub session_number: u32,
    /// Message body
    pub payload: SessionPayload<P>,
}

impl<P> SessionMessage<P> {
    /// Request carrying the sender's summary and ack matrix.
    pub fn request(session_number: u32, summary: TimestampVector, ack: TimestampMatrix) -> Self {
        Self::with_payload(session_number, SessionPayload::Request { summary, ack })
    }

    /// One operation the receiver is missing.
    pub fn operation(session_number: u32, operation: Operation<P>) -> Self {
        Self::with_payload(session_number, SessionPayload::Operation(operation))
    }

    /// End-of-session marker.
    pub fn end_session(session_number: u32) -> Self {
        Self::with_payload(session_number, SessionPayload::EndSession)
    }

    fn with_payload(session_number: u32, payload: SessionPayload<P>) -> Self {
        Self {
            schema_version: SESSION_WIRE_SCHEMA_VERSION,
            session_number,
            payload,
        }
    }
}

/// Encode a message body with `bincode`.
pub fn serialize_message<P: Payload>(msg: &SessionMessage<P>) -> SessionResult<Vec<u8>> {
    bincode::serialize(msg).map_err(|e| SessionError::Encode(e.to_string()))
}

/// Decode a message body and check its schema version.
pub fn deserialize_message<P: Payload>(bytes: &[u8]) -> SessionResult<SessionMessage<P>> {
    let msg: SessionMessage<P> =
        bincode::deserialize(bytes).map_err(|e| SessionError::Decode(e.to_string()))?;
    if msg.schema_version != SESSION_WIRE_SCHEMA_VERSION {
        return Err(SessionError::SchemaMismatch {
            expected: SESSION_WIRE_SCHEMA_VERSION,
            found: msg.schema_version,
        });
    }
    Ok(msg)
}

/// Write one framed message and flush.
pub async fn write_message<W, P>(writer: &mut W, msg: &SessionMessage<P>) -> SessionResult<()>
where
    W: AsyncWrite + Unpin,
    P: Payload,
{
    let body = serialize_message(msg)?;
    let len = u32::try_from(body.len()).map_err(|_| {
        SessionError::Encode(format!("message of {} bytes too large to frame", body.len()))
    })?;

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message, blocking until it is complete.
///
/// A length prefix above `max_frame_bytes` is rejected before the body is
/// allocated.
pub async fn read_message<R, P>(reader: &mut R, max_frame_bytes: usize) -> SessionResult<SessionMessage<P>>
where
    R: AsyncRead + Unpin,
    P: Payload,
{
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes).await?;

    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > max_frame_bytes {
        return Err(SessionError::FrameTooLarge {
            size: len,
            max: max_frame_bytes,
        });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    deserialize_message(&body)
}
