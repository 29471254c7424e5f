//! Partner-side accept loop.

use super::{log_session_failure, with_deadline};
use crate::config::TsaeConfig;
use crate::replica::{OperationHandler, Payload, Replica};
use crate::session::run_partner;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::Instrument;

/// Accept connections forever, running one partner session per connection
/// on its own task.
pub async fn serve<P, H>(replica: Arc<Replica<P, H>>, listener: TcpListener, config: Arc<TsaeConfig>)
where
    P: Payload,
    H: OperationHandler<P> + 'static,
{
    loop {
        match listener.accept().await {
            Ok((stream, remote_addr)) => {
                tracing::trace!(remote = %remote_addr, "accepted session connection");
                let replica = replica.clone();
                let config = config.clone();
                // The session number is only known once the first message
                // arrives; `run_partner` records it on this span.
                let span = tracing::info_span!(
                    "partner_session",
                    remote = %remote_addr,
                    session = tracing::field::Empty
                );

                tokio::spawn(
                    async move {
                        let session = run_partner(&replica, stream, config.max_frame_bytes);
                        if let Err(e) = with_deadline(config.session_timeout(), session).await {
                            log_session_failure(&e);
                        }
                    }
                    .instrument(span),
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to accept connection");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}
