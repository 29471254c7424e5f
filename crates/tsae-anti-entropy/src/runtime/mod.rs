//! Replica runtime: the partner-side TCP listener and the periodic
//! originator scheduler.

pub mod listener;
pub mod scheduler;

use crate::config::TsaeConfig;
use crate::error::{SessionError, SessionResult};
use crate::replica::{OperationHandler, Payload, Replica};
use crate::session::SessionReport;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Apply the optional session deadline the runtime imposes.
pub(crate) async fn with_deadline<F, T>(deadline: Option<Duration>, fut: F) -> SessionResult<T>
where
    F: Future<Output = SessionResult<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| SessionError::Timeout)?,
        None => fut.await,
    }
}

/// Log a failed session at a level matching its cause. Called inside the
/// session's span, which carries the session number.
pub(crate) fn log_session_failure(error: &SessionError) {
    if error.is_transient() {
        tracing::debug!(error = %error, "session abandoned");
    } else {
        tracing::error!(error = %error, "session aborted on protocol error");
    }
}

/// A running replica: listener and scheduler tasks around a shared
/// [`Replica`]. Dropping the node stops both tasks.
pub struct ReplicaNode<P, H> {
    replica: Arc<Replica<P, H>>,
    config: Arc<TsaeConfig>,
    local_addr: SocketAddr,
    tasks: Vec<JoinHandle<()>>,
}

impl<P, H> ReplicaNode<P, H>
where
    P: Payload,
    H: OperationHandler<P> + 'static,
{
    /// Bind the listener and spawn the listener and scheduler tasks.
    pub async fn start(replica: Arc<Replica<P, H>>, config: TsaeConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).await?;
        Self::start_with_listener(replica, listener, config)
    }

    /// Spawn the listener and scheduler tasks on an already bound listener.
    pub fn start_with_listener(
        replica: Arc<Replica<P, H>>,
        listener: TcpListener,
        config: TsaeConfig,
    ) -> std::io::Result<Self> {
        let local_addr = listener.local_addr()?;
        let config = Arc::new(config);
        tracing::info!(replica = %replica.id(), addr = %local_addr, "replica listening");

        let tasks = vec![
            tokio::spawn(listener::serve(replica.clone(), listener, config.clone())),
            tokio::spawn(scheduler::run_rounds(replica.clone(), config.clone())),
        ];

        Ok(Self {
            replica,
            config,
            local_addr,
            tasks,
        })
    }

    /// The replica this node serves.
    pub fn replica(&self) -> &Arc<Replica<P, H>> {
        &self.replica
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run one originator round now, outside the schedule.
    pub async fn sync_now(&self) -> Vec<SessionReport> {
        scheduler::session_with_n(&self.replica, self.replica.sessions_per_round(), &self.config)
            .await
    }
}

impl<P, H> ReplicaNode<P, H> {
    /// Stop the listener and scheduler.
    pub fn shutdown(mut self) {
        self.abort_tasks();
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl<P, H> Drop for ReplicaNode<P, H> {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}
