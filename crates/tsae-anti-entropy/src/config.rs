//! Replica runtime configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tsae_core::ReplicaId;

/// Default upper bound on a single framed message.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// A peer replica and where to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Replica identifier of the peer
    pub id: ReplicaId,
    /// `host:port` the peer listens on
    pub addr: String,
}

/// Configuration of one replica process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TsaeConfig {
    /// This replica's identifier
    pub replica_id: ReplicaId,
    /// Address the partner-side listener binds to
    pub listen_addr: String,
    /// Every other participant
    pub peers: Vec<PeerConfig>,
    /// Period between originator rounds
    pub session_interval_ms: u64,
    /// Number of random partners contacted per round
    pub sessions_per_round: usize,
    /// Largest accepted frame on the wire
    pub max_frame_bytes: usize,
    /// Deadline for establishing an outbound connection
    pub connect_timeout_ms: u64,
    /// Optional deadline for a whole session; the protocol itself has none
    pub session_timeout_ms: Option<u64>,
}

impl Default for TsaeConfig {
    fn default() -> Self {
        Self {
            replica_id: ReplicaId::from("replica-0"),
            listen_addr: "127.0.0.1:35000".to_string(),
            peers: Vec::new(),
            session_interval_ms: 5_000,
            sessions_per_round: 1,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            connect_timeout_ms: 3_000,
            session_timeout_ms: None,
        }
    }
}

impl TsaeConfig {
    /// Load a configuration file, picking the format from its extension.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| ConfigError::Parse(format!("Invalid TOML: {e}"))),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ConfigError::Parse(format!("Invalid JSON: {e}"))),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Override fields from `TSAE_*` environment variables.
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with_vars(std::env::vars())
    }

    fn merge_with_vars<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                "TSAE_REPLICA_ID" => self.replica_id = ReplicaId::from(value),
                "TSAE_LISTEN_ADDR" => self.listen_addr = value,
                "TSAE_SESSION_INTERVAL_MS" => {
                    self.session_interval_ms = value.parse().map_err(|_| {
                        ConfigError::Invalid("Invalid interval in TSAE_SESSION_INTERVAL_MS".into())
                    })?;
                }
                "TSAE_SESSIONS_PER_ROUND" => {
                    self.sessions_per_round = value.parse().map_err(|_| {
                        ConfigError::Invalid("Invalid count in TSAE_SESSIONS_PER_ROUND".into())
                    })?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Check constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replica_id.as_str().is_empty() {
            return Err(ConfigError::Invalid("replica_id must not be empty".into()));
        }
        if self.session_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "session_interval_ms must be positive".into(),
            ));
        }
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::Invalid("max_frame_bytes must be positive".into()));
        }

        let mut seen = BTreeSet::new();
        for peer in &self.peers {
            if peer.id == self.replica_id {
                return Err(ConfigError::Invalid(format!(
                    "peer list contains this replica ({})",
                    peer.id
                )));
            }
            if !seen.insert(&peer.id) {
                return Err(ConfigError::Invalid(format!("duplicate peer id {}", peer.id)));
            }
        }
        Ok(())
    }

    /// This replica followed by every peer, the static participant set.
    pub fn participants(&self) -> Vec<ReplicaId> {
        std::iter::once(self.replica_id.clone())
            .chain(self.peers.iter().map(|p| p.id.clone()))
            .collect()
    }

    /// Period between originator rounds.
    pub fn session_interval(&self) -> Duration {
        Duration::from_millis(self.session_interval_ms)
    }

    /// Deadline for dialing a peer.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Deadline for a whole session, if any.
    pub fn session_timeout(&self) -> Option<Duration> {
        self.session_timeout_ms.map(Duration::from_millis)
    }
}
