//! Backend addressing and session tuning.
//!
//! Host, port, and password are consumed as opaque values — no parsing
//! or validation belongs here; whoever delivers configuration owns
//! that.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One logical game-server instance reachable over RCON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Identifier the registry and query API key sessions by.
    pub id: String,
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl BackendConfig {
    /// `host:port` as dialled.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Knobs shared by every session a registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// Deadline for TCP connect and for the login exchange, each.
    pub connect_timeout_ms: u64,
    /// Default per-command deadline.
    pub command_timeout_ms: u64,
    /// First reconnect delay after a failure.
    pub backoff_base_ms: u64,
    /// Ceiling on the reconnect delay.
    pub backoff_cap_ms: u64,
    /// Growth factor between consecutive delays.
    pub backoff_factor: f64,
    /// A session that stayed ready at least this long resets its
    /// backoff schedule when it next faults.
    pub ready_reset_after_ms: u64,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            command_timeout_ms: 10_000,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 30_000,
            backoff_factor: 2.0,
            ready_reset_after_ms: 30_000,
        }
    }
}

impl SessionTuning {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }

    pub fn ready_reset_after(&self) -> Duration {
        Duration::from_millis(self.ready_reset_after_ms)
    }
}
