//! Query surface consumed by the HTTP layer.
//!
//! Every operation returns a report value rather than an error: a
//! backend that is down, unauthenticated, or slow degrades to an
//! offline-shaped or partial report with an `error` string, so the
//! caller can always serve a well-formed JSON body instead of a 5xx.
//! Field names serialize in camelCase to match the consuming layer.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::registry::SessionRegistry;

/// Player counts for one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_players: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Names of the players currently online.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterReport {
    pub players: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Server metadata, best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Raw reply of an arbitrary console command — the extension primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Facade over the registry, one instance shared by all handlers.
#[derive(Debug, Clone)]
pub struct QueryApi {
    registry: Arc<SessionRegistry>,
}

impl QueryApi {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Online status and player counts for `backend_id`.
    pub async fn status(&self, backend_id: &str) -> StatusReport {
        let session = match self.registry.get(backend_id).await {
            Ok(session) => session,
            Err(e) => return StatusReport::offline(e.to_string()),
        };
        match session.status().await {
            Ok(status) => StatusReport {
                online: status.online,
                player_count: status.player_count,
                max_players: status.max_players,
                error: None,
            },
            Err(e) => {
                debug!(backend = backend_id, error = %e, "status query failed");
                StatusReport::offline(e.to_string())
            }
        }
    }

    /// Names of players online on `backend_id`; empty with an error
    /// string when the backend cannot be reached.
    pub async fn roster(&self, backend_id: &str) -> RosterReport {
        let session = match self.registry.get(backend_id).await {
            Ok(session) => session,
            Err(e) => {
                return RosterReport {
                    players: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };
        match session.roster().await {
            Ok(players) => RosterReport {
                players,
                error: None,
            },
            Err(e) => {
                debug!(backend = backend_id, error = %e, "roster query failed");
                RosterReport {
                    players: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Server metadata for `backend_id`. Version and MOTD stay absent
    /// until a command exposing them is wired in.
    pub async fn info(&self, backend_id: &str) -> InfoReport {
        match self.registry.get(backend_id).await {
            Ok(session) => {
                let info = session.info();
                InfoReport {
                    version: info.version,
                    motd: info.motd,
                    error: None,
                }
            }
            Err(e) => InfoReport {
                version: None,
                motd: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Run an arbitrary console command against `backend_id` and return
    /// the raw reply text.
    pub async fn execute(&self, backend_id: &str, command: &str) -> ExecReport {
        let session = match self.registry.get(backend_id).await {
            Ok(session) => session,
            Err(e) => {
                return ExecReport {
                    reply: None,
                    error: Some(e.to_string()),
                };
            }
        };
        match session.command(command).await {
            Ok(reply) => ExecReport {
                reply: Some(reply),
                error: None,
            },
            Err(e) => {
                debug!(backend = backend_id, error = %e, "exec failed");
                ExecReport {
                    reply: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

impl StatusReport {
    fn offline(error: String) -> Self {
        Self {
            online: false,
            player_count: None,
            max_players: None,
            error: Some(error),
        }
    }
}
