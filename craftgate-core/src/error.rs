//! Domain-specific error types for the RCON client core.
//!
//! All fallible operations return `Result<T, RconError>`.
//! No panics on remote input — every error is typed and recoverable.
//!
//! The enum is `Clone` because the outcome of a shared connection attempt
//! is delivered to every caller that joined it (see `session`).

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the RCON client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RconError {
    // ── Protocol Errors ──────────────────────────────────────────
    /// A frame violated the wire format (bad size, bad terminators, …).
    /// Not retried; surfaces as a connection failure.
    #[error("malformed frame: {0}")]
    Protocol(&'static str),

    /// The type field did not map to any known packet kind.
    #[error("unknown packet kind: {0:#x}")]
    UnknownPacketKind(i32),

    /// A packet body could not be encoded (embedded NUL, oversized, …).
    #[error("encoding error: {0}")]
    Encoding(&'static str),

    // ── Session Errors ───────────────────────────────────────────
    /// The server rejected the password. Not retried automatically;
    /// the session stays faulted until reconfigured.
    #[error("authentication rejected by server")]
    AuthFailed,

    /// The TCP layer failed or the server closed the stream. Triggers
    /// backoff and a reconnect on next use.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// A single command exceeded its deadline. The connection stays
    /// alive; the caller may retry.
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// The session is in its backoff window; fail fast instead of
    /// queueing. Carries the time remaining until the next attempt.
    #[error("backend unavailable, next attempt in {0:?}")]
    Unavailable(Duration),

    /// Explicit teardown in progress or complete.
    #[error("session closed")]
    SessionClosed,

    /// A session phase transition that is not allowed from the
    /// current phase.
    #[error("invalid session phase: {0}")]
    InvalidPhase(&'static str),

    // ── Registry Errors ──────────────────────────────────────────
    /// No backend is registered under the requested identifier.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),
}

impl From<std::io::Error> for RconError {
    fn from(e: std::io::Error) -> Self {
        RconError::ConnectionLost(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = RconError::Protocol("missing frame terminators");
        assert!(e.to_string().contains("malformed"));

        let e = RconError::Timeout(Duration::from_secs(5));
        assert!(e.to_string().contains("5s"));

        let e = RconError::UnknownBackend("smp-1".into());
        assert!(e.to_string().contains("smp-1"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: RconError = io_err.into();
        assert!(matches!(e, RconError::ConnectionLost(_)));
    }

    #[test]
    fn clone_preserves_kind() {
        let e = RconError::ConnectionLost("reset by peer".into());
        assert_eq!(e.clone(), e);
    }
}
