//! Session lifecycle state machine.
//!
//! Models the phases of one backend session, with validated transitions
//! that return `Result` instead of panicking.
//!
//! ```text
//!  Disconnected ──► Connecting ──► Authenticating ──► Ready
//!                       │                │               │
//!                       ▼                ▼               ▼
//!                    Faulted ◄───────────┴───────────────┘
//!                       │ (backoff elapsed, new command)
//!                       └──► Connecting
//! ```
//!
//! `Closed` is reachable from every phase and absorbing; once a session
//! is closed, nothing reopens it.

use std::time::{Duration, Instant};

use crate::error::RconError;

/// The current phase of a backend session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No connection and no attempt in flight. Initial state.
    #[default]
    Disconnected,

    /// TCP connect initiated but not yet established.
    Connecting,

    /// Socket is up; login exchange in progress.
    Authenticating,

    /// Authenticated and accepting commands.
    Ready {
        /// When the session entered `Ready`.
        since: Instant,
    },

    /// A connect, login, or I/O failure occurred; the next attempt is
    /// not allowed before `retry_at`.
    Faulted {
        /// End of the backoff window.
        retry_at: Instant,
    },

    /// Explicit teardown. Terminal.
    Closed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Authenticating => write!(f, "Authenticating"),
            Self::Ready { .. } => write!(f, "Ready"),
            Self::Faulted { .. } => write!(f, "Faulted"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

impl SessionPhase {
    /// Accepting commands.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted { .. })
    }

    /// How long the session has been `Ready`; `None` in any other phase.
    pub fn connected_duration(&self) -> Option<Duration> {
        match self {
            Self::Ready { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    /// End of the backoff window; `None` unless `Faulted`.
    pub fn retry_at(&self) -> Option<Instant> {
        match self {
            Self::Faulted { retry_at } => Some(*retry_at),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Connecting`.
    ///
    /// Valid from: `Disconnected`, `Faulted` (the caller is responsible
    /// for honouring `retry_at` first).
    pub fn begin_connect(&mut self) -> Result<(), RconError> {
        match self {
            Self::Disconnected | Self::Faulted { .. } => {
                *self = Self::Connecting;
                Ok(())
            }
            _ => Err(RconError::InvalidPhase(
                "cannot connect: not Disconnected or Faulted",
            )),
        }
    }

    /// Transition to `Authenticating`.
    ///
    /// Valid from: `Connecting`.
    pub fn begin_auth(&mut self) -> Result<(), RconError> {
        match self {
            Self::Connecting => {
                *self = Self::Authenticating;
                Ok(())
            }
            _ => Err(RconError::InvalidPhase("cannot authenticate: not Connecting")),
        }
    }

    /// Transition to `Ready`.
    ///
    /// Valid from: `Authenticating`.
    pub fn complete_auth(&mut self) -> Result<(), RconError> {
        match self {
            Self::Authenticating => {
                *self = Self::Ready {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(RconError::InvalidPhase(
                "cannot complete login: not Authenticating",
            )),
        }
    }

    /// Record a failure and arm the backoff window ending at `retry_at`.
    ///
    /// Valid from any phase except `Closed`, which it never overwrites.
    pub fn fault(&mut self, retry_at: Instant) {
        if !self.is_closed() {
            *self = Self::Faulted { retry_at };
        }
    }

    /// Terminal teardown, valid from any phase. Idempotent.
    pub fn close(&mut self) {
        *self = Self::Closed;
    }
}
