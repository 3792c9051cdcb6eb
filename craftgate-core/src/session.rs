//! One logical session per backend: connect, authenticate, reconnect
//! with backoff, and a stable "send command, await text reply" API that
//! survives connection churn underneath.
//!
//! Concurrency contract: exactly one physical connection attempt is in
//! flight per session at any time. Callers that arrive while an attempt
//! is running join it and share its outcome — success hands everyone
//! the same channel, failure hands everyone the same error. Callers
//! that arrive inside the backoff window fail fast with `Unavailable`
//! instead of queueing, keeping the facade responsive while a backend
//! is down.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::ExponentialBackoff;
use crate::channel::CommandChannel;
use crate::codec::RconCodec;
use crate::config::{BackendConfig, SessionTuning};
use crate::error::RconError;
use crate::handshake::{AUTH_REQUEST_ID, authenticate};
use crate::state::SessionPhase;
use crate::status::{self, ServerInfo, ServerStatus};

struct SessionState {
    phase: SessionPhase,
    channel: Option<Arc<CommandChannel>>,
    backoff: ExponentialBackoff,
    /// Outcome of the most recent attempt, shared with callers that
    /// joined it.
    last_failure: Option<RconError>,
    /// Bumped whenever an attempt or channel concludes; lets a joining
    /// caller tell "the attempt I joined failed" from "still waiting".
    attempt_seq: u64,
}

/// A managed RCON session for one backend.
pub struct RconSession {
    backend: BackendConfig,
    tuning: SessionTuning,
    state: Mutex<SessionState>,
    /// Serializes physical connection attempts; callers joining an
    /// in-flight attempt park on this lock.
    connect_gate: Mutex<()>,
    cancel: CancellationToken,
}

impl RconSession {
    /// Construct disconnected; the first command dials the backend.
    pub fn new(backend: BackendConfig, tuning: SessionTuning) -> Self {
        let backoff = ExponentialBackoff::new(
            tuning.backoff_base(),
            tuning.backoff_cap(),
            tuning.backoff_factor,
        );
        Self {
            backend,
            tuning,
            state: Mutex::new(SessionState {
                phase: SessionPhase::Disconnected,
                channel: None,
                backoff,
                last_failure: None,
                attempt_seq: 0,
            }),
            connect_gate: Mutex::new(()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn backend_id(&self) -> &str {
        &self.backend.id
    }

    /// Current lifecycle phase (snapshot).
    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase.clone()
    }

    // ── Command API ──────────────────────────────────────────────

    /// Send one console command with an explicit deadline, connecting
    /// and authenticating first if needed.
    pub async fn send(&self, command: &str, timeout: Duration) -> Result<String, RconError> {
        let channel = self.ready_channel().await?;
        match channel.send(command, timeout).await {
            Err(e @ RconError::ConnectionLost(_)) => {
                self.note_channel_failure(&channel, &e).await;
                Err(e)
            }
            other => other,
        }
    }

    /// [`send`](Self::send) with the configured default deadline.
    pub async fn command(&self, command: &str) -> Result<String, RconError> {
        self.send(command, self.tuning.command_timeout()).await
    }

    /// Issue `list` and extract player counts.
    pub async fn status(&self) -> Result<ServerStatus, RconError> {
        let reply = self.command("list").await?;
        Ok(status::parse_status(&reply))
    }

    /// Issue `list` and extract player names.
    pub async fn roster(&self) -> Result<Vec<String>, RconError> {
        let reply = self.command("list").await?;
        Ok(status::parse_roster(&reply))
    }

    /// Server metadata. No wire traffic: nothing in the current command
    /// set exposes version or MOTD, so this stays declared-unknown.
    pub fn info(&self) -> ServerInfo {
        status::parse_info()
    }

    /// Scoped teardown, safe from any phase, idempotent: cancels an
    /// in-flight connect or login, fails outstanding commands with
    /// [`RconError::SessionClosed`], and releases the socket.
    pub async fn close(&self) {
        self.cancel.cancel();
        let channel = {
            let mut state = self.state.lock().await;
            state.phase.close();
            state.last_failure = Some(RconError::SessionClosed);
            state.attempt_seq += 1;
            state.channel.take()
        };
        if let Some(channel) = channel {
            channel.shutdown(RconError::SessionClosed).await;
        }
        debug!(backend = %self.backend.id, "session closed");
    }

    // ── Connection management ────────────────────────────────────

    /// Resolve a channel that is ready for commands, dialling the
    /// backend if this caller is the one that must do so.
    async fn ready_channel(&self) -> Result<Arc<CommandChannel>, RconError> {
        // Fast path and join decision, one short lock.
        let joined_seq = {
            let state = self.state.lock().await;
            match &state.phase {
                SessionPhase::Closed => return Err(RconError::SessionClosed),
                SessionPhase::Ready { .. } => {
                    if let Some(channel) = &state.channel {
                        return Ok(channel.clone());
                    }
                    state.attempt_seq
                }
                SessionPhase::Faulted { retry_at } => {
                    let now = Instant::now();
                    if now < *retry_at {
                        return Err(RconError::Unavailable(*retry_at - now));
                    }
                    state.attempt_seq
                }
                // Disconnected, or someone mid-attempt: join below.
                _ => state.attempt_seq,
            }
        };

        let _gate = self.connect_gate.lock().await;

        // Re-check under the gate: the attempt this caller joined may
        // have concluded while parking.
        {
            let state = self.state.lock().await;
            match &state.phase {
                SessionPhase::Closed => return Err(RconError::SessionClosed),
                SessionPhase::Ready { .. } => {
                    if let Some(channel) = &state.channel {
                        return Ok(channel.clone());
                    }
                }
                SessionPhase::Faulted { .. } if state.attempt_seq != joined_seq => {
                    // Shared outcome of the attempt we joined.
                    return Err(state
                        .last_failure
                        .clone()
                        .unwrap_or(RconError::ConnectionLost("connect attempt failed".into())));
                }
                _ => {}
            }
        }

        self.attempt_connect().await
    }

    /// Run one full connect-and-authenticate attempt. Caller must hold
    /// the connect gate.
    async fn attempt_connect(&self) -> Result<Arc<CommandChannel>, RconError> {
        {
            let mut state = self.state.lock().await;
            if state.phase.is_closed() {
                return Err(RconError::SessionClosed);
            }
            state.phase.begin_connect()?;
        }
        info!(backend = %self.backend.id, address = %self.backend.address(), "connecting");

        let result = tokio::select! {
            _ = self.cancel.cancelled() => Err(RconError::SessionClosed),
            outcome = self.dial_and_auth() => outcome,
        };

        let mut state = self.state.lock().await;
        state.attempt_seq += 1;
        match result {
            Ok(channel) => {
                if state.phase.is_closed() {
                    // close() won the race; release the fresh socket.
                    drop(state);
                    channel.shutdown(RconError::SessionClosed).await;
                    return Err(RconError::SessionClosed);
                }
                let channel = Arc::new(channel);
                state.phase.complete_auth()?;
                state.channel = Some(channel.clone());
                state.last_failure = None;
                info!(backend = %self.backend.id, "authenticated and ready");
                Ok(channel)
            }
            Err(RconError::SessionClosed) => {
                state.phase.close();
                state.last_failure = Some(RconError::SessionClosed);
                Err(RconError::SessionClosed)
            }
            Err(e) => {
                // A rejected password is not retried on the normal
                // schedule: the session sits at the backoff cap until
                // it is torn down and recreated with new credentials.
                let delay = if e == RconError::AuthFailed {
                    self.tuning.backoff_cap()
                } else {
                    state.backoff.next_delay()
                };
                state.phase.fault(Instant::now() + delay);
                state.last_failure = Some(e.clone());
                warn!(
                    backend = %self.backend.id,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "connect attempt failed"
                );
                Err(e)
            }
        }
    }

    async fn dial_and_auth(&self) -> Result<CommandChannel, RconError> {
        let address = self.backend.address();
        let stream = tokio::time::timeout(
            self.tuning.connect_timeout(),
            TcpStream::connect(address.as_str()),
        )
            .await
            .map_err(|_| RconError::ConnectionLost(format!("connect to {address} timed out")))?
            .map_err(RconError::from)?;

        {
            let mut state = self.state.lock().await;
            if state.phase.is_closed() {
                return Err(RconError::SessionClosed);
            }
            state.phase.begin_auth()?;
        }

        let mut framed = Framed::new(stream, RconCodec::new());
        tokio::time::timeout(
            self.tuning.connect_timeout(),
            authenticate(&mut framed, &self.backend.password, AUTH_REQUEST_ID),
        )
        .await
        .map_err(|_| RconError::ConnectionLost("login exchange timed out".into()))??;

        Ok(CommandChannel::new(framed))
    }

    /// Transition to `Faulted` after the live channel died under a
    /// command. A sustained ready period earns a backoff reset first.
    async fn note_channel_failure(&self, failed: &Arc<CommandChannel>, error: &RconError) {
        let mut state = self.state.lock().await;
        let is_current = state
            .channel
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, failed));
        if !is_current {
            return;
        }
        if state
            .phase
            .connected_duration()
            .is_some_and(|d| d >= self.tuning.ready_reset_after())
        {
            state.backoff.reset();
        }
        let delay = state.backoff.next_delay();
        state.phase.fault(Instant::now() + delay);
        state.channel = None;
        state.last_failure = Some(error.clone());
        state.attempt_seq += 1;
        warn!(
            backend = %self.backend.id,
            error = %error,
            retry_in_ms = delay.as_millis() as u64,
            "connection lost; backoff armed"
        );
    }
}

impl std::fmt::Debug for RconSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RconSession")
            .field("backend", &self.backend.id)
            .field("address", &self.backend.address())
            .finish()
    }
}
