//! # craftgate-core
//!
//! RCON client core for the craftgate status facade: many short-lived
//! concurrent queries bridged onto a single authenticated, stateful
//! connection per game-server backend.
//!
//! This crate contains:
//! - **Packet / Codec**: the RCON wire format and `RconCodec` for
//!   framed TCP I/O via `tokio_util`
//! - **Handshake**: the login exchange, including the empty-echo quirk
//! - **Channel**: `CommandChannel` — one physical connection, many
//!   concurrent logical commands, correlated by request id
//! - **Session**: `RconSession` — connect/reconnect state machine with
//!   exponential backoff
//! - **Registry**: `SessionRegistry` — one session per backend id,
//!   created lazily
//! - **Status**: pure parsers for `list` replies
//! - **Api**: `QueryApi` — the report-shaped surface the HTTP layer
//!   consumes
//! - **Error**: `RconError` — typed, `thiserror`-based error hierarchy

pub mod api;
pub mod backoff;
pub mod channel;
pub mod codec;
pub mod config;
pub mod error;
pub mod handshake;
pub mod packet;
pub mod registry;
pub mod session;
pub mod state;
pub mod status;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use api::{ExecReport, InfoReport, QueryApi, RosterReport, StatusReport};
pub use backoff::ExponentialBackoff;
pub use channel::CommandChannel;
pub use codec::RconCodec;
pub use config::{BackendConfig, SessionTuning};
pub use error::RconError;
pub use handshake::{AUTH_REQUEST_ID, authenticate};
pub use packet::{AUTH_FAILURE_ID, MAX_BODY_SIZE, MAX_FRAME_SIZE, Packet, PacketKind};
pub use registry::SessionRegistry;
pub use session::RconSession;
pub use state::SessionPhase;
pub use status::{ServerInfo, ServerStatus, parse_info, parse_roster, parse_status};
