//! RCON wire packet model.
//!
//! # Wire format
//!
//! Every frame is little-endian:
//!
//! ```text
//! size:        i32  (4)   byte length of everything after this field
//! request_id:  i32  (4)   client-chosen correlation token
//! kind:        i32  (4)   3 = login, 2 = command, 0 = response
//! body:        [u8]       UTF-8 text, no embedded NUL
//! terminator:  u8   (1)   0x00
//! terminator:  u8   (1)   0x00
//! ```
//!
//! The discriminant `2` is reused by the protocol: outbound it marks a
//! command, inbound it marks the auth response. Disambiguation is
//! contextual — by which request was sent, never by the kind alone.

use std::fmt;

use crate::error::RconError;

/// Largest body the codec will accept, outbound or inbound. Longer
/// server replies arrive split across multiple frames (see `channel`).
pub const MAX_BODY_SIZE: usize = 4096;

/// `request_id + kind + terminators` — the encoded overhead counted by
/// the size field.
pub const FRAME_OVERHEAD: usize = 4 + 4 + 2;

/// Largest value the size field may declare.
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_BODY_SIZE;

/// The request id the auth response carries when the password was wrong.
pub const AUTH_FAILURE_ID: i32 = -1;

// ── PacketKind ───────────────────────────────────────────────────

/// The type field of an RCON frame.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// Login request carrying the password. Outbound only.
    Login = 3,
    /// A console command (outbound), or the auth response (inbound) —
    /// the protocol reuses the discriminant.
    Command = 2,
    /// A command reply, possibly one fragment of many.
    Response = 0,
}

impl TryFrom<i32> for PacketKind {
    type Error = RconError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(PacketKind::Login),
            2 => Ok(PacketKind::Command),
            0 => Ok(PacketKind::Response),
            other => Err(RconError::UnknownPacketKind(other)),
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ── Packet ───────────────────────────────────────────────────────

/// One decoded RCON frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    request_id: i32,
    kind: PacketKind,
    body: String,
}

impl Packet {
    /// Build a login packet carrying the password.
    pub fn login(request_id: i32, password: &str) -> Result<Self, RconError> {
        Self::new(request_id, PacketKind::Login, password)
    }

    /// Build a console command packet.
    pub fn command(request_id: i32, command: &str) -> Result<Self, RconError> {
        Self::new(request_id, PacketKind::Command, command)
    }

    /// Build a packet of any kind, validating the body.
    pub fn new(request_id: i32, kind: PacketKind, body: &str) -> Result<Self, RconError> {
        if body.len() > MAX_BODY_SIZE {
            return Err(RconError::Encoding("body exceeds maximum size"));
        }
        if body.as_bytes().contains(&0) {
            return Err(RconError::Encoding("body contains an embedded NUL"));
        }
        Ok(Self {
            request_id,
            kind,
            body: body.to_string(),
        })
    }

    /// Used by the codec for frames arriving off the wire, where the
    /// body extent is fixed by the declared size.
    pub(crate) fn from_wire(request_id: i32, kind: PacketKind, body: String) -> Self {
        Self {
            request_id,
            kind,
            body,
        }
    }

    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    /// The value of the size field for this packet.
    pub fn wire_size(&self) -> usize {
        FRAME_OVERHEAD + self.body.len()
    }
}
