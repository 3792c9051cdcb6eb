//! RCON login exchange.
//!
//! ```text
//! Client ──[Login, id=N, body=password]──────────► Server
//!
//! Server ──[Response, id=N, body=""]─────────────► Client   (optional echo)
//! Server ──[Command,  id=N or -1, body=""]───────► Client   (auth response)
//! ```
//!
//! Success and failure are signalled by the request id of the auth
//! response, not by its kind: the id echoes the login's id on success
//! and is `-1` on a bad password. Some server versions emit one empty
//! response packet before the real auth response; exactly one such echo
//! is discarded if present.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::debug;

use crate::codec::RconCodec;
use crate::error::RconError;
use crate::packet::{AUTH_FAILURE_ID, Packet, PacketKind};

/// Request id used for the login exchange. Command ids start above it,
/// so an auth response can never be confused with a command reply.
pub const AUTH_REQUEST_ID: i32 = 0;

/// Perform the login exchange over a freshly framed connection.
///
/// On success the stream is authenticated and ready for commands. On
/// [`RconError::AuthFailed`] the stream itself is left usable — a
/// subsequent call with corrected credentials may succeed.
pub async fn authenticate(
    framed: &mut Framed<TcpStream, RconCodec>,
    password: &str,
    request_id: i32,
) -> Result<(), RconError> {
    let login = Packet::login(request_id, password)?;
    framed.send(login).await?;

    let mut reply = next_packet(framed).await?;
    if reply.kind() == PacketKind::Response && reply.body().is_empty() {
        debug!("discarding empty echo packet before auth response");
        reply = next_packet(framed).await?;
    }

    if reply.kind() != PacketKind::Command {
        return Err(RconError::Protocol("unexpected packet kind during login"));
    }
    if reply.request_id() == AUTH_FAILURE_ID {
        return Err(RconError::AuthFailed);
    }
    if reply.request_id() != request_id {
        return Err(RconError::Protocol("auth response for a different request"));
    }
    Ok(())
}

async fn next_packet(framed: &mut Framed<TcpStream, RconCodec>) -> Result<Packet, RconError> {
    match framed.next().await {
        Some(Ok(packet)) => Ok(packet),
        Some(Err(e)) => Err(e),
        None => Err(RconError::ConnectionLost(
            "stream closed during login".into(),
        )),
    }
}
