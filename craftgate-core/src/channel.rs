//! Multiplexes concurrent logical commands over one authenticated
//! connection.
//!
//! The historical bug class designed against here: matching "the next
//! incoming packet" to "the last command sent" is unsafe once two
//! callers overlap. Replies are correlated strictly by request id
//! through a pending-request table — a tagged map from id to a
//! single-assignment result slot, resolved exactly once.
//!
//! Ownership: the write half of the connection sits behind an async
//! mutex (one writer at a time, no interleaved frames); the read half
//! is owned by exactly one spawned reader task. Callers contend only on
//! those two points, never on each other's request ids.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::codec::RconCodec;
use crate::error::RconError;
use crate::packet::{MAX_BODY_SIZE, Packet};

type Writer = SplitSink<Framed<TcpStream, RconCodec>, Packet>;
type Reader = SplitStream<Framed<TcpStream, RconCodec>>;
type ReplySlot = oneshot::Sender<Result<String, RconError>>;

// ── Pending-request table ────────────────────────────────────────

/// One outstanding command awaiting its reply.
struct PendingReply {
    slot: ReplySlot,
    /// Fragments accumulated so far for this request id.
    assembled: String,
    sent_at: Instant,
}

struct PendingTable {
    next_id: i32,
    entries: HashMap<i32, PendingReply>,
    /// Set once the reader stops; subsequent sends fail fast with a
    /// clone of this error.
    closed: Option<RconError>,
}

impl PendingTable {
    /// Fresh id from a monotonically increasing, wraparound-safe
    /// counter. Ids still pending are skipped, so an id is never reused
    /// while its request is outstanding; `-1` and the auth id are never
    /// produced.
    fn allocate(&mut self) -> i32 {
        loop {
            let id = self.next_id;
            self.next_id = if self.next_id == i32::MAX {
                1
            } else {
                self.next_id + 1
            };
            if !self.entries.contains_key(&id) {
                return id;
            }
        }
    }

    fn fail_all(&mut self, error: RconError) {
        self.closed = Some(error.clone());
        for (_, pending) in self.entries.drain() {
            let _ = pending.slot.send(Err(error.clone()));
        }
    }
}

// ── CommandChannel ───────────────────────────────────────────────

/// Owns one authenticated physical connection and correlates replies.
pub struct CommandChannel {
    writer: Mutex<Writer>,
    pending: Arc<Mutex<PendingTable>>,
    reader: JoinHandle<()>,
}

impl CommandChannel {
    /// Take ownership of an authenticated stream and start the reader.
    pub fn new(framed: Framed<TcpStream, RconCodec>) -> Self {
        let (writer, reader) = framed.split();
        let pending = Arc::new(Mutex::new(PendingTable {
            next_id: 1,
            entries: HashMap::new(),
            closed: None,
        }));
        let reader = tokio::spawn(run_reader(reader, pending.clone()));
        Self {
            writer: Mutex::new(writer),
            pending,
            reader,
        }
    }

    /// Send one console command and await its reply up to `timeout`.
    ///
    /// On timeout the pending entry is removed and the caller gets
    /// [`RconError::Timeout`]; the connection itself is left open, and
    /// a late reply is dropped by the reader as unmatched. Resolution
    /// and removal-on-timeout take the table lock, so whichever happens
    /// first wins and the other is a no-op.
    pub async fn send(&self, command: &str, timeout: Duration) -> Result<String, RconError> {
        let (id, rx, packet) = {
            let mut table = self.pending.lock().await;
            if let Some(error) = &table.closed {
                return Err(error.clone());
            }
            let id = table.allocate();
            // Validate before registering, so a rejected body never
            // leaves a dangling entry behind.
            let packet = Packet::command(id, command)?;
            let (tx, rx) = oneshot::channel();
            table.entries.insert(
                id,
                PendingReply {
                    slot: tx,
                    assembled: String::new(),
                    sent_at: Instant::now(),
                },
            );
            (id, rx, packet)
        };
        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = writer.send(packet).await {
                self.pending.lock().await.entries.remove(&id);
                return Err(e);
            }
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(RconError::ConnectionLost("channel torn down".into())),
            Err(_) => {
                if let Some(pending) = self.pending.lock().await.entries.remove(&id) {
                    debug!(
                        request_id = id,
                        elapsed_ms = pending.sent_at.elapsed().as_millis() as u64,
                        "command timed out; leaving connection open"
                    );
                }
                Err(RconError::Timeout(timeout))
            }
        }
    }

    /// Number of commands currently awaiting replies.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.entries.len()
    }

    /// Whether the reader has stopped and no further sends can succeed.
    pub async fn is_closed(&self) -> bool {
        self.pending.lock().await.closed.is_some()
    }

    /// Fail every outstanding command with `error` and stop the reader.
    /// Idempotent; dropping the channel releases the socket.
    pub async fn shutdown(&self, error: RconError) {
        self.pending.lock().await.fail_all(error);
        self.reader.abort();
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

// ── Reader loop ──────────────────────────────────────────────────

/// Sole owner of the inbound half. Decodes one packet at a time and
/// resolves the matching pending entry; a reply with no match is
/// dropped and logged, never a crash. On decode failure or stream
/// close, fails every outstanding entry and stops.
async fn run_reader(mut reader: Reader, pending: Arc<Mutex<PendingTable>>) {
    loop {
        match reader.next().await {
            Some(Ok(packet)) => {
                let id = packet.request_id();
                let body = packet.into_body();
                let mut table = pending.lock().await;
                let Some(entry) = table.entries.get_mut(&id) else {
                    debug!(request_id = id, "dropping reply with no pending request");
                    continue;
                };
                entry.assembled.push_str(&body);
                // A full-size body means more fragments follow; the
                // first short packet — the empty sentinel included —
                // completes the reply.
                if body.len() >= MAX_BODY_SIZE {
                    continue;
                }
                if let Some(entry) = table.entries.remove(&id) {
                    let _ = entry.slot.send(Ok(entry.assembled));
                }
            }
            Some(Err(e)) => {
                warn!(error = %e, "reader stopping on protocol error");
                pending.lock().await.fail_all(RconError::ConnectionLost(
                    format!("protocol error on inbound stream: {e}"),
                ));
                return;
            }
            None => {
                debug!("stream closed by server");
                pending
                    .lock()
                    .await
                    .fail_all(RconError::ConnectionLost("closed by server".into()));
                return;
            }
        }
    }
}
