//! Length-prefixed framing for RCON packets via `tokio_util`.
//!
//! The wire is a byte stream, not a message stream: `decode` is fed an
//! incrementally growing buffer and returns `Ok(None)` until a whole
//! frame is present. A declared size that is negative, below the fixed
//! overhead, or beyond [`MAX_FRAME_SIZE`] is treated as a malformed
//! frame — a garbled or adversarial length field must never make the
//! decoder wait for gigabytes.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::RconError;
use crate::packet::{FRAME_OVERHEAD, MAX_FRAME_SIZE, Packet, PacketKind};

/// Stateless codec; all framing state lives in the caller's buffer.
#[derive(Debug, Default)]
pub struct RconCodec;

impl RconCodec {
    pub const fn new() -> Self {
        Self
    }
}

fn read_i32_le(buf: &[u8]) -> i32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[..4]);
    i32::from_le_bytes(bytes)
}

impl Decoder for RconCodec {
    type Item = Packet;
    type Error = RconError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, RconError> {
        if src.len() < 4 {
            return Ok(None);
        }

        let declared = read_i32_le(&src[0..4]);
        if declared < FRAME_OVERHEAD as i32 {
            return Err(RconError::Protocol("declared frame size below minimum"));
        }
        let size = declared as usize;
        if size > MAX_FRAME_SIZE {
            return Err(RconError::Protocol("declared frame size exceeds limit"));
        }

        let total = 4 + size;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let frame = src.split_to(total);
        let request_id = read_i32_le(&frame[4..8]);
        let kind = PacketKind::try_from(read_i32_le(&frame[8..12]))?;

        let body_end = total - 2;
        if frame[body_end] != 0 || frame[body_end + 1] != 0 {
            return Err(RconError::Protocol("missing frame terminators"));
        }

        let body = std::str::from_utf8(&frame[12..body_end])
            .map_err(|_| RconError::Protocol("body is not valid UTF-8"))?
            .to_string();

        Ok(Some(Packet::from_wire(request_id, kind, body)))
    }
}

impl Encoder<Packet> for RconCodec {
    type Error = RconError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), RconError> {
        let size = item.wire_size();
        dst.reserve(4 + size);
        dst.put_i32_le(size as i32);
        dst.put_i32_le(item.request_id());
        dst.put_i32_le(item.kind() as i32);
        dst.put_slice(item.body().as_bytes());
        dst.put_u8(0);
        dst.put_u8(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::MAX_BODY_SIZE;

    fn encode(packet: &Packet) -> BytesMut {
        let mut buf = BytesMut::new();
        RconCodec::new().encode(packet.clone(), &mut buf).unwrap();
        buf
    }

    #[test]
    fn roundtrip() {
        let cases = [
            Packet::login(7, "hunter2").unwrap(),
            Packet::command(42, "list").unwrap(),
            Packet::new(0, PacketKind::Response, "").unwrap(),
            Packet::new(-1, PacketKind::Command, "").unwrap(),
        ];
        for packet in cases {
            let mut buf = encode(&packet);
            let decoded = RconCodec::new().decode(&mut buf).unwrap().unwrap();
            assert_eq!(decoded, packet);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn streaming_decode_one_byte_at_a_time() {
        let packet = Packet::command(3, "say hello").unwrap();
        let wire = encode(&packet);

        let mut codec = RconCodec::new();
        let mut buf = BytesMut::new();
        for (i, byte) in wire.iter().enumerate() {
            buf.put_u8(*byte);
            let result = codec.decode(&mut buf).unwrap();
            if i + 1 < wire.len() {
                assert!(result.is_none(), "decoded early at byte {i}");
            } else {
                assert_eq!(result.unwrap(), packet);
            }
        }
    }

    #[test]
    fn two_frames_in_one_buffer() {
        let a = Packet::command(1, "list").unwrap();
        let b = Packet::command(2, "seed").unwrap();
        let mut buf = encode(&a);
        buf.extend_from_slice(&encode(&b));

        let mut codec = RconCodec::new();
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), a);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), b);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn negative_size_rejected() {
        let mut buf = BytesMut::new();
        buf.put_i32_le(-4);
        buf.put_slice(&[0u8; 16]);
        assert!(matches!(
            RconCodec::new().decode(&mut buf),
            Err(RconError::Protocol(_))
        ));
    }

    #[test]
    fn implausible_size_rejected() {
        let mut buf = BytesMut::new();
        buf.put_i32_le((MAX_FRAME_SIZE + 1) as i32);
        buf.put_slice(&[0u8; 32]);
        assert!(matches!(
            RconCodec::new().decode(&mut buf),
            Err(RconError::Protocol(_))
        ));
    }

    #[test]
    fn bad_terminators_rejected() {
        let packet = Packet::command(5, "list").unwrap();
        let mut buf = encode(&packet);
        let last = buf.len() - 1;
        buf[last] = 0xFF;
        assert!(matches!(
            RconCodec::new().decode(&mut buf),
            Err(RconError::Protocol(_))
        ));
    }

    #[test]
    fn unknown_kind_rejected() {
        let mut buf = BytesMut::new();
        buf.put_i32_le(FRAME_OVERHEAD as i32);
        buf.put_i32_le(1);
        buf.put_i32_le(9); // no such kind
        buf.put_u8(0);
        buf.put_u8(0);
        assert!(matches!(
            RconCodec::new().decode(&mut buf),
            Err(RconError::UnknownPacketKind(9))
        ));
    }

    #[test]
    fn max_body_accepted() {
        let body = "a".repeat(MAX_BODY_SIZE);
        let packet = Packet::command(1, &body).unwrap();
        let mut buf = encode(&packet);
        let decoded = RconCodec::new().decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.body().len(), MAX_BODY_SIZE);
    }
}
