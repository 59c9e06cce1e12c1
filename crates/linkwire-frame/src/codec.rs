use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: type (1) + length (2, big-endian) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Hard maximum payload size — the width of the length field.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Sanity cap for real protocol traffic. The largest defined payload is
/// the 5-byte handshake; anything declaring more than this is a
/// malformed or hostile peer.
pub const MAX_PROTOCOL_PAYLOAD: usize = 16;

/// The six link-cable protocol message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    /// Joiner → host: protocol version + game-image hash.
    Handshake = 0x01,
    /// Host → joiner: handshake accepted, echoes version + hash.
    HandshakeAck = 0x02,
    /// One serial byte of the alternating exchange.
    SioData = 0x03,
    /// Heartbeat request (empty payload).
    Ping = 0x04,
    /// Heartbeat reply (empty payload).
    Pong = 0x05,
    /// Orderly teardown notice (empty payload).
    Disconnect = 0x06,
}

impl FrameKind {
    /// Decode a wire type byte.
    pub fn from_wire(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(Self::Handshake),
            0x02 => Ok(Self::HandshakeAck),
            0x03 => Ok(Self::SioData),
            0x04 => Ok(Self::Ping),
            0x05 => Ok(Self::Pong),
            0x06 => Ok(Self::Disconnect),
            other => Err(FrameError::UnknownKind(other)),
        }
    }
}

/// A single protocol message.
///
/// Frames are transient: constructed, serialized, and discarded per
/// message.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The message type.
    pub kind: FrameKind,
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(kind: FrameKind, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// A serial data frame carrying one exchanged byte.
    pub fn sio_data(byte: u8) -> Self {
        Self::new(FrameKind::SioData, vec![byte])
    }

    /// An empty-payload heartbeat request.
    pub fn ping() -> Self {
        Self::new(FrameKind::Ping, Bytes::new())
    }

    /// An empty-payload heartbeat reply.
    pub fn pong() -> Self {
        Self::new(FrameKind::Pong, Bytes::new())
    }

    /// An empty-payload teardown notice.
    pub fn disconnect() -> Self {
        Self::new(FrameKind::Disconnect, Bytes::new())
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────┬───────────────┬─────────────────┐
/// │ Type (1B) │ Length (2B BE)│ Payload          │
/// └───────────┴───────────────┴─────────────────┘
/// ```
pub fn encode_frame(kind: FrameKind, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u8(kind as u8);
    dst.put_u16(payload.len() as u16);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` until the buffer holds the full `3 + length`
/// bytes of the next frame. On success, consumes exactly that many
/// bytes, so concatenated frames decode one after another.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let kind = FrameKind::from_wire(src[0])?;
    let payload_len = u16::from_be_bytes([src[1], src[2]]) as usize;

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame { kind, payload }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: the full u16 range.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
        }
    }
}

impl FrameConfig {
    /// Config with the tight sanity cap used for live protocol traffic.
    pub fn protocol() -> Self {
        Self {
            max_payload_size: MAX_PROTOCOL_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [FrameKind; 6] = [
        FrameKind::Handshake,
        FrameKind::HandshakeAck,
        FrameKind::SioData,
        FrameKind::Ping,
        FrameKind::Pong,
        FrameKind::Disconnect,
    ];

    #[test]
    fn encode_decode_roundtrip_all_kinds() {
        for kind in ALL_KINDS {
            let mut buf = BytesMut::new();
            let payload = b"\x01\xDE\xAD\xBE\xEF";

            encode_frame(kind, payload, &mut buf).unwrap();
            assert_eq!(buf.len(), HEADER_SIZE + payload.len());

            let frame = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
            assert_eq!(frame.kind, kind);
            assert_eq!(frame.payload.as_ref(), payload);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn roundtrip_max_length_payload() {
        let payload = vec![0x5A; MAX_PAYLOAD];
        let mut buf = BytesMut::new();
        encode_frame(FrameKind::SioData, &payload, &mut buf).unwrap();

        let frame = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(frame.payload.len(), MAX_PAYLOAD);
        assert_eq!(frame.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn wire_layout_is_type_then_be_length() {
        let mut buf = BytesMut::new();
        encode_frame(FrameKind::SioData, &[0x42], &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0x03, 0x00, 0x01, 0x42]);
    }

    #[test]
    fn decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x04, 0x00][..]);
        let result = decode_frame(&mut buf, MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 2, "incomplete header must not be consumed");
    }

    #[test]
    fn decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(FrameKind::Handshake, b"\x01\x00\x00\x00\x01", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        let result = decode_frame(&mut buf, MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn byte_at_a_time_never_yields_early() {
        let mut wire = BytesMut::new();
        encode_frame(FrameKind::Handshake, b"\x01\xAA\xBB\xCC\xDD", &mut wire).unwrap();
        let wire = wire.freeze();

        let mut buf = BytesMut::new();
        for (i, byte) in wire.iter().enumerate() {
            buf.put_u8(*byte);
            let decoded = decode_frame(&mut buf, MAX_PAYLOAD).unwrap();
            if i + 1 < wire.len() {
                assert!(decoded.is_none(), "no frame until all {} bytes", wire.len());
            } else {
                let frame = decoded.expect("final byte completes the frame");
                assert_eq!(frame.kind, FrameKind::Handshake);
                assert_eq!(frame.payload.as_ref(), b"\x01\xAA\xBB\xCC\xDD");
            }
        }
    }

    #[test]
    fn decode_unknown_kind() {
        let mut buf = BytesMut::from(&[0x7F, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::UnknownKind(0x7F))));
    }

    #[test]
    fn decode_rejects_length_over_cap() {
        let mut buf = BytesMut::new();
        buf.put_u8(FrameKind::Ping as u8);
        buf.put_u16(1024);

        let result = decode_frame(&mut buf, MAX_PROTOCOL_PAYLOAD);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn multiple_concatenated_frames() {
        let mut buf = BytesMut::new();
        encode_frame(FrameKind::SioData, &[0x11], &mut buf).unwrap();
        encode_frame(FrameKind::Ping, b"", &mut buf).unwrap();
        encode_frame(FrameKind::SioData, &[0x22], &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(f1.kind, FrameKind::SioData);
        assert_eq!(f1.payload.as_ref(), &[0x11]);

        let f2 = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(f2.kind, FrameKind::Ping);
        assert!(f2.payload.is_empty());

        let f3 = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(f3.kind, FrameKind::SioData);
        assert_eq!(f3.payload.as_ref(), &[0x22]);

        assert!(buf.is_empty());
    }

    #[test]
    fn empty_payload_frames() {
        for frame in [Frame::ping(), Frame::pong(), Frame::disconnect()] {
            let mut buf = BytesMut::new();
            encode_frame(frame.kind, frame.payload.as_ref(), &mut buf).unwrap();
            let decoded = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
            assert_eq!(decoded.kind, frame.kind);
            assert!(decoded.payload.is_empty());
        }
    }

    #[test]
    fn frame_wire_size() {
        let frame = Frame::sio_data(0x42);
        assert_eq!(frame.wire_size(), HEADER_SIZE + 1);
        assert_eq!(Frame::ping().wire_size(), HEADER_SIZE);
    }
}
