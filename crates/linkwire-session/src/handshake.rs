//! Handshake payload encoding and validation.
//!
//! The joining side sends a `handshake` frame carrying
//! `[version:u8][game_hash:u32 BE]` immediately after the socket opens;
//! the host validates it and echoes the same structure back as
//! `handshakeAck`. This is the only path by which a connection is
//! rejected after the socket succeeds, and it always runs before any
//! serial data — a game-image mismatch would otherwise corrupt gameplay
//! silently.

use crate::error::{Result, SessionError};

/// The protocol version this build speaks.
pub const PROTOCOL_VERSION: u8 = 1;

/// Encoded handshake payload size: version byte + 4-byte hash.
pub const HANDSHAKE_PAYLOAD_LEN: usize = 5;

/// Parsed contents of a handshake or handshakeAck payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeInfo {
    /// Protocol version claimed by the peer.
    pub version: u8,
    /// Game-image hash claimed by the peer.
    pub game_hash: u32,
}

/// Encode the local handshake payload.
pub fn encode_payload(game_hash: u32) -> [u8; HANDSHAKE_PAYLOAD_LEN] {
    let hash = game_hash.to_be_bytes();
    [PROTOCOL_VERSION, hash[0], hash[1], hash[2], hash[3]]
}

/// Parse a handshake payload without judging its contents.
///
/// Trailing bytes beyond the known structure are tolerated for forward
/// compatibility; a short payload is rejected.
pub fn parse_payload(payload: &[u8]) -> Result<HandshakeInfo> {
    if payload.len() < HANDSHAKE_PAYLOAD_LEN {
        return Err(SessionError::HandshakeFailed(format!(
            "handshake payload too short: {} bytes (expected {})",
            payload.len(),
            HANDSHAKE_PAYLOAD_LEN
        )));
    }
    Ok(HandshakeInfo {
        version: payload[0],
        game_hash: u32::from_be_bytes([payload[1], payload[2], payload[3], payload[4]]),
    })
}

/// Validate a peer's handshake payload against the local session.
///
/// The two rejection reasons carry distinct user-facing messages so the
/// UI can tell "upgrade one side" apart from "swap the cartridge".
pub fn validate(payload: &[u8], local_hash: u32) -> Result<HandshakeInfo> {
    let info = parse_payload(payload)?;

    if info.version != PROTOCOL_VERSION {
        return Err(SessionError::HandshakeFailed(format!(
            "incompatible version: peer speaks protocol {} (this build speaks {})",
            info.version, PROTOCOL_VERSION
        )));
    }

    if info.game_hash != local_hash {
        return Err(SessionError::HandshakeFailed(
            "game mismatch: you must both play the same game".to_string(),
        ));
    }

    Ok(info)
}
