//! Binary framing for the link-cable wire protocol.
//!
//! Every message on the wire is framed as:
//! - A 1-byte frame type
//! - A 2-byte big-endian payload length
//! - The payload bytes
//!
//! No partial reads, no buffer management in user code. All real
//! protocol payloads are tiny (≤ 5 bytes); the length field's u16 width
//! is the hard upper bound.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, FrameKind, HEADER_SIZE, MAX_PAYLOAD,
    MAX_PROTOCOL_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
