//! Two-player link-cable netplay over TCP.
//!
//! linkwire connects two emulator instances over a framed TCP link,
//! validates that both sides run the same game image, tracks link
//! latency with a heartbeat, and swaps one serial byte at a time the
//! way the original cable hardware did.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP listener and stream plumbing
//! - [`frame`] — Type-tagged, length-prefixed wire framing
//! - [`session`] — Host/join lifecycle, handshake, heartbeat, and the
//!   serial-exchange bridge

/// Re-export transport types.
pub mod transport {
    pub use linkwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use linkwire_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use linkwire_session::*;
}
