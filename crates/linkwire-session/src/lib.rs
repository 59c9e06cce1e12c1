//! Link-cable session management.
//!
//! This is the protocol core: a [`LinkSession`] hosts or joins a
//! two-player link over TCP, validates the peer's protocol version and
//! game-image hash, tracks latency with a heartbeat, and bridges single
//! serial bytes between the network and an emulation core's per-frame
//! polling.
//!
//! All socket and timer work runs on one driver thread that exclusively
//! owns the session state; the public handle talks to it over a command
//! channel and observes it through immutable [`SessionSnapshot`]s.

pub mod error;
pub mod event;
pub mod guard;
pub mod handshake;
pub mod hash;
pub mod heartbeat;
pub mod session;
pub mod sio;

pub use error::{Result, SessionError};
pub use event::{SessionSnapshot, SessionState};
pub use guard::HostTimeoutGuard;
pub use handshake::{HandshakeInfo, PROTOCOL_VERSION};
pub use hash::{hash_bytes, hash_file, hash_reader};
pub use heartbeat::{HeartbeatMonitor, HEARTBEAT_INTERVAL};
pub use session::{LinkSession, DEFAULT_HOST_TIMEOUT, DEFAULT_PORT};
pub use sio::SioExchange;
