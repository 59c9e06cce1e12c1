//! TCP transport for link-cable sessions.
//!
//! Provides the socket plumbing everything else builds on:
//! - [`TcpEndpoint`] — bind a listener and poll for an inbound peer
//! - [`connect`] — dial a hosting peer with a bounded timeout
//! - [`LinkStream`] — a connected byte stream (Read + Write)
//! - [`local_addresses`] — candidate IPs for the host to display

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::LinkStream;
pub use tcp::{connect, local_addresses, resolve_peer_addr, TcpEndpoint};
