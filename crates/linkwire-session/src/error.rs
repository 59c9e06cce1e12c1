/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error (bind, connect, accept, stream I/O).
    #[error("transport error: {0}")]
    Transport(#[from] linkwire_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] linkwire_frame::FrameError),

    /// The peer failed handshake validation.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The operation requires a connected session.
    #[error("not connected to a peer")]
    NotConnected,

    /// A serial exchange is already in flight; the link carries one
    /// byte-for-byte swap at a time.
    #[error("serial exchange already in flight")]
    ExchangePending,

    /// The session driver is no longer running.
    #[error("session closed")]
    Closed,

    /// The session driver thread could not be started.
    #[error("failed to spawn session driver: {0}")]
    Spawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
