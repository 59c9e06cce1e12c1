use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};

use crate::error::Result;

/// A connected link stream — implements Read + Write.
///
/// Wraps a TCP stream with the knobs the session driver needs:
/// cloning for split read/write, nodelay, and non-blocking mode for
/// the driver's poll loop.
pub struct LinkStream {
    inner: TcpStream,
    peer_addr: SocketAddr,
}

impl LinkStream {
    pub(crate) fn from_tcp(inner: TcpStream, peer_addr: SocketAddr) -> Self {
        Self { inner, peer_addr }
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Toggle non-blocking mode.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.inner.set_nonblocking(nonblocking).map_err(Into::into)
    }

    /// Disable Nagle's algorithm. Serial exchanges are single bytes;
    /// coalescing them adds a full round trip of latency per transfer.
    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        self.inner.set_nodelay(nodelay).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self {
            inner: cloned,
            peer_addr: self.peer_addr,
        })
    }

    /// Shut down both directions of the stream.
    pub fn shutdown(&self) {
        let _ = self.inner.shutdown(std::net::Shutdown::Both);
    }
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStream")
            .field("peer", &self.peer_addr)
            .finish()
    }
}
