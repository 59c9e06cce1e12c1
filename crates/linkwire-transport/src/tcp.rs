use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::LinkStream;

/// A bound, listening TCP endpoint for a hosting session.
///
/// The listener runs in non-blocking mode so the session driver can
/// interleave accept polling with command handling and timer checks.
pub struct TcpEndpoint {
    listener: TcpListener,
    port: u16,
}

impl TcpEndpoint {
    /// Bind a listener on all interfaces at `port`.
    pub fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .map_err(|e| TransportError::Bind { port, source: e })?;
        listener.set_nonblocking(true)?;

        // Port 0 asks the OS for an ephemeral port; report the real one.
        let port = listener.local_addr()?.port();
        info!(port, "listening for link peer");

        Ok(Self { listener, port })
    }

    /// Poll for an inbound connection without blocking.
    ///
    /// Returns `Ok(None)` when no peer is waiting.
    pub fn accept_pending(&self) -> Result<Option<LinkStream>> {
        match self.listener.accept() {
            Ok((stream, addr)) => {
                debug!(%addr, "accepted link peer");
                stream.set_nonblocking(false)?;
                Ok(Some(LinkStream::from_tcp(stream, addr)))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(TransportError::Accept(e)),
        }
    }

    /// The port this endpoint is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }
}

/// Resolve `host:port` to a connectable socket address.
pub fn resolve_peer_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let endpoint = format!("{host}:{port}");
    if let Ok(addr) = endpoint.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let mut addrs = endpoint
        .to_socket_addrs()
        .map_err(|e| TransportError::Connect {
            addr: endpoint.clone(),
            source: e,
        })?;
    addrs
        .next()
        .ok_or(TransportError::AddrResolution(endpoint))
}

/// Connect to a hosting peer with a bounded timeout.
pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<LinkStream> {
    let addr = resolve_peer_addr(host, port)?;
    let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|e| TransportError::Connect {
        addr: addr.to_string(),
        source: e,
    })?;
    debug!(%addr, "connected to link host");
    Ok(LinkStream::from_tcp(stream, addr))
}

/// Candidate local addresses for the host to display to the joining peer.
///
/// Determines the outbound-route address by "connecting" a UDP socket to a
/// public address; no packet is sent. Loopback is always included last so
/// same-machine testing has something to paste.
pub fn local_addresses() -> Vec<String> {
    let mut addrs = Vec::new();

    if let Ok(socket) = UdpSocket::bind("0.0.0.0:0") {
        if socket.connect("8.8.8.8:80").is_ok() {
            if let Ok(local) = socket.local_addr() {
                if let IpAddr::V4(ip) = local.ip() {
                    if !ip.is_loopback() {
                        addrs.push(ip.to_string());
                    }
                }
            }
        }
    }

    addrs.push(Ipv4Addr::LOCALHOST.to_string());
    addrs
}
