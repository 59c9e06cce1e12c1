//! Session driver thread and the public [`LinkSession`] handle.
//!
//! One thread owns all sockets, timers, and the mutable session value.
//! It loops over three sources of work: commands from the handle,
//! frames from the peer, and deadlines (heartbeat, handshake, host
//! timeout). The handle never touches a socket; it sends commands over
//! an mpsc channel and shares the serial-exchange slots with the driver
//! through lock-free atomics so the emulation thread can poll them
//! every frame without blocking.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use linkwire_frame::{Frame, FrameConfig, FrameError, FrameKind, FrameReader, FrameWriter};
use linkwire_transport::{connect, local_addresses, LinkStream, TcpEndpoint};
use tracing::{debug, info, trace, warn};

use crate::error::{Result, SessionError};
use crate::event::{SessionSnapshot, SessionState};
use crate::guard::HostTimeoutGuard;
use crate::handshake;
use crate::heartbeat::HeartbeatMonitor;
use crate::sio::SioExchange;

/// Default TCP port for link sessions.
pub const DEFAULT_PORT: u16 = 7269;

/// Default time a host waits for a joiner before giving up.
pub const DEFAULT_HOST_TIMEOUT: Duration = Duration::from_secs(300);

/// Time allowed for an outbound connect to complete.
const JOIN_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed between socket establishment and a completed handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Driver loop sleep between polls when no work is pending.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// How long the handle waits for the driver to answer a host or join
/// request before declaring the session dead.
const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Requests sent from the handle to the driver thread.
enum Command {
    Host {
        game_hash: u32,
        port: u16,
        timeout: Option<Duration>,
        reply: Sender<Result<String>>,
    },
    Join {
        host: String,
        port: u16,
        game_hash: u32,
        reply: Sender<Result<()>>,
    },
    SendSerial(u8),
    Disconnect,
    Shutdown,
}

/// A framed duplex socket to the peer.
struct Connection {
    reader: FrameReader<LinkStream>,
    writer: FrameWriter<LinkStream>,
    /// Extra clone kept solely so teardown can shut the socket down
    /// without going through the reader or writer.
    control: LinkStream,
    established_at: Instant,
}

impl Connection {
    fn open(stream: LinkStream, now: Instant) -> Result<Self> {
        stream.set_nodelay(true)?;
        stream.set_nonblocking(true)?;
        let reader_half = stream.try_clone()?;
        let control = stream.try_clone()?;
        Ok(Self {
            reader: FrameReader::with_config(reader_half, FrameConfig::protocol()),
            writer: FrameWriter::with_config(stream, FrameConfig::protocol()),
            control,
            established_at: now,
        })
    }
}

/// Mutable session state, owned exclusively by the driver thread.
struct Session {
    state: SessionState,
    peer_address: Option<String>,
    room_code: Option<String>,
    game_hash: u32,
    latency_ms: Option<u32>,
    last_error: Option<String>,
    /// Bumped on every teardown so deadlines armed for a previous
    /// connection can never fire into a new one.
    generation: u64,
}

impl Session {
    fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            peer_address: None,
            room_code: None,
            game_hash: 0,
            latency_ms: None,
            last_error: None,
            generation: 0,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            peer_address: self.peer_address.clone(),
            room_code: self.room_code.clone(),
            latency_ms: self.latency_ms,
            last_error: self.last_error.clone(),
        }
    }
}

struct SessionDriver {
    session: Session,
    listener: Option<TcpEndpoint>,
    conn: Option<Connection>,
    guard: HostTimeoutGuard,
    heartbeat: HeartbeatMonitor,
    handshake_timeout: Duration,
    sio: Arc<SioExchange>,
    cmd_rx: Receiver<Command>,
    event_tx: Sender<SessionSnapshot>,
}

impl SessionDriver {
    fn new(
        cmd_rx: Receiver<Command>,
        event_tx: Sender<SessionSnapshot>,
        sio: Arc<SioExchange>,
        handshake_timeout: Duration,
    ) -> Self {
        Self {
            session: Session::new(),
            listener: None,
            conn: None,
            guard: HostTimeoutGuard::new(),
            heartbeat: HeartbeatMonitor::new(),
            handshake_timeout,
            sio,
            cmd_rx,
            event_tx,
        }
    }

    fn run(mut self) {
        loop {
            loop {
                match self.cmd_rx.try_recv() {
                    Ok(Command::Shutdown) | Err(TryRecvError::Disconnected) => {
                        self.disconnect(None);
                        return;
                    }
                    Ok(cmd) => self.handle_command(cmd),
                    Err(TryRecvError::Empty) => break,
                }
            }

            let now = Instant::now();
            self.poll_accept(now);
            self.poll_frames(now);
            self.poll_timers(now);
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Host {
                game_hash,
                port,
                timeout,
                reply,
            } => {
                let result = self.start_host(game_hash, port, timeout);
                if let Err(err) = &result {
                    self.session.last_error = Some(err.to_string());
                    self.emit();
                }
                let _ = reply.send(result);
            }
            Command::Join {
                host,
                port,
                game_hash,
                reply,
            } => {
                let result = self.start_join(&host, port, game_hash);
                if let Err(err) = &result {
                    self.session.last_error = Some(err.to_string());
                    self.emit();
                }
                let _ = reply.send(result);
            }
            Command::SendSerial(byte) => {
                if self.session.state == SessionState::Connected {
                    trace!(byte, "sending serial byte");
                    let send = self
                        .conn
                        .as_mut()
                        .map(|conn| conn.writer.write_frame(&Frame::sio_data(byte)));
                    if let Some(Err(err)) = send {
                        self.disconnect(Some(format!("connection lost: {err}")));
                    }
                } else {
                    // The link went down between the handle's check and
                    // this command; the exchange can never complete.
                    self.sio.abort_exchange();
                }
            }
            Command::Disconnect => self.disconnect(None),
            // Intercepted by the run loop before dispatch.
            Command::Shutdown => {}
        }
    }

    fn start_host(&mut self, game_hash: u32, port: u16, timeout: Option<Duration>) -> Result<String> {
        if self.session.state != SessionState::Disconnected {
            self.disconnect(None);
        }
        let endpoint = TcpEndpoint::bind(port)?;
        let room_code = endpoint.port().to_string();
        info!(port = endpoint.port(), "hosting link session");

        self.session.generation += 1;
        self.session.state = SessionState::Hosting;
        self.session.game_hash = game_hash;
        self.session.room_code = Some(room_code.clone());
        self.session.peer_address = None;
        self.session.latency_ms = None;
        self.session.last_error = None;
        self.guard.arm(self.session.generation, Instant::now(), timeout);
        self.listener = Some(endpoint);
        self.emit();
        Ok(room_code)
    }

    fn start_join(&mut self, host: &str, port: u16, game_hash: u32) -> Result<()> {
        if self.session.state != SessionState::Disconnected {
            self.disconnect(None);
        }
        let stream = connect(host, port, JOIN_CONNECT_TIMEOUT)?;
        let peer = stream.peer_addr().to_string();
        let now = Instant::now();
        let mut conn = Connection::open(stream, now)?;
        conn.writer
            .send(FrameKind::Handshake, &handshake::encode_payload(game_hash))?;
        info!(peer = %peer, "joined, awaiting handshake ack");

        self.session.generation += 1;
        self.session.state = SessionState::Joining;
        self.session.game_hash = game_hash;
        self.session.peer_address = Some(peer);
        self.session.room_code = None;
        self.session.latency_ms = None;
        self.session.last_error = None;
        self.conn = Some(conn);
        self.emit();
        Ok(())
    }

    fn poll_accept(&mut self, now: Instant) {
        if self.session.state != SessionState::Hosting {
            return;
        }
        let Some(listener) = self.listener.as_ref() else {
            return;
        };
        let accepted = match listener.accept_pending() {
            Ok(Some(stream)) => stream,
            Ok(None) => return,
            Err(err) => {
                self.disconnect(Some(format!("accept failed: {err}")));
                return;
            }
        };

        // A peer arrived; the no-joiner timeout no longer applies.
        self.guard.cancel();
        let peer = accepted.peer_addr().to_string();
        match Connection::open(accepted, now) {
            Ok(conn) => {
                info!(peer = %peer, "peer connected, awaiting handshake");
                self.listener = None;
                self.conn = Some(conn);
                self.session.peer_address = Some(peer);
                self.emit();
            }
            Err(err) => self.disconnect(Some(format!("connection lost: {err}"))),
        }
    }

    fn poll_frames(&mut self, now: Instant) {
        while self.conn.is_some() {
            let polled = self
                .conn
                .as_mut()
                .map(|conn| conn.reader.poll_frame())
                .unwrap_or(Ok(None));
            match polled {
                Ok(Some(frame)) => self.handle_frame(frame, now),
                Ok(None) => break,
                Err(FrameError::ConnectionClosed) => {
                    self.disconnect(Some("peer disconnected".into()));
                }
                Err(err @ (FrameError::UnknownKind(_) | FrameError::PayloadTooLarge { .. })) => {
                    self.disconnect(Some(format!("protocol violation: {err}")));
                }
                Err(err) => {
                    self.disconnect(Some(format!("connection lost: {err}")));
                }
            }
        }
    }

    fn handle_frame(&mut self, frame: Frame, now: Instant) {
        match frame.kind {
            FrameKind::Handshake => {
                if self.session.state != SessionState::Hosting || self.conn.is_none() {
                    self.disconnect(Some("protocol violation: unexpected handshake".into()));
                    return;
                }
                match handshake::validate(&frame.payload, self.session.game_hash) {
                    Ok(info) => {
                        debug!(version = info.version, "handshake accepted");
                        let ack = handshake::encode_payload(self.session.game_hash);
                        let sent = self
                            .conn
                            .as_mut()
                            .map(|conn| conn.writer.send(FrameKind::HandshakeAck, &ack));
                        match sent {
                            Some(Ok(())) => self.enter_connected(now),
                            Some(Err(err)) => {
                                self.disconnect(Some(format!("connection lost: {err}")));
                            }
                            None => {}
                        }
                    }
                    Err(err) => self.disconnect(Some(err.to_string())),
                }
            }
            FrameKind::HandshakeAck => {
                if self.session.state != SessionState::Joining {
                    self.disconnect(Some("protocol violation: unexpected handshake ack".into()));
                    return;
                }
                match handshake::validate(&frame.payload, self.session.game_hash) {
                    Ok(info) => {
                        debug!(version = info.version, "handshake acknowledged");
                        self.enter_connected(now);
                    }
                    Err(err) => self.disconnect(Some(err.to_string())),
                }
            }
            FrameKind::SioData => {
                if self.session.state != SessionState::Connected {
                    self.disconnect(Some("protocol violation: serial data before handshake".into()));
                    return;
                }
                match frame.payload.first() {
                    Some(&byte) => {
                        trace!(byte, "received serial byte");
                        self.sio.complete_exchange(byte);
                    }
                    None => {
                        self.disconnect(Some("protocol violation: empty serial frame".into()));
                    }
                }
            }
            FrameKind::Ping => {
                if self.session.state != SessionState::Connected {
                    trace!("ignoring ping before handshake");
                    return;
                }
                let sent = self
                    .conn
                    .as_mut()
                    .map(|conn| conn.writer.write_frame(&Frame::pong()));
                if let Some(Err(err)) = sent {
                    self.disconnect(Some(format!("connection lost: {err}")));
                }
            }
            FrameKind::Pong => {
                if self.session.state != SessionState::Connected {
                    trace!("ignoring pong before handshake");
                    return;
                }
                if let Some(ms) = self.heartbeat.on_pong(now) {
                    trace!(latency_ms = ms, "latency sample");
                    if self.session.latency_ms != Some(ms) {
                        self.session.latency_ms = Some(ms);
                        self.emit();
                    }
                }
            }
            FrameKind::Disconnect => {
                self.disconnect(Some("peer disconnected".into()));
            }
        }
    }

    fn enter_connected(&mut self, now: Instant) {
        self.session.state = SessionState::Connected;
        self.heartbeat.start(self.session.generation, now);
        self.sio.set_connected(true);
        info!(peer = ?self.session.peer_address, "link established");
        self.emit();
    }

    fn poll_timers(&mut self, now: Instant) {
        if self.guard.fired(now, self.session.generation) {
            if self.session.state == SessionState::Hosting {
                warn!("host timeout expired with no joiner");
                self.disconnect(Some("no one joined before the timeout".into()));
            }
            return;
        }

        let handshake_pending = matches!(self.session.state, SessionState::Hosting | SessionState::Joining);
        if handshake_pending {
            let overdue = self
                .conn
                .as_ref()
                .map(|conn| now >= conn.established_at + self.handshake_timeout)
                .unwrap_or(false);
            if overdue {
                self.disconnect(Some("handshake timed out".into()));
                return;
            }
        }

        if self.heartbeat.poll_send(now, self.session.generation) {
            let sent = self
                .conn
                .as_mut()
                .map(|conn| conn.writer.write_frame(&Frame::ping()));
            if let Some(Err(err)) = sent {
                self.disconnect(Some(format!("connection lost: {err}")));
            }
        }
    }

    /// Tear down the socket, listener, and timers, then notify
    /// observers. A second call against an already torn-down session
    /// does nothing and emits nothing.
    fn disconnect(&mut self, error: Option<String>) {
        let active = self.session.state != SessionState::Disconnected
            || self.conn.is_some()
            || self.listener.is_some();
        if !active {
            return;
        }

        if let Some(conn) = self.conn.as_mut() {
            if error.is_none() {
                // Clean local teardown; tell the peer before closing.
                let _ = conn.writer.write_frame(&Frame::disconnect());
            }
            conn.control.shutdown();
        }
        self.conn = None;
        self.listener = None;
        self.guard.cancel();
        self.heartbeat.stop();
        self.sio.reset();

        match &error {
            Some(reason) => info!(reason = %reason, "link closed"),
            None => info!("link closed"),
        }

        self.session.generation += 1;
        self.session.state = SessionState::Disconnected;
        self.session.peer_address = None;
        self.session.room_code = None;
        self.session.latency_ms = None;
        self.session.last_error = error;
        self.emit();
    }

    fn emit(&self) {
        let _ = self.event_tx.send(self.session.snapshot());
    }
}

/// Handle to a link session running on its own driver thread.
///
/// Cheap operations the emulation core calls every frame
/// ([`has_incoming`](Self::has_incoming),
/// [`consume_incoming`](Self::consume_incoming),
/// [`send_outgoing`](Self::send_outgoing)) touch only shared atomics;
/// everything else goes through the driver's command channel.
pub struct LinkSession {
    cmd_tx: Sender<Command>,
    sio: Arc<SioExchange>,
    driver: Option<JoinHandle<()>>,
}

impl LinkSession {
    /// Start a driver thread and return the handle plus the snapshot
    /// stream it publishes on every state or latency change.
    pub fn spawn() -> Result<(Self, Receiver<SessionSnapshot>)> {
        Self::spawn_with_handshake_timeout(HANDSHAKE_TIMEOUT)
    }

    /// Tests shorten the handshake deadline so a silent peer is
    /// dropped without waiting out the production window.
    fn spawn_with_handshake_timeout(
        handshake_timeout: Duration,
    ) -> Result<(Self, Receiver<SessionSnapshot>)> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sio = Arc::new(SioExchange::new());
        let driver_sio = Arc::clone(&sio);
        let driver = thread::Builder::new()
            .name("linkwire-session".into())
            .spawn(move || {
                SessionDriver::new(cmd_rx, event_tx, driver_sio, handshake_timeout).run()
            })
            .map_err(SessionError::Spawn)?;
        Ok((
            Self {
                cmd_tx,
                sio,
                driver: Some(driver),
            },
            event_rx,
        ))
    }

    /// Listen for a peer on `port` (0 picks an ephemeral port) and
    /// return the room code, which is the bound port as a string.
    ///
    /// `timeout` bounds how long the host waits for a joiner; `None`
    /// waits forever. An existing session is torn down first.
    pub fn host(&self, game_hash: u32, port: u16, timeout: Option<Duration>) -> Result<String> {
        let (reply, reply_rx) = mpsc::channel();
        self.cmd_tx
            .send(Command::Host {
                game_hash,
                port,
                timeout,
                reply,
            })
            .map_err(|_| SessionError::Closed)?;
        reply_rx.recv_timeout(REPLY_TIMEOUT).map_err(|_| SessionError::Closed)?
    }

    /// Connect to a host and send the opening handshake. Success means
    /// the socket is up and the handshake is in flight; watch the
    /// snapshot stream for the `connected` transition or the rejection.
    pub fn join(&self, host: impl Into<String>, port: u16, game_hash: u32) -> Result<()> {
        let (reply, reply_rx) = mpsc::channel();
        self.cmd_tx
            .send(Command::Join {
                host: host.into(),
                port,
                game_hash,
                reply,
            })
            .map_err(|_| SessionError::Closed)?;
        reply_rx.recv_timeout(REPLY_TIMEOUT).map_err(|_| SessionError::Closed)?
    }

    /// Offer one serial byte to the peer.
    ///
    /// Fails with [`SessionError::ExchangePending`] while a previous
    /// byte is still awaiting its reply, and with
    /// [`SessionError::NotConnected`] before the handshake completes.
    pub fn send_outgoing(&self, byte: u8) -> Result<()> {
        if !self.sio.is_connected() {
            return Err(SessionError::NotConnected);
        }
        if !self.sio.try_begin_exchange() {
            return Err(SessionError::ExchangePending);
        }
        if self.cmd_tx.send(Command::SendSerial(byte)).is_err() {
            self.sio.abort_exchange();
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    /// Whether a byte from the peer is waiting to be consumed.
    pub fn has_incoming(&self) -> bool {
        self.sio.has_incoming()
    }

    /// Take the pending byte from the peer, if any. Each received byte
    /// is observed exactly once.
    pub fn consume_incoming(&self) -> Option<u8> {
        self.sio.consume_incoming()
    }

    /// Tear down any active session. Idempotent; observers see at most
    /// one `disconnected` snapshot per teardown.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(Command::Disconnect);
    }

    /// Addresses a peer on the local network can try, most useful
    /// first.
    pub fn local_addresses() -> Vec<String> {
        local_addresses()
    }
}

impl Drop for LinkSession {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    // Distinct hashes keep parallel tests from ever pairing up.
    static TEST_HASH_SEED: AtomicU32 = AtomicU32::new(0xDEAD_BEEF);

    fn next_test_hash() -> u32 {
        TEST_HASH_SEED.fetch_add(1, Ordering::Relaxed)
    }

    fn wait_for_state(rx: &Receiver<SessionSnapshot>, state: SessionState) -> SessionSnapshot {
        let deadline = Instant::now() + WAIT;
        loop {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .unwrap_or(Duration::ZERO);
            let snapshot = rx
                .recv_timeout(remaining)
                .unwrap_or_else(|_| panic!("timed out waiting for state {state}"));
            if snapshot.state == state {
                return snapshot;
            }
        }
    }

    fn connected_pair(
        game_hash: u32,
    ) -> (
        LinkSession,
        Receiver<SessionSnapshot>,
        LinkSession,
        Receiver<SessionSnapshot>,
    ) {
        let (host, host_rx) = LinkSession::spawn().expect("host session should spawn");
        let room_code = host
            .host(game_hash, 0, None)
            .expect("hosting on an ephemeral port should succeed");
        let port: u16 = room_code.parse().expect("room code should be a port number");

        let (joiner, joiner_rx) = LinkSession::spawn().expect("joiner session should spawn");
        joiner
            .join("127.0.0.1", port, game_hash)
            .expect("joining the local host should succeed");

        wait_for_state(&host_rx, SessionState::Connected);
        wait_for_state(&joiner_rx, SessionState::Connected);
        (host, host_rx, joiner, joiner_rx)
    }

    #[test]
    fn host_reports_room_code_and_listening_state() {
        let (session, rx) = LinkSession::spawn().expect("session should spawn");
        let room_code = session
            .host(next_test_hash(), 0, None)
            .expect("hosting on an ephemeral port should succeed");
        let port: u16 = room_code.parse().expect("room code should be a port number");
        assert_ne!(port, 0, "ephemeral bind should report the real port");

        let snapshot = wait_for_state(&rx, SessionState::Hosting);
        assert_eq!(snapshot.room_code.as_deref(), Some(room_code.as_str()));
        assert!(snapshot.peer_address.is_none());
    }

    #[test]
    fn matching_hashes_reach_connected_on_both_sides() {
        let (_host, host_rx, _joiner, _joiner_rx) = connected_pair(next_test_hash());
        // The heartbeat sends its first ping immediately, so a latency
        // sample shows up shortly after the handshake.
        let deadline = Instant::now() + WAIT;
        let mut latency = None;
        while latency.is_none() && Instant::now() < deadline {
            if let Ok(snapshot) = host_rx.recv_timeout(Duration::from_millis(100)) {
                latency = snapshot.latency_ms;
            }
        }
        assert!(latency.is_some(), "heartbeat should produce a latency sample");
    }

    #[test]
    fn mismatched_hashes_never_connect() {
        let (host, host_rx) = LinkSession::spawn().expect("host session should spawn");
        let room_code = host
            .host(0x1111_1111, 0, None)
            .expect("hosting on an ephemeral port should succeed");
        let port: u16 = room_code.parse().expect("room code should be a port number");

        let (joiner, joiner_rx) = LinkSession::spawn().expect("joiner session should spawn");
        joiner
            .join("127.0.0.1", port, 0x2222_2222)
            .expect("the socket connect itself should succeed");

        let host_down = wait_for_state(&host_rx, SessionState::Disconnected);
        let reason = host_down.last_error.expect("rejection should carry a reason");
        assert!(
            reason.contains("same game"),
            "rejection reason should name the game mismatch, got {reason:?}"
        );

        // The joiner is cut off without ever reaching connected.
        let deadline = Instant::now() + WAIT;
        loop {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .unwrap_or(Duration::ZERO);
            let snapshot = joiner_rx
                .recv_timeout(remaining)
                .expect("joiner should observe the teardown");
            assert_ne!(snapshot.state, SessionState::Connected);
            if snapshot.state == SessionState::Disconnected {
                break;
            }
        }
        assert!(matches!(
            joiner.send_outgoing(0x42),
            Err(SessionError::NotConnected)
        ));
    }

    #[test]
    fn serial_bytes_swap_exactly_once() {
        let (host, _host_rx, joiner, _joiner_rx) = connected_pair(next_test_hash());

        host.send_outgoing(0x42).expect("first exchange should start");
        assert!(
            matches!(host.send_outgoing(0x43), Err(SessionError::ExchangePending)),
            "a second byte must be rejected while the first is in flight"
        );

        let deadline = Instant::now() + WAIT;
        let mut received = None;
        while received.is_none() && Instant::now() < deadline {
            received = joiner.consume_incoming();
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(received, Some(0x42));
        assert_eq!(joiner.consume_incoming(), None, "each byte is consumed once");

        // The peer's answer clears the host's pending exchange.
        joiner.send_outgoing(0x99).expect("reply byte should send");
        let deadline = Instant::now() + WAIT;
        let mut reply = None;
        while reply.is_none() && Instant::now() < deadline {
            reply = host.consume_incoming();
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(reply, Some(0x99));
        host.send_outgoing(0x01)
            .expect("a new exchange should start after the reply arrives");
    }

    #[test]
    fn send_outgoing_requires_a_link() {
        let (session, _rx) = LinkSession::spawn().expect("session should spawn");
        assert!(matches!(
            session.send_outgoing(0x42),
            Err(SessionError::NotConnected)
        ));
    }

    #[test]
    fn join_refused_when_nobody_listens() {
        let (session, _rx) = LinkSession::spawn().expect("session should spawn");
        // Bind and drop to find a port with no listener.
        let port = {
            let endpoint = TcpEndpoint::bind(0).expect("ephemeral bind should succeed");
            endpoint.port()
        };
        let result = session.join("127.0.0.1", port, next_test_hash());
        assert!(matches!(result, Err(SessionError::Transport(_))));
    }

    #[test]
    fn host_timeout_tears_down_and_frees_the_port() {
        let (session, rx) = LinkSession::spawn().expect("session should spawn");
        let room_code = session
            .host(next_test_hash(), 0, Some(Duration::from_millis(100)))
            .expect("hosting on an ephemeral port should succeed");
        let port: u16 = room_code.parse().expect("room code should be a port number");

        let snapshot = wait_for_state(&rx, SessionState::Disconnected);
        let reason = snapshot.last_error.expect("timeout should carry a reason");
        assert!(
            reason.contains("timeout"),
            "teardown reason should mention the timeout, got {reason:?}"
        );

        // The listener is gone, so the same port can be reused.
        let reused = session
            .host(next_test_hash(), port, None)
            .expect("rehosting on the freed port should succeed");
        assert_eq!(reused, room_code);
    }

    #[test]
    fn silent_peer_is_dropped_after_the_handshake_deadline() {
        let (session, rx) = LinkSession::spawn_with_handshake_timeout(Duration::from_millis(200))
            .expect("session should spawn");
        let room_code = session
            .host(next_test_hash(), 0, None)
            .expect("hosting on an ephemeral port should succeed");
        let port: u16 = room_code.parse().expect("room code should be a port number");

        // A peer that connects but never sends its handshake.
        let _silent = std::net::TcpStream::connect(("127.0.0.1", port))
            .expect("raw connect should succeed");

        let snapshot = wait_for_state(&rx, SessionState::Disconnected);
        let reason = snapshot.last_error.expect("teardown should carry a reason");
        assert!(
            reason.contains("handshake timed out"),
            "teardown reason should name the handshake deadline, got {reason:?}"
        );
        assert!(matches!(
            session.send_outgoing(0x42),
            Err(SessionError::NotConnected)
        ));
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (session, rx) = LinkSession::spawn().expect("session should spawn");
        session
            .host(next_test_hash(), 0, None)
            .expect("hosting on an ephemeral port should succeed");
        wait_for_state(&rx, SessionState::Hosting);

        session.disconnect();
        session.disconnect();

        wait_for_state(&rx, SessionState::Disconnected);
        // The second disconnect must not produce a second notification.
        assert!(
            rx.recv_timeout(Duration::from_millis(200)).is_err(),
            "redundant disconnect should emit nothing"
        );
    }

    #[test]
    fn peer_disconnect_is_reported() {
        let (host, host_rx, joiner, joiner_rx) = connected_pair(next_test_hash());
        drop(joiner);
        drop(joiner_rx);

        let snapshot = wait_for_state(&host_rx, SessionState::Disconnected);
        let reason = snapshot.last_error.expect("teardown should carry a reason");
        assert!(
            reason.contains("peer disconnected"),
            "host should learn the peer left, got {reason:?}"
        );
        assert!(matches!(
            host.send_outgoing(0x42),
            Err(SessionError::NotConnected)
        ));
    }
}
