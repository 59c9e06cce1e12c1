use serde::Serialize;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Initial and terminal state; no socket, no timers.
    Disconnected,
    /// Listening for an inbound peer; no peer yet.
    Hosting,
    /// Outbound connect in flight, handshake not yet acknowledged.
    Joining,
    /// Handshake complete; heartbeat active, serial exchange allowed.
    Connected,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Hosting => "hosting",
            SessionState::Joining => "joining",
            SessionState::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// Immutable state snapshot delivered to session observers.
///
/// Emitted on every state transition and whenever the measured latency
/// changes. Consumers never see the mutable session value itself.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Current lifecycle state.
    pub state: SessionState,
    /// Address of the connected peer, once a socket is established.
    pub peer_address: Option<String>,
    /// Human-shareable code for the listening port.
    pub room_code: Option<String>,
    /// Last measured ping round trip in milliseconds.
    pub latency_ms: Option<u32>,
    /// Human-readable reason for the last dropped link, if any.
    pub last_error: Option<String>,
}
