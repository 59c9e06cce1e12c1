//! Heartbeat latency tracking.
//!
//! Once connected, a ping goes out on a wall-clock interval; the peer
//! echoes a pong and the elapsed time becomes the latency estimate.
//! The heartbeat is purely informational: it never tears down the
//! connection on its own.

use std::time::{Duration, Instant};

/// Wall-clock interval between pings (not tied to emulated frame timing).
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

/// Schedules outgoing pings and turns pongs into a latency estimate.
///
/// Driven by the session loop: [`poll_send`](Self::poll_send) answers
/// "is a ping due right now", [`on_pong`](Self::on_pong) consumes a
/// reply. The monitor captures the session generation at start so a
/// tick scheduled for a dead session can never act on a fresh one.
#[derive(Debug)]
pub struct HeartbeatMonitor {
    interval: Duration,
    generation: u64,
    next_ping_at: Option<Instant>,
    outstanding: Option<Instant>,
}

impl HeartbeatMonitor {
    pub fn new() -> Self {
        Self::with_interval(HEARTBEAT_INTERVAL)
    }

    /// Monitor with a custom interval (tests use short ones).
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            next_ping_at: None,
            outstanding: None,
        }
    }

    /// Begin heartbeating for the given session generation.
    ///
    /// The first ping is due immediately so the UI gets a latency
    /// reading as soon as the link comes up.
    pub fn start(&mut self, generation: u64, now: Instant) {
        self.generation = generation;
        self.next_ping_at = Some(now);
        self.outstanding = None;
    }

    /// Stop heartbeating and clear any pending measurement.
    pub fn stop(&mut self) {
        self.next_ping_at = None;
        self.outstanding = None;
    }

    /// True if a ping should be sent now.
    ///
    /// Records the send instant and schedules the next tick. An
    /// unanswered previous ping is simply superseded — its timestamp is
    /// overwritten and its pong, if it ever arrives, measures against
    /// the newer send.
    pub fn poll_send(&mut self, now: Instant, current_generation: u64) -> bool {
        if self.generation != current_generation {
            return false;
        }
        match self.next_ping_at {
            Some(due) if now >= due => {
                self.outstanding = Some(now);
                self.next_ping_at = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    /// Consume a pong: returns the measured latency in milliseconds,
    /// or `None` for a stray pong with no outstanding ping (ignored,
    /// not an error).
    pub fn on_pong(&mut self, now: Instant) -> Option<u32> {
        let sent = self.outstanding.take()?;
        let elapsed = now.saturating_duration_since(sent);
        Some(elapsed.as_millis().min(u128::from(u32::MAX)) as u32)
    }
}

impl Default for HeartbeatMonitor {
    fn default() -> Self {
        Self::new()
    }
}
