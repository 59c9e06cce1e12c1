//! Serial I/O exchange bridge.
//!
//! The emulated link cable is a strict alternating-turn medium: each
//! transfer is a simultaneous one-byte-for-one-byte swap, and only one
//! exchange may be outstanding at a time. The bridge holds at most one
//! outgoing byte awaiting its reply and at most one incoming byte
//! awaiting consumption by the emulation core.
//!
//! The emulation core polls these slots every frame from its own
//! thread, so they live in lock-free atomics shared between the public
//! session handle and the driver thread.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Sentinel for "no incoming byte buffered".
const EMPTY: u32 = u32::MAX;

/// Shared one-byte exchange state between the emulation-facing handle
/// and the session driver.
#[derive(Debug)]
pub struct SioExchange {
    /// An outgoing byte has been sent and its reply has not arrived.
    awaiting_reply: AtomicBool,
    /// Incoming byte slot; `EMPTY` when nothing is buffered.
    incoming: AtomicU32,
    /// Mirror of "session is connected" for cheap per-frame checks.
    connected: AtomicBool,
}

impl SioExchange {
    pub fn new() -> Self {
        Self {
            awaiting_reply: AtomicBool::new(false),
            incoming: AtomicU32::new(EMPTY),
            connected: AtomicBool::new(false),
        }
    }

    /// Claim the single outstanding-exchange slot.
    ///
    /// Returns false if an exchange is already in flight; the caller
    /// must not send another byte until the reply clears the slot.
    pub fn try_begin_exchange(&self) -> bool {
        !self.awaiting_reply.swap(true, Ordering::AcqRel)
    }

    /// Release the slot without a reply (send failed before reaching
    /// the wire).
    pub fn abort_exchange(&self) {
        self.awaiting_reply.store(false, Ordering::Release);
    }

    /// Record the peer's serial byte.
    ///
    /// The peer's byte both fills the incoming slot and satisfies the
    /// outstanding exchange, if one was in flight.
    pub fn complete_exchange(&self, byte: u8) {
        self.incoming.store(u32::from(byte), Ordering::Release);
        self.awaiting_reply.store(false, Ordering::Release);
    }

    /// Whether an exchange is currently awaiting its reply.
    pub fn awaiting_reply(&self) -> bool {
        self.awaiting_reply.load(Ordering::Acquire)
    }

    /// Non-blocking: is a byte from the peer buffered?
    pub fn has_incoming(&self) -> bool {
        self.incoming.load(Ordering::Acquire) != EMPTY
    }

    /// Take the buffered incoming byte, if any. Each buffered byte is
    /// returned exactly once.
    pub fn consume_incoming(&self) -> Option<u8> {
        let value = self.incoming.swap(EMPTY, Ordering::AcqRel);
        if value == EMPTY {
            None
        } else {
            Some(value as u8)
        }
    }

    /// Mark the link up or down for the fast-path connected check.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    /// Whether the link is currently connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Clear all exchange state on teardown.
    pub fn reset(&self) {
        self.connected.store(false, Ordering::Release);
        self.awaiting_reply.store(false, Ordering::Release);
        self.incoming.store(EMPTY, Ordering::Release);
    }
}

impl Default for SioExchange {
    fn default() -> Self {
        Self::new()
    }
}
