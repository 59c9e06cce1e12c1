//! Host timeout guard.
//!
//! Hosting without a peer cannot wait forever: the guard is armed the
//! moment the listening socket binds and cancelled synchronously when a
//! peer is accepted. If it fires first, the session ends with a timeout
//! error and the listener closes.

use std::time::{Duration, Instant};

/// One-shot deadline for an unanswered hosting session.
///
/// Each arming captures the session generation; a deadline only fires
/// while that generation is still current. This replaces ad hoc "are we
/// still hosting" booleans: any later `host()`, `join()`, or
/// `disconnect()` bumps the generation and the stale deadline becomes
/// inert.
#[derive(Debug, Default)]
pub struct HostTimeoutGuard {
    armed: Option<Armed>,
}

#[derive(Debug)]
struct Armed {
    deadline: Instant,
    generation: u64,
}

impl HostTimeoutGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the guard for the given session generation.
    ///
    /// `None` means an infinite window: the guard stays disarmed.
    pub fn arm(&mut self, generation: u64, now: Instant, timeout: Option<Duration>) {
        self.armed = timeout.map(|t| Armed {
            deadline: now + t,
            generation,
        });
    }

    /// Cancel any pending deadline.
    pub fn cancel(&mut self) {
        self.armed = None;
    }

    /// True exactly once when the deadline has passed and the armed
    /// generation is still the current one. Firing disarms the guard.
    pub fn fired(&mut self, now: Instant, current_generation: u64) -> bool {
        match &self.armed {
            Some(armed) if armed.generation != current_generation => {
                // Stale deadline from a previous session; drop it.
                self.armed = None;
                false
            }
            Some(armed) if now >= armed.deadline => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }

    /// Whether a deadline is currently pending.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}
