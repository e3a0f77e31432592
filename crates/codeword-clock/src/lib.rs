//! Turn deadline timers for Codeword.
//!
//! Every active room has exactly one pending timer: the end of the current
//! turn. [`TurnClock`] owns those timers. Arming a room replaces whatever
//! timer it had before, and a timer that fires reports an [`Expiry`] on
//! the channel returned by [`TurnClock::new`].
//!
//! The clock does not decide whether a turn is actually over. It reports
//! the deadline it was armed with, and the room compares that against its
//! own current deadline. A timer that lost a race with a guess (the turn
//! already switched) carries an old deadline and is ignored there.
//!
//! # Integration
//!
//! The room manager holds the receiving end and feeds each expiry back
//! into the owning room:
//!
//! ```ignore
//! let (clock, mut expiries) = TurnClock::new(ClockConfig::default());
//! tokio::spawn(async move {
//!     while let Some(expiry) = expiries.recv().await {
//!         manager.expire_turn(&expiry.room, ExpirySignal::Clock(expiry.deadline)).await;
//!     }
//! });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use codeword_protocol::{RoomCode, Timestamp};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the turn clock.
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Extra delay added after the deadline before a timer fires, so the
    /// room sees `now >= deadline` even with coarse timer resolution.
    /// Default: 25 ms.
    pub slack: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            slack: Duration::from_millis(25),
        }
    }
}

impl ClockConfig {
    /// Largest slack we accept.
    pub const MAX_SLACK: Duration = Duration::from_secs(1);

    /// Clamp out-of-range values.
    ///
    /// Called automatically by [`TurnClock::new`].
    pub fn validated(mut self) -> Self {
        if self.slack > Self::MAX_SLACK {
            self.slack = Self::MAX_SLACK;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

/// A timer that fired: `room`'s turn ending at `deadline` is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry {
    pub room: RoomCode,
    pub deadline: Timestamp,
}

// ---------------------------------------------------------------------------
// TurnClock
// ---------------------------------------------------------------------------

struct Pending {
    deadline: Timestamp,
    task: AbortHandle,
}

struct Inner {
    config: ClockConfig,
    pending: Mutex<HashMap<RoomCode, Pending>>,
    fired: mpsc::UnboundedSender<Expiry>,
}

impl Inner {
    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<RoomCode, Pending>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One-shot deadline timers keyed by room.
///
/// Cheap to clone; all clones share the same timers. Timers are tokio
/// tasks, so [`arm`](Self::arm) must be called from inside a runtime.
#[derive(Clone)]
pub struct TurnClock {
    inner: Arc<Inner>,
}

impl TurnClock {
    /// Creates a clock and the channel its expiries are delivered on.
    pub fn new(config: ClockConfig) -> (Self, mpsc::UnboundedReceiver<Expiry>) {
        let (fired, expiries) = mpsc::unbounded_channel();
        let clock = Self {
            inner: Arc::new(Inner {
                config: config.validated(),
                pending: Mutex::new(HashMap::new()),
                fired,
            }),
        };
        (clock, expiries)
    }

    /// Schedules `room`'s timer for `deadline`, cancelling any earlier one.
    ///
    /// A deadline already in the past fires after just the slack.
    pub fn arm(&self, room: &RoomCode, deadline: Timestamp) {
        let delay = deadline.saturating_duration_since(Timestamp::now()) + self.inner.config.slack;
        let weak = Arc::downgrade(&self.inner);
        let code = room.clone();

        let mut pending = self.inner.pending();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let matched = {
                let mut pending = inner.pending();
                match pending.get(&code) {
                    Some(p) if p.deadline == deadline => {
                        pending.remove(&code);
                        true
                    }
                    _ => false,
                }
            };
            if matched {
                debug!(room = %code, %deadline, "turn timer fired");
                let _ = inner.fired.send(Expiry {
                    room: code,
                    deadline,
                });
            } else {
                trace!(room = %code, %deadline, "superseded turn timer dropped");
            }
        })
        .abort_handle();

        if let Some(previous) = pending.insert(room.clone(), Pending { deadline, task }) {
            previous.task.abort();
        }
        trace!(room = %room, %deadline, ?delay, "turn timer armed");
    }

    /// Cancels `room`'s timer, if any. Returns `true` if one was pending.
    pub fn disarm(&self, room: &RoomCode) -> bool {
        match self.inner.pending().remove(room) {
            Some(previous) => {
                previous.task.abort();
                trace!(room = %room, "turn timer disarmed");
                true
            }
            None => false,
        }
    }

    /// The deadline `room`'s timer is armed for.
    pub fn pending(&self, room: &RoomCode) -> Option<Timestamp> {
        self.inner.pending().get(room).map(|p| p.deadline)
    }

    /// Number of rooms with a pending timer.
    pub fn pending_count(&self) -> usize {
        self.inner.pending().len()
    }

    /// Cancels every pending timer.
    pub fn disarm_all(&self) {
        for (_, p) in self.inner.pending().drain() {
            p.task.abort();
        }
    }
}

impl std::fmt::Debug for TurnClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnClock")
            .field("slack", &self.inner.config.slack)
            .field("pending", &self.pending_count())
            .finish()
    }
}
