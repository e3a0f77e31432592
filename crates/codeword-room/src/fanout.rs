//! Notification fan-out: delivering a room's events to its subscribers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use codeword_protocol::{Notification, RoomCode};
use tokio::sync::broadcast;
use tracing::trace;

/// Delivers notifications to everyone subscribed to a room.
///
/// Publishing never fails from the room's point of view: a subscriber
/// that is gone or too slow is the subscriber's problem.
pub trait Publisher: Send + Sync + 'static {
    fn publish(&self, room: &RoomCode, notification: &Notification);

    /// The room was deleted; release whatever is held for it.
    fn close(&self, _room: &RoomCode) {}
}

/// Settings for [`BroadcastFanout`].
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Notifications buffered per room. A subscriber that falls further
    /// behind than this misses events and should resync from a snapshot.
    pub capacity: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self { capacity: 128 }
    }
}

/// One tokio `broadcast` channel per room.
///
/// Channels are created on first subscribe and pruned once the last
/// receiver is gone.
#[derive(Debug)]
pub struct BroadcastFanout {
    capacity: usize,
    channels: Mutex<HashMap<RoomCode, broadcast::Sender<Notification>>>,
}

impl BroadcastFanout {
    pub fn new(config: FanoutConfig) -> Self {
        Self {
            capacity: config.capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribes to `room`'s notifications from now on.
    pub fn subscribe(&self, room: &RoomCode) -> broadcast::Receiver<Notification> {
        self.channels()
            .entry(room.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of rooms with a live channel.
    pub fn channel_count(&self) -> usize {
        self.channels().len()
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<RoomCode, broadcast::Sender<Notification>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BroadcastFanout {
    fn default() -> Self {
        Self::new(FanoutConfig::default())
    }
}

impl Publisher for BroadcastFanout {
    fn publish(&self, room: &RoomCode, notification: &Notification) {
        let mut channels = self.channels();
        let Some(sender) = channels.get(room) else {
            trace!(room = %room, event = notification.event_name(), "no subscribers");
            return;
        };
        match sender.send(notification.clone()) {
            Ok(receivers) => {
                trace!(room = %room, event = notification.event_name(), receivers, "published");
            }
            Err(_) => {
                channels.remove(room);
                trace!(room = %room, "pruned channel with no receivers");
            }
        }
    }

    fn close(&self, room: &RoomCode) {
        // Dropping the sender ends every receiver's stream.
        self.channels().remove(room);
    }
}
