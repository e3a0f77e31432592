//! Room actor: the single writer for one room.
//!
//! Every operation on a room is a command sent to its actor's channel.
//! The actor handles them one at a time: load the room, apply one
//! transition, persist, adjust the turn clock, publish. Operations on one
//! room therefore never interleave, and operations on different rooms
//! run on different tasks.

use std::sync::Arc;
use std::time::Duration;

use codeword_clock::TurnClock;
use codeword_protocol::{Notification, Player, RoomCode, Timestamp, Username};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::{ExpirySignal, Publisher, Room, RoomError, RoomState, RoomStore};

/// A transition requested of a room.
#[derive(Debug, Clone)]
pub(crate) enum Action {
    Join(Player),
    Leave(Username),
    Start,
    SubmitHint {
        username: Username,
        hint: String,
    },
    /// `actor: None` skips the role check.
    RevealTile {
        actor: Option<Username>,
        index: usize,
    },
    ExpireTurn(ExpirySignal),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Leave(_) => "leave",
            Self::Start => "start",
            Self::SubmitHint { .. } => "submit-hint",
            Self::RevealTile { .. } => "reveal-tile",
            Self::ExpireTurn(_) => "expire-turn",
        }
    }
}

/// What an applied action did.
#[derive(Debug, Default)]
pub(crate) struct Outcome {
    pub notifications: Vec<Notification>,
    /// The last player left and the room is gone.
    pub room_deleted: bool,
}

pub(crate) enum RoomCommand {
    Apply {
        action: Action,
        reply: oneshot::Sender<Result<Outcome, RoomError>>,
    },
    Snapshot {
        reply: oneshot::Sender<Result<Room, RoomError>>,
    },
    Shutdown,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub(crate) struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub(crate) async fn apply(&self, action: Action) -> Result<Outcome, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Apply { action, reply })
            .await
            .map_err(|_| self.gone())?;
        rx.await.map_err(|_| self.gone())?
    }

    pub(crate) async fn snapshot(&self) -> Result<Room, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply })
            .await
            .map_err(|_| self.gone())?;
        rx.await.map_err(|_| self.gone())?
    }

    /// Asks the actor to stop after the commands already queued.
    pub(crate) async fn shutdown(&self) {
        let _ = self.sender.send(RoomCommand::Shutdown).await;
    }

    /// Resolves once the actor has stopped and released its queue.
    pub(crate) async fn stopped(&self) {
        self.sender.closed().await;
    }

    /// The actor has stopped.
    pub(crate) fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub(crate) fn same_actor(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// A stopped actor means its room was deleted.
    fn gone(&self) -> RoomError {
        RoomError::RoomNotFound(self.code.clone())
    }
}

struct RoomActor<S, P> {
    code: RoomCode,
    store: Arc<S>,
    publisher: Arc<P>,
    clock: TurnClock,
    turn_duration: Duration,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<S: RoomStore, P: Publisher> RoomActor<S, P> {
    async fn run(mut self) {
        info!(room = %self.code, "room actor started");
        self.rearm().await;

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Apply { action, reply } => {
                    let name = action.name();
                    let result = self.apply(action).await;
                    let stop = match &result {
                        Ok(outcome) => outcome.room_deleted,
                        Err(RoomError::RoomNotFound(_)) => true,
                        Err(e) => {
                            debug!(room = %self.code, action = name, error = %e, "action rejected");
                            false
                        }
                    };
                    let _ = reply.send(result);
                    if stop {
                        break;
                    }
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.load().await);
                }
                RoomCommand::Shutdown => break,
            }
        }

        info!(room = %self.code, "room actor stopped");
    }

    async fn load(&self) -> Result<Room, RoomError> {
        self.store
            .get(&self.code)
            .await?
            .ok_or_else(|| RoomError::RoomNotFound(self.code.clone()))
    }

    /// Picks up a running turn for a room that was loaded from the store
    /// rather than created by this process.
    async fn rearm(&self) {
        if let Ok(room) = self.load().await {
            if room.state() == RoomState::Active {
                if let Some(deadline) = room.turn_deadline() {
                    if self.clock.pending(&self.code) != Some(deadline) {
                        debug!(room = %self.code, %deadline, "re-arming turn clock");
                        self.clock.arm(&self.code, deadline);
                    }
                }
            }
        }
    }

    async fn apply(&self, action: Action) -> Result<Outcome, RoomError> {
        let before = self.load().await?;
        let mut next = before.clone();
        let now = Timestamp::now();
        let turn = self.turn_duration;

        let notifications = match action {
            Action::Join(player) => next.join(player)?,
            Action::Leave(username) => next.leave(&username)?,
            Action::Start => next.start(now, turn)?,
            Action::SubmitHint { username, hint } => next.submit_hint(&username, &hint)?,
            Action::RevealTile {
                actor: Some(username),
                index,
            } => next.reveal_tile_as(&username, index, now, turn)?,
            Action::RevealTile { actor: None, index } => next.reveal_tile(index, now, turn)?,
            Action::ExpireTurn(signal) => next.expire_turn(signal, now, turn),
        };

        if next.is_empty() {
            self.store.delete(&self.code).await?;
            self.clock.disarm(&self.code);
            self.publisher.close(&self.code);
            info!(room = %self.code, "last player left, room deleted");
            return Ok(Outcome {
                notifications: Vec::new(),
                room_deleted: true,
            });
        }

        if next == before {
            return Ok(Outcome::default());
        }

        self.store.put(&next).await?;
        self.sync_clock(&before, &next);
        if before.state() != next.state() {
            info!(room = %self.code, from = %before.state(), to = %next.state(), "room state changed");
            if next.state().is_terminal() {
                info!(room = %self.code, guesses = next.history().len(), "game over");
            }
        }
        for notification in &notifications {
            self.publisher.publish(&self.code, notification);
        }
        Ok(Outcome {
            notifications,
            room_deleted: false,
        })
    }

    /// Keeps exactly one timer armed while the room is active, for its
    /// live deadline, and none otherwise.
    fn sync_clock(&self, before: &Room, after: &Room) {
        match (after.state(), after.turn_deadline()) {
            (RoomState::Active, Some(deadline)) => {
                if before.state() != RoomState::Active || before.turn_deadline() != Some(deadline)
                {
                    self.clock.arm(&self.code, deadline);
                }
            }
            _ => {
                if before.state() == RoomState::Active {
                    self.clock.disarm(&self.code);
                }
            }
        }
    }
}

/// Spawns the actor for `code` and returns a handle to it.
///
/// The room must already be in the store.
pub(crate) fn spawn_room<S: RoomStore, P: Publisher>(
    code: RoomCode,
    store: Arc<S>,
    publisher: Arc<P>,
    clock: TurnClock,
    turn_duration: Duration,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        code: code.clone(),
        store,
        publisher,
        clock,
        turn_duration,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
