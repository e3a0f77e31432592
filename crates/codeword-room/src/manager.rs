//! Room manager: creates rooms and routes operations to their actors.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use codeword_clock::{Expiry, TurnClock};
use codeword_protocol::{Notification, Player, RoomCode, Timestamp, Username};
use rand::Rng;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

use crate::actor::{Action, RoomHandle, spawn_room};
use crate::{
    Board, BoardGenerator, ExpirySignal, GameConfig, Publisher, Room, RoomError, RoomStore,
};

/// Length of generated room codes.
const ROOM_CODE_LEN: usize = 6;
const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const RANDOM_CODE_ATTEMPTS: usize = 5;

/// Result of a [`RoomManager::leave`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// The player left; the room carries on.
    Left(Vec<Notification>),
    /// That was the last player. The room no longer exists.
    RoomDeleted,
}

/// Entry point for every room operation.
///
/// Holds one actor handle per live room. Rooms that are in the store but
/// have no running actor (for example after [`shutdown`](Self::shutdown))
/// get one on first use.
///
/// Must be created inside a tokio runtime: it spawns the task that feeds
/// turn clock expiries back into rooms.
pub struct RoomManager<S: RoomStore, P: Publisher> {
    store: Arc<S>,
    publisher: Arc<P>,
    generator: Arc<dyn BoardGenerator>,
    clock: TurnClock,
    config: GameConfig,
    rooms: Mutex<HashMap<RoomCode, RoomHandle>>,
}

impl<S: RoomStore, P: Publisher> RoomManager<S, P> {
    pub fn new(
        store: Arc<S>,
        publisher: Arc<P>,
        generator: Arc<dyn BoardGenerator>,
        config: GameConfig,
    ) -> Arc<Self> {
        let config = config.validated();
        let (clock, expiries) = TurnClock::new(config.clock.clone());
        let manager = Arc::new(Self {
            store,
            publisher,
            generator,
            clock,
            config,
            rooms: Mutex::new(HashMap::new()),
        });
        tokio::spawn(pump_expiries(Arc::downgrade(&manager), expiries));
        manager
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Creates a room with a generated board.
    pub async fn create_room(
        &self,
        code: RoomCode,
        creator: Player,
    ) -> Result<Vec<Notification>, RoomError> {
        let board = self.generator.generate(self.config.board_size)?;
        self.create_room_with_board(code, board, creator).await
    }

    /// Creates a room with the given board, which must have exactly
    /// `board_size` cells.
    pub async fn create_room_with_board(
        &self,
        code: RoomCode,
        board: Board,
        creator: Player,
    ) -> Result<Vec<Notification>, RoomError> {
        if board.len() != self.config.board_size {
            return Err(RoomError::InvalidBoard(format!(
                "expected {} cells, got {}",
                self.config.board_size,
                board.len()
            )));
        }

        let mut rooms = self.rooms.lock().await;
        let live = rooms.get(&code).is_some_and(|h| !h.is_closed());
        if live || self.store.get(&code).await?.is_some() {
            return Err(RoomError::DuplicateRoom(code));
        }

        let (room, notifications) = Room::create(code.clone(), board, creator, Timestamp::now());
        self.store.put(&room).await?;
        rooms.insert(code.clone(), self.spawn(code.clone()));
        drop(rooms);

        for notification in &notifications {
            self.publisher.publish(&code, notification);
        }
        info!(room = %code, "room created");
        Ok(notifications)
    }

    /// Creates a room under a freshly generated code and returns the code.
    ///
    /// Retries a few times if the generated code is taken.
    pub async fn create_room_with_random_code(
        &self,
        creator: Player,
    ) -> Result<(RoomCode, Vec<Notification>), RoomError> {
        let mut attempt = 1;
        loop {
            let code = random_code();
            match self.create_room(code.clone(), creator.clone()).await {
                Ok(notifications) => return Ok((code, notifications)),
                Err(RoomError::DuplicateRoom(_)) if attempt < RANDOM_CODE_ATTEMPTS => {
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub async fn join(
        &self,
        code: &RoomCode,
        player: Player,
    ) -> Result<Vec<Notification>, RoomError> {
        self.apply(code, Action::Join(player)).await
    }

    pub async fn leave(&self, code: &RoomCode, username: &Username) -> Result<Departure, RoomError> {
        let handle = self.handle(code).await?;
        let outcome = handle.apply(Action::Leave(username.clone())).await?;
        if outcome.room_deleted {
            self.forget(code, &handle).await;
            Ok(Departure::RoomDeleted)
        } else {
            Ok(Departure::Left(outcome.notifications))
        }
    }

    pub async fn start(&self, code: &RoomCode) -> Result<Vec<Notification>, RoomError> {
        self.apply(code, Action::Start).await
    }

    pub async fn submit_hint(
        &self,
        code: &RoomCode,
        username: &Username,
        hint: &str,
    ) -> Result<Vec<Notification>, RoomError> {
        self.apply(
            code,
            Action::SubmitHint {
                username: username.clone(),
                hint: hint.to_string(),
            },
        )
        .await
    }

    /// Reveals a tile for the turn team without checking who asked.
    pub async fn reveal_tile(
        &self,
        code: &RoomCode,
        index: usize,
    ) -> Result<Vec<Notification>, RoomError> {
        self.apply(code, Action::RevealTile { actor: None, index })
            .await
    }

    /// Reveals a tile on behalf of `username`, who must be an Agent of the
    /// turn team.
    pub async fn reveal_tile_as(
        &self,
        code: &RoomCode,
        username: &Username,
        index: usize,
    ) -> Result<Vec<Notification>, RoomError> {
        self.apply(
            code,
            Action::RevealTile {
                actor: Some(username.clone()),
                index,
            },
        )
        .await
    }

    /// Delivers a "time's up" signal. Returns `true` if the turn passed.
    ///
    /// Never fails: a stale signal, a missing room or a store error all
    /// leave the room as it was.
    pub async fn expire_turn(&self, code: &RoomCode, signal: ExpirySignal) -> bool {
        match self.apply(code, Action::ExpireTurn(signal)).await {
            Ok(notifications) if !notifications.is_empty() => {
                info!(room = %code, ?signal, "turn expired");
                true
            }
            Ok(_) => {
                debug!(room = %code, ?signal, "stale expiry ignored");
                false
            }
            Err(e) => {
                debug!(room = %code, ?signal, error = %e, "expiry dropped");
                false
            }
        }
    }

    /// The room's latest committed state.
    pub async fn snapshot(&self, code: &RoomCode) -> Result<Room, RoomError> {
        self.handle(code).await?.snapshot().await
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Number of rooms with a running actor.
    pub async fn room_count(&self) -> usize {
        self.rooms
            .lock()
            .await
            .values()
            .filter(|h| !h.is_closed())
            .count()
    }

    /// Codes of rooms with a running actor.
    pub async fn room_codes(&self) -> Vec<RoomCode> {
        self.rooms
            .lock()
            .await
            .iter()
            .filter(|(_, h)| !h.is_closed())
            .map(|(code, _)| code.clone())
            .collect()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn clock(&self) -> &TurnClock {
        &self.clock
    }

    pub fn publisher(&self) -> &Arc<P> {
        &self.publisher
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Stops every room actor and cancels every timer. Rooms stay in the
    /// store and come back on next use.
    ///
    /// Each actor finishes the commands already queued before it stops.
    /// The room map stays locked until all of them have, so no room gets
    /// a second actor while its first is still writing.
    pub async fn shutdown(&self) {
        let mut rooms = self.rooms.lock().await;
        for handle in rooms.values() {
            handle.shutdown().await;
        }
        for handle in rooms.values() {
            handle.stopped().await;
        }
        let stopped = rooms.len();
        rooms.clear();
        self.clock.disarm_all();
        drop(rooms);
        info!(rooms = stopped, "room manager shut down");
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn apply(&self, code: &RoomCode, action: Action) -> Result<Vec<Notification>, RoomError> {
        let handle = self.handle(code).await?;
        Ok(handle.apply(action).await?.notifications)
    }

    /// The live actor for `code`, spawning one if the room is only in the
    /// store.
    async fn handle(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        let mut rooms = self.rooms.lock().await;
        if let Some(handle) = rooms.get(code) {
            if !handle.is_closed() {
                return Ok(handle.clone());
            }
            rooms.remove(code);
        }
        if self.store.get(code).await?.is_none() {
            return Err(RoomError::RoomNotFound(code.clone()));
        }
        debug!(room = %code, "spawning actor for stored room");
        let handle = self.spawn(code.clone());
        rooms.insert(code.clone(), handle.clone());
        Ok(handle)
    }

    fn spawn(&self, code: RoomCode) -> RoomHandle {
        spawn_room(
            code,
            Arc::clone(&self.store),
            Arc::clone(&self.publisher),
            self.clock.clone(),
            self.config.turn_duration,
            self.config.command_buffer,
        )
    }

    /// Drops the handle for a deleted room, unless a new room with the
    /// same code has already replaced it.
    async fn forget(&self, code: &RoomCode, handle: &RoomHandle) {
        let mut rooms = self.rooms.lock().await;
        if rooms.get(code).is_some_and(|h| h.same_actor(handle)) {
            rooms.remove(code);
        }
    }
}

/// Routes turn clock expiries to their rooms until the manager is gone.
async fn pump_expiries<S: RoomStore, P: Publisher>(
    manager: Weak<RoomManager<S, P>>,
    mut expiries: mpsc::UnboundedReceiver<Expiry>,
) {
    while let Some(expiry) = expiries.recv().await {
        let Some(manager) = manager.upgrade() else {
            break;
        };
        manager
            .expire_turn(&expiry.room, ExpirySignal::Clock(expiry.deadline))
            .await;
    }
}

/// A random room code from an unambiguous alphabet. Not guaranteed unused.
fn random_code() -> RoomCode {
    let mut rng = rand::rng();
    loop {
        let raw: String = (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_CHARS[rng.random_range(0..ROOM_CODE_CHARS.len())] as char)
            .collect();
        if let Ok(code) = RoomCode::parse(&raw) {
            return code;
        }
    }
}
