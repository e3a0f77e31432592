//! Room persistence.
//!
//! The room actor loads the room before every transition and writes the
//! result back before anything is published, so the store always holds
//! the latest committed state. [`MemoryStore`] keeps rooms in process;
//! anything that can load and replace a [`Room`] by code can stand in
//! for it.

use std::collections::HashMap;
use std::future::Future;

use codeword_protocol::RoomCode;
use tokio::sync::RwLock;

use crate::{Room, StoreError};

/// Keyed storage for rooms.
///
/// Methods return `impl Future + Send` so room actors, which run on the
/// multi-threaded runtime, can hold them across `.await`.
pub trait RoomStore: Send + Sync + 'static {
    /// Loads a room. `Ok(None)` means no such room.
    fn get(&self, code: &RoomCode)
    -> impl Future<Output = Result<Option<Room>, StoreError>> + Send;

    /// Inserts or replaces a room under its own code.
    fn put(&self, room: &Room) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes a room. Removing a missing room is not an error.
    fn delete(&self, code: &RoomCode) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// In-process room store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<RoomCode, Room>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rooms.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

impl RoomStore for MemoryStore {
    async fn get(&self, code: &RoomCode) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.read().await.get(code).cloned())
    }

    async fn put(&self, room: &Room) -> Result<(), StoreError> {
        self.rooms
            .write()
            .await
            .insert(room.code().clone(), room.clone());
        Ok(())
    }

    async fn delete(&self, code: &RoomCode) -> Result<(), StoreError> {
        self.rooms.write().await.remove(code);
        Ok(())
    }
}
