//! Rooms for Codeword: the game state machine and everything that keeps
//! it consistent under concurrency.
//!
//! Each room runs as an isolated Tokio task (actor model). The actor is
//! the only writer of its room: it loads the [`Room`] from a
//! [`RoomStore`], applies one transition, persists it, keeps the
//! [`TurnClock`](codeword_clock::TurnClock) in step, and publishes the
//! resulting notifications through a [`Publisher`].
//!
//! # Key types
//!
//! - [`Room`]: the aggregate and its transitions (join, leave, start,
//!   submit hint, reveal tile, expire turn)
//! - [`RoomManager`]: creates rooms and routes operations to their actors
//! - [`RoomState`]: lifecycle state machine
//! - [`Board`], [`BoardGenerator`]: the cells a room plays on
//! - [`RoomStore`], [`MemoryStore`]: persistence
//! - [`Publisher`], [`BroadcastFanout`]: notification delivery
//! - [`GameConfig`]: board size, turn length, actor buffering

mod actor;
mod board;
mod config;
mod error;
mod fanout;
mod manager;
mod room;
mod store;
mod words;

pub use board::{Board, BoardGenerator, BoardLayout, RandomBoardGenerator};
pub use config::{GameConfig, RoomState};
pub use error::{ErrorKind, RoomError, StoreError};
pub use fanout::{BroadcastFanout, FanoutConfig, Publisher};
pub use manager::{Departure, RoomManager};
pub use room::{ExpirySignal, Room};
pub use store::{MemoryStore, RoomStore};
