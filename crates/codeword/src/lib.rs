//! # Codeword
//!
//! Server for a team word-guessing game. Two teams, Red and Blue, each
//! have a Spymaster who sees the hidden colors of the board and Agents
//! who reveal cells based on the Spymaster's one-line hint. Revealing the
//! assassin loses the game; finding every cell of your color wins it.
//!
//! Many rooms run side by side. Each room is a state machine
//! (`waiting`, `active`, `paused`, `ended`) driven by player requests and
//! by a server-side turn clock, and every change is pushed to the room's
//! connections as it happens.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use codeword::prelude::*;
//!
//! # async fn run() -> Result<(), CodewordError> {
//! let server = CodewordServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .game_config(GameConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Crates
//!
//! - `codeword-protocol`: identifiers, board vocabulary, requests,
//!   notifications, and the JSON codec
//! - `codeword-clock`: the turn clock that fires turn deadlines
//! - `codeword-room`: the room state machine, room actors, store, and
//!   fanout
//! - `codeword-transport`: the WebSocket transport

mod error;
mod handler;
mod server;
mod view;
mod wire;

pub use error::CodewordError;
pub use server::{CodewordServer, CodewordServerBuilder, Rooms};
pub use view::{CellView, RoomView};
pub use wire::ServerMessage;

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{
        CellView, CodewordError, CodewordServer, CodewordServerBuilder, RoomView, Rooms,
        ServerMessage,
    };
    pub use codeword_clock::ClockConfig;
    pub use codeword_protocol::{
        Cell, CellColor, ClientRequest, EndOutcome, Notification, Player, Role, RoomCode, Team,
        Timestamp, Username,
    };
    pub use codeword_room::{
        Board, BoardGenerator, ErrorKind, FanoutConfig, GameConfig, RandomBoardGenerator, Room,
        RoomError, RoomState,
    };
}
