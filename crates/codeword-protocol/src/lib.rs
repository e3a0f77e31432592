//! Shared vocabulary for Codeword.
//!
//! This crate defines the "language" every other layer speaks:
//!
//! - **Types** ([`RoomCode`], [`Username`], [`Team`], [`Role`], [`Cell`],
//!   [`Timestamp`], ...): the nouns of the game.
//! - **Events** ([`Notification`], [`EndOutcome`]): what a room publishes
//!   after each transition.
//! - **Requests** ([`ClientRequest`]): what a connected client may ask for.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those are converted
//!   to and from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! It knows nothing about rooms, timers, or sockets.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientRequest / Notification) → Room (state machine)
//! ```

mod codec;
mod error;
mod event;
mod request;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use event::{EndOutcome, Notification};
pub use request::ClientRequest;
pub use types::{
    Cell, CellColor, GuessOutcome, GuessRecord, MAX_IDENTIFIER_LEN, Player, Role, RoomCode,
    Team, Timestamp, Username,
};
