//! Per-connection handler: request routing and notification forwarding.
//!
//! Each accepted connection runs this handler in its own task. The loop
//! waits on two things at once:
//!   1. the next client request, decoded and routed to the room manager
//!   2. the next notification from the room this connection is seated in
//!
//! A connection holds at most one seat. Requests after `CreateRoom` or
//! `JoinRoom` act on that seat, and the seat is given up when the
//! connection goes away.

use std::sync::Arc;

use codeword_protocol::{ClientRequest, Codec, Notification, Player, Role, RoomCode, Username};
use codeword_room::{Departure, ErrorKind, ExpirySignal, RoomError};
use codeword_transport::{Connection, WebSocketConnection};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::CodewordError;
use crate::server::ServerState;
use crate::view::RoomView;
use crate::wire::ServerMessage;

#[derive(Debug, Clone)]
struct Seat {
    code: RoomCode,
    username: Username,
}

/// Gives up the seat when the handler exits, including on panic.
///
/// `Drop` is synchronous, so the leave runs in a spawned task.
struct SeatGuard<C: Codec> {
    seat: Option<Seat>,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> SeatGuard<C> {
    fn new(state: Arc<ServerState<C>>) -> Self {
        Self { seat: None, state }
    }

    fn current(&self) -> Option<&Seat> {
        self.seat.as_ref()
    }

    fn occupy(&mut self, seat: Seat) {
        self.seat = Some(seat);
    }

    /// Forgets the seat without leaving the room.
    fn vacate(&mut self) -> Option<Seat> {
        self.seat.take()
    }
}

impl<C: Codec> Drop for SeatGuard<C> {
    fn drop(&mut self) {
        let Some(seat) = self.seat.take() else {
            return;
        };
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            match state.rooms.leave(&seat.code, &seat.username).await {
                Ok(_) => {
                    debug!(room = %seat.code, username = %seat.username, "seat released on disconnect");
                }
                Err(e) => {
                    warn!(room = %seat.code, username = %seat.username, error = %e, "seat release failed");
                }
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), CodewordError> {
    let conn_id = conn.id();
    debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let mut session = Session {
        conn: &conn,
        state: &state,
        seat: SeatGuard::new(Arc::clone(&state)),
        events: None,
    };

    loop {
        tokio::select! {
            incoming = conn.recv() => match incoming {
                Ok(Some(data)) => session.handle_frame(&data).await?,
                Ok(None) => {
                    debug!(%conn_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },
            event = next_event(&mut session.events) => session.forward(event).await?,
        }
    }

    // session.seat drops here and releases the seat.
    Ok(())
}

/// Resolves with the next notification, or never if not subscribed.
async fn next_event(
    events: &mut Option<broadcast::Receiver<Notification>>,
) -> Result<Notification, RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

struct Session<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    state: &'a Arc<ServerState<C>>,
    seat: SeatGuard<C>,
    events: Option<broadcast::Receiver<Notification>>,
}

impl<C: Codec> Session<'_, C> {
    async fn handle_frame(&mut self, data: &[u8]) -> Result<(), CodewordError> {
        let request: ClientRequest = match self.state.codec.decode(data) {
            Ok(request) => request,
            Err(e) => {
                debug!(conn_id = %self.conn.id(), error = %e, "failed to decode request");
                return self.send(&ServerMessage::from(&e)).await;
            }
        };

        match request {
            ClientRequest::CreateRoom {
                code,
                username,
                role,
                team,
            } => self.create_room(code, Player::new(username, role, team)).await,
            ClientRequest::JoinRoom {
                code,
                username,
                role,
                team,
            } => self.join_room(code, Player::new(username, role, team)).await,
            ClientRequest::LeaveRoom => self.leave_room().await,
            ClientRequest::StartGame => {
                let Some(seat) = self.require_seat().await? else {
                    return Ok(());
                };
                let result = self.state.rooms.start(&seat.code).await;
                self.report(result).await
            }
            ClientRequest::SubmitHint { hint } => self.submit_hint(&hint).await,
            ClientRequest::RevealTile { index } => {
                let Some(seat) = self.require_seat().await? else {
                    return Ok(());
                };
                let result = self
                    .state
                    .rooms
                    .reveal_tile_as(&seat.code, &seat.username, index)
                    .await;
                self.report(result).await
            }
            ClientRequest::TimerExpired { deadline } => {
                let Some(seat) = self.require_seat().await? else {
                    return Ok(());
                };
                let signal = ExpirySignal::External { observed: deadline };
                let applied = self.state.rooms.expire_turn(&seat.code, signal).await;
                debug!(room = %seat.code, username = %seat.username, applied, "client timer expired");
                Ok(())
            }
            ClientRequest::SyncState => {
                if self.require_seat().await?.is_some() {
                    self.send_snapshot().await?;
                }
                Ok(())
            }
        }
    }

    async fn create_room(
        &mut self,
        code: Option<RoomCode>,
        creator: Player,
    ) -> Result<(), CodewordError> {
        if self.reject_if_seated().await? {
            return Ok(());
        }
        let username = creator.username.clone();
        let rooms = &self.state.rooms;
        let created = match code {
            Some(code) => rooms.create_room(code.clone(), creator).await.map(|_| code),
            None => rooms
                .create_room_with_random_code(creator)
                .await
                .map(|(code, _)| code),
        };
        match created {
            Ok(code) => self.take_seat(code, username).await,
            Err(e) => self.send(&ServerMessage::from(&e)).await,
        }
    }

    async fn join_room(&mut self, code: RoomCode, player: Player) -> Result<(), CodewordError> {
        if self.reject_if_seated().await? {
            return Ok(());
        }
        let username = player.username.clone();
        match self.state.rooms.join(&code, player).await {
            Ok(_) => self.take_seat(code, username).await,
            Err(e) => self.send(&ServerMessage::from(&e)).await,
        }
    }

    /// Subscribes, then snapshots. Anything published between the
    /// room operation and the subscription is covered by the snapshot.
    async fn take_seat(&mut self, code: RoomCode, username: Username) -> Result<(), CodewordError> {
        self.events = Some(self.state.fanout().subscribe(&code));
        self.seat.occupy(Seat {
            code: code.clone(),
            username: username.clone(),
        });
        info!(conn_id = %self.conn.id(), room = %code, %username, "seat taken");

        self.send(&ServerMessage::Joined { code, username }).await?;
        self.send_snapshot().await
    }

    async fn leave_room(&mut self) -> Result<(), CodewordError> {
        let Some(seat) = self.require_seat().await? else {
            return Ok(());
        };
        match self.state.rooms.leave(&seat.code, &seat.username).await {
            Ok(departure) => {
                self.seat.vacate();
                self.events = None;
                if departure == Departure::RoomDeleted {
                    debug!(room = %seat.code, "left as last player");
                }
                self.send(&ServerMessage::Left { code: seat.code }).await
            }
            Err(e) => self.send(&ServerMessage::from(&e)).await,
        }
    }

    /// A refused hint goes back to its author twice: as the usual error
    /// reply and as a `hint-rejected` event. The room never sees it.
    async fn submit_hint(&mut self, hint: &str) -> Result<(), CodewordError> {
        let Some(seat) = self.require_seat().await? else {
            return Ok(());
        };
        let result = self
            .state
            .rooms
            .submit_hint(&seat.code, &seat.username, hint)
            .await;
        if let Err(e) = result {
            debug!(room = %seat.code, username = %seat.username, error = %e, "hint rejected");
            self.send(&ServerMessage::from(&e)).await?;
            let rejected = Notification::HintRejected {
                reason: e.to_string(),
            };
            self.send(&ServerMessage::event(rejected)).await?;
        }
        Ok(())
    }

    async fn forward(&mut self, event: Result<Notification, RecvError>) -> Result<(), CodewordError> {
        match event {
            Ok(notification) => self.send(&ServerMessage::event(notification)).await,
            Err(RecvError::Lagged(missed)) => {
                warn!(conn_id = %self.conn.id(), missed, "connection fell behind, resyncing");
                self.send_snapshot().await
            }
            Err(RecvError::Closed) => {
                self.events = None;
                Ok(())
            }
        }
    }

    /// Agents only see the colors of revealed cells.
    async fn send_snapshot(&self) -> Result<(), CodewordError> {
        let Some(seat) = self.seat.current() else {
            return Ok(());
        };
        match self.state.rooms.snapshot(&seat.code).await {
            Ok(room) => {
                let role = room.player(&seat.username).map_or(Role::Agent, |p| p.role);
                let view = RoomView::for_role(&room, role);
                self.send(&ServerMessage::Snapshot { room: view }).await
            }
            Err(e) => self.send(&ServerMessage::from(&e)).await,
        }
    }

    /// The current seat, or `None` after telling the client it has none.
    async fn require_seat(&self) -> Result<Option<Seat>, CodewordError> {
        match self.seat.current() {
            Some(seat) => Ok(Some(seat.clone())),
            None => {
                let msg = ServerMessage::error(ErrorKind::InvalidState, "not seated in a room");
                self.send(&msg).await?;
                Ok(None)
            }
        }
    }

    /// Returns `true` (after replying) if this connection already holds a
    /// seat.
    async fn reject_if_seated(&self) -> Result<bool, CodewordError> {
        let Some(seat) = self.seat.current() else {
            return Ok(false);
        };
        let msg = ServerMessage::error(
            ErrorKind::Conflict,
            format!("already seated in room {}", seat.code),
        );
        self.send(&msg).await?;
        Ok(true)
    }

    /// Successes are silent: the room's notifications arrive through the
    /// subscription.
    async fn report<T>(&self, result: Result<T, RoomError>) -> Result<(), CodewordError> {
        match result {
            Ok(_) => Ok(()),
            Err(e) => self.send(&ServerMessage::from(&e)).await,
        }
    }

    async fn send(&self, msg: &ServerMessage) -> Result<(), CodewordError> {
        let bytes = self.state.codec.encode(msg)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }
}
