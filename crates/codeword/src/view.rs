//! What a seat is allowed to see of a room.
//!
//! Only Spymasters know the colors of unrevealed cells. Agents get the
//! labels and the cells revealed so far. Once the game has ended every
//! color is shown.

use codeword_protocol::{CellColor, GuessRecord, Player, Role, RoomCode, Team, Timestamp};
use codeword_room::{Room, RoomState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    pub label: String,
    pub revealed: bool,
    /// `None` when the viewer may not know it yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<CellColor>,
}

/// A room as sent to one seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomView {
    pub code: RoomCode,
    pub state: RoomState,
    pub cells: Vec<CellView>,
    pub players: Vec<Player>,
    pub turn_team: Team,
    pub turn_deadline: Option<Timestamp>,
    pub current_hint: Option<String>,
    pub history: Vec<GuessRecord>,
    pub created_at: Timestamp,
}

impl RoomView {
    pub fn for_role(room: &Room, role: Role) -> Self {
        let sees_all = role == Role::Spymaster || room.state() == RoomState::Ended;
        let cells = room
            .board()
            .cells()
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let revealed = room.is_revealed(index);
                CellView {
                    label: cell.label.clone(),
                    revealed,
                    color: (sees_all || revealed).then_some(cell.color),
                }
            })
            .collect();

        Self {
            code: room.code().clone(),
            state: room.state(),
            cells,
            players: room.players().to_vec(),
            turn_team: room.turn_team(),
            turn_deadline: room.turn_deadline(),
            current_hint: room.current_hint().map(str::to_string),
            history: room.history().to_vec(),
            created_at: room.created_at(),
        }
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.cells.get(index).is_some_and(|c| c.revealed)
    }
}
