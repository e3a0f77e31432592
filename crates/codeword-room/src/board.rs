//! The game board and how new boards are generated.

use codeword_protocol::{Cell, CellColor, Team};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::RoomError;
use crate::words::WORDS;

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// An ordered, immutable sequence of cells.
///
/// A `Board` always holds exactly one assassin and at least one cell of
/// each team's color. Deserialization goes through the same check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Cell>", into = "Vec<Cell>")]
pub struct Board(Vec<Cell>);

impl Board {
    /// Validates the color invariant and wraps `cells`.
    pub fn new(cells: Vec<Cell>) -> Result<Self, RoomError> {
        let count = |color| cells.iter().filter(|c| c.color == color).count();
        let assassins = count(CellColor::Assassin);
        if assassins != 1 {
            return Err(RoomError::InvalidBoard(format!(
                "expected exactly one assassin, found {assassins}"
            )));
        }
        for team in Team::ALL {
            if count(team.color()) == 0 {
                return Err(RoomError::InvalidBoard(format!("no cells for team {team}")));
            }
        }
        Ok(Self(cells))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.0.get(index)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.0
    }

    /// How many cells carry `color`.
    pub fn count(&self, color: CellColor) -> usize {
        self.0.iter().filter(|c| c.color == color).count()
    }
}

impl TryFrom<Vec<Cell>> for Board {
    type Error = RoomError;

    fn try_from(cells: Vec<Cell>) -> Result<Self, Self::Error> {
        Self::new(cells)
    }
}

impl From<Board> for Vec<Cell> {
    fn from(board: Board) -> Self {
        board.0
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// How many cells of each color a board of a given size gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLayout {
    pub starting_team: usize,
    pub other_team: usize,
    pub neutral: usize,
    pub assassin: usize,
}

impl BoardLayout {
    /// The classic 9/8/7/1 split for 25 cells, scaled to `size`.
    ///
    /// Each team gets at least one cell. `size` must be at least 3.
    pub fn for_size(size: usize) -> Self {
        let starting_team = (size * 9 / 25).max(1);
        let other_team = (size * 8 / 25).max(1);
        let assassin = 1;
        Self {
            starting_team,
            other_team,
            neutral: size.saturating_sub(starting_team + other_team + assassin),
            assassin,
        }
    }

    pub fn total(&self) -> usize {
        self.starting_team + self.other_team + self.neutral + self.assassin
    }

    /// The colors of this layout in a fixed order, ready for shuffling.
    pub fn colors(&self) -> Vec<CellColor> {
        let mut colors = Vec::with_capacity(self.total());
        colors.extend(std::iter::repeat_n(Team::STARTING.color(), self.starting_team));
        colors.extend(std::iter::repeat_n(
            Team::STARTING.other().color(),
            self.other_team,
        ));
        colors.extend(std::iter::repeat_n(CellColor::Neutral, self.neutral));
        colors.extend(std::iter::repeat_n(CellColor::Assassin, self.assassin));
        colors
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Produces the board for a new room. Called once per room creation.
pub trait BoardGenerator: Send + Sync + 'static {
    fn generate(&self, size: usize) -> Result<Board, RoomError>;
}

/// Draws distinct words from a pool and deals colors by [`BoardLayout`],
/// both shuffled.
#[derive(Debug, Clone)]
pub struct RandomBoardGenerator {
    words: Vec<String>,
}

impl RandomBoardGenerator {
    /// A generator over the built-in word pool.
    pub fn new() -> Self {
        Self::with_words(WORDS.iter().copied())
    }

    /// A generator over a custom word pool. Duplicates are removed.
    pub fn with_words<I, W>(words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        let mut words: Vec<String> = words.into_iter().map(Into::into).collect();
        words.sort();
        words.dedup();
        Self { words }
    }

    pub fn pool_size(&self) -> usize {
        self.words.len()
    }
}

impl Default for RandomBoardGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(&self, size: usize) -> Result<Board, RoomError> {
        if size < 3 {
            return Err(RoomError::InvalidBoard(format!(
                "a board needs at least 3 cells, got {size}"
            )));
        }
        if size > self.words.len() {
            return Err(RoomError::InvalidBoard(format!(
                "word pool has {} words, board needs {size}",
                self.words.len()
            )));
        }

        let mut rng = rand::rng();
        let mut words = self.words.clone();
        words.shuffle(&mut rng);
        let mut colors = BoardLayout::for_size(size).colors();
        colors.shuffle(&mut rng);

        let cells = words
            .into_iter()
            .zip(colors)
            .map(|(word, color)| Cell::new(word, color))
            .collect();
        Board::new(cells)
    }
}
