//! Board geometry and mark bookkeeping shared by the server and the client
//!
//! The same [`Board`] type backs both sides of the connection. The server keys
//! markers by player identity, while the client only ever sees colors on the
//! wire and therefore keys markers by [`Rgb`].

use std::fmt;
use thiserror::Error;

/// Smallest board the game can be played on
pub const MIN_BOARD_SIZE: usize = 2;
/// Largest board whose cell indices still fit in a single protocol byte
pub const MAX_BOARD_SIZE: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("board size {size} is outside 2..=16")]
    InvalidSize { size: usize },
    #[error("expected {expected} goal indices, got {actual}")]
    GoalCountMismatch { expected: usize, actual: usize },
    #[error("goal index {0} appears more than once")]
    DuplicateGoal(u8),
    #[error("cell index {index} is out of range for a board of {cells} cells")]
    IndexOutOfRange { index: usize, cells: usize },
}

/// A player color as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Row-major addressing for an N×N grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardGeometry {
    size: usize,
}

impl BoardGeometry {
    pub fn new(size: usize) -> Result<Self, BoardError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
            return Err(BoardError::InvalidSize { size });
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        self.size * self.size
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.cell_count()
    }

    pub fn row(&self, index: usize) -> usize {
        index / self.size
    }

    pub fn col(&self, index: usize) -> usize {
        index % self.size
    }

    /// Returns the index of `(row, col)`, or `None` when it lies off the board
    pub fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.size && col < self.size {
            Some(row * self.size + col)
        } else {
            None
        }
    }

    /// The cell the starting cluster is built around
    ///
    /// Odd boards have a true center. Even boards have none, so this is the
    /// upper-right cell of the central 2×2 block.
    pub fn middle(&self) -> usize {
        let cells = self.cell_count();
        if self.size % 2 == 1 {
            cells / 2
        } else {
            cells / 2 - self.size / 2
        }
    }

    /// Orthogonal neighbors inside the grid, in up/down/left/right order
    pub fn adjacent_indices(&self, index: usize) -> Vec<usize> {
        let row = self.row(index);
        let col = self.col(index);
        let mut adjacent = Vec::with_capacity(4);
        if row > 0 {
            adjacent.push(index - self.size);
        }
        if row + 1 < self.size {
            adjacent.push(index + self.size);
        }
        if col > 0 {
            adjacent.push(index - 1);
        }
        if col + 1 < self.size {
            adjacent.push(index + 1);
        }
        adjacent
    }

    /// Cells every viewer can always see on a fresh board
    pub fn starting_cluster(&self) -> Vec<usize> {
        let middle = self.middle();
        let mut cluster = vec![middle];
        if self.size % 2 == 1 {
            cluster.extend(self.adjacent_indices(middle));
        } else {
            cluster.push(middle - 1);
            cluster.push(middle + self.size);
            cluster.push(middle + self.size - 1);
        }
        cluster
    }
}

/// One board position: a fixed goal plus the markers currently claiming it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell<M> {
    goal_index: u8,
    markers: Vec<M>,
}

impl<M: PartialEq> Cell<M> {
    fn new(goal_index: u8) -> Self {
        Self {
            goal_index,
            markers: Vec::new(),
        }
    }

    pub fn goal_index(&self) -> u8 {
        self.goal_index
    }

    /// Markers in the order they were placed
    pub fn markers(&self) -> &[M] {
        &self.markers
    }

    pub fn is_marked_by(&self, marker: &M) -> bool {
        self.markers.contains(marker)
    }

    /// Adds `marker` if absent, removes it otherwise. Returns true when added.
    fn toggle(&mut self, marker: M) -> bool {
        if let Some(pos) = self.markers.iter().position(|m| *m == marker) {
            self.markers.remove(pos);
            false
        } else {
            self.markers.push(marker);
            true
        }
    }
}

/// Result of a single toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkOutcome<M> {
    /// True when the marker was placed, false when it was lifted
    pub added: bool,
    /// Markers left on the cell afterwards, in placement order
    pub markers: Vec<M>,
}

/// The N×N grid of cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board<M> {
    geometry: BoardGeometry,
    cells: Vec<Cell<M>>,
}

impl<M: PartialEq + Clone> Board<M> {
    /// Builds an unmarked board from a row-major goal assignment
    pub fn new(size: usize, goal_indices: &[u8]) -> Result<Self, BoardError> {
        let geometry = BoardGeometry::new(size)?;
        if goal_indices.len() != geometry.cell_count() {
            return Err(BoardError::GoalCountMismatch {
                expected: geometry.cell_count(),
                actual: goal_indices.len(),
            });
        }

        let mut seen = [false; 256];
        for &goal in goal_indices {
            if seen[goal as usize] {
                return Err(BoardError::DuplicateGoal(goal));
            }
            seen[goal as usize] = true;
        }

        Ok(Self {
            geometry,
            cells: goal_indices.iter().map(|&goal| Cell::new(goal)).collect(),
        })
    }

    pub fn geometry(&self) -> BoardGeometry {
        self.geometry
    }

    pub fn size(&self) -> usize {
        self.geometry.size()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, index: usize) -> Option<&Cell<M>> {
        self.cells.get(index)
    }

    pub fn cells(&self) -> &[Cell<M>] {
        &self.cells
    }

    pub fn goal_indices(&self) -> Vec<u8> {
        self.cells.iter().map(Cell::goal_index).collect()
    }

    /// Toggles `marker` on the cell at `index`
    pub fn mark(&mut self, index: usize, marker: M) -> Result<MarkOutcome<M>, BoardError> {
        let cells = self.cells.len();
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(BoardError::IndexOutOfRange { index, cells })?;

        let added = cell.toggle(marker);
        Ok(MarkOutcome {
            added,
            markers: cell.markers.clone(),
        })
    }

    pub fn is_marked_by(&self, index: usize, marker: &M) -> bool {
        self.cells
            .get(index)
            .is_some_and(|cell| cell.is_marked_by(marker))
    }

    /// Every cell carrying `marker`, in ascending index order
    pub fn indices_marked_by(&self, marker: &M) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_marked_by(marker))
            .map(|(index, _)| index)
            .collect()
    }
}
