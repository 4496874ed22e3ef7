//! Authoritative board state for the server
//!
//! Holds the board with one marker per player identity and the registry of
//! every player that has joined, in join order. Each operation returns what
//! has to be broadcast; sending it is left to the network layer.

use crate::identity::Identity;
use log::{debug, info};
use shared::{Board, BoardError, DeltaUnit, Rgb, Snapshot, MAX_CELL_MARKERS};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("no player registered for identity {0}")]
    UnknownPlayer(Identity),
    #[error("cell {index} already carries {max} markers")]
    CellFull { index: usize, max: usize },
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// A registered player and the color their marks are shown in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub identity: Identity,
    pub color: Rgb,
}

/// Authoritative board plus the players that have ever joined it
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board<Identity>,
    /// Join order; also the marker order inside snapshots
    players: Vec<Player>,
}

impl GameState {
    /// Wraps a freshly generated board with an empty player registry
    pub fn new(board: Board<Identity>) -> Self {
        Self {
            board,
            players: Vec::new(),
        }
    }

    /// The canonical board, with markers keyed by player identity
    pub fn board(&self) -> &Board<Identity> {
        &self.board
    }

    /// Every player that has joined so far, in join order
    ///
    /// Players are never removed: a disconnected player keeps their marks and
    /// gets them back, recolored if needed, when the same identity rejoins.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Current color of a registered player
    pub fn player_color(&self, identity: &Identity) -> Option<Rgb> {
        self.players
            .iter()
            .find(|player| player.identity == *identity)
            .map(|player| player.color)
    }

    /// Registers a player, or updates the color of a returning one
    ///
    /// For a returning player the result holds, per cell they marked, an
    /// unmark in the old color followed by a mark in the new one. Observers
    /// that toggle these units in order end up with the new color only.
    pub fn join_player(&mut self, identity: Identity, color: Rgb) -> Vec<DeltaUnit> {
        let marked = self.board.indices_marked_by(&identity);
        let Some(player) = self.players.iter_mut().find(|p| p.identity == identity) else {
            info!("Player {} joined with color {}", identity, color);
            self.players.push(Player { identity, color });
            return Vec::new();
        };

        let old_color = player.color;
        player.color = color;
        info!(
            "Player {} rejoined, recoloring {} cells from {} to {}",
            identity,
            marked.len(),
            old_color,
            color
        );

        marked
            .into_iter()
            .flat_map(|index| {
                let index = index as u8;
                [
                    DeltaUnit::new(index, old_color),
                    DeltaUnit::new(index, color),
                ]
            })
            .collect()
    }

    /// Toggles `identity`'s mark and returns the unit to broadcast
    ///
    /// A mark that would put more than [`MAX_CELL_MARKERS`] markers on one
    /// cell is refused, since snapshots could no longer describe that cell.
    /// Unmarking a full cell is always allowed.
    pub fn mark(&mut self, identity: &Identity, index: usize) -> Result<DeltaUnit, GameError> {
        let color = self
            .player_color(identity)
            .ok_or_else(|| GameError::UnknownPlayer(identity.clone()))?;

        if let Some(cell) = self.board.cell(index) {
            if !cell.is_marked_by(identity) && cell.markers().len() >= MAX_CELL_MARKERS {
                return Err(GameError::CellFull {
                    index,
                    max: MAX_CELL_MARKERS,
                });
            }
        }
        let outcome = self.board.mark(index, identity.clone())?;

        debug!(
            "Player {} {} cell {} ({} markers)",
            identity,
            if outcome.added { "marked" } else { "unmarked" },
            index,
            outcome.markers.len()
        );
        Ok(DeltaUnit::new(index as u8, color))
    }

    /// Current board as sent to a joining client
    ///
    /// Markers of each cell are listed in player join order, so two snapshots
    /// of the same state are byte-identical.
    pub fn snapshot(&self) -> Snapshot {
        let markers = self
            .board
            .cells()
            .iter()
            .map(|cell| {
                self.players
                    .iter()
                    .filter(|player| cell.is_marked_by(&player.identity))
                    .map(|player| player.color)
                    .collect()
            })
            .collect();

        Snapshot {
            size: self.board.size() as u8,
            goal_indices: self.board.goal_indices(),
            markers,
        }
    }
}
