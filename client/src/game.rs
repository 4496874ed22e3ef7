//! Client-side mirror of the board with local fog-of-war
//!
//! The wire format only carries colors, so the mirror keys markers by color.
//! Two players sharing a color are therefore indistinguishable here.

use log::debug;
use shared::{Board, BoardError, BoardGeometry, Rgb, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Invisible,
    Visible,
    /// Never hidden again
    Always,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        !matches!(self, Visibility::Invisible)
    }
}

/// What a single applied mark changed, for the UI to redraw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEvent {
    pub index: usize,
    pub color: Rgb,
    pub added: bool,
    /// Colors left on the cell, sorted
    pub markers: Vec<Rgb>,
    /// Cells this mark revealed
    pub exposed: Vec<usize>,
    /// Cells this mark hid again
    pub hidden: Vec<usize>,
}

pub struct ClientBoard {
    board: Board<Rgb>,
    visibility: Vec<Visibility>,
    /// `None` when spectating
    own_color: Option<Rgb>,
}

impl ClientBoard {
    /// Fresh, unmarked board. Spectators see every cell.
    pub fn new(size: usize, goal_indices: &[u8], own_color: Option<Rgb>) -> Result<Self, BoardError> {
        let board = Board::new(size, goal_indices)?;
        let visibility = if own_color.is_none() {
            vec![Visibility::Always; board.cell_count()]
        } else {
            let mut visibility = vec![Visibility::Invisible; board.cell_count()];
            for index in board.geometry().starting_cluster() {
                visibility[index] = Visibility::Always;
            }
            visibility
        };

        Ok(Self {
            board,
            visibility,
            own_color,
        })
    }

    /// Builds the mirror from the join snapshot, replaying every marker
    pub fn from_snapshot(snapshot: &Snapshot, own_color: Option<Rgb>) -> Result<Self, BoardError> {
        let mut board = Self::new(snapshot.size as usize, &snapshot.goal_indices, own_color)?;
        for (index, colors) in snapshot.markers.iter().enumerate() {
            for &color in colors {
                board.initial_mark(index, color)?;
            }
        }
        Ok(board)
    }

    /// Replays a marker received during the handshake
    pub fn initial_mark(&mut self, index: usize, color: Rgb) -> Result<BoardEvent, BoardError> {
        self.apply_mark(index, color)
    }

    /// Toggles `color` on a cell and updates fog-of-war for the own color
    pub fn apply_mark(&mut self, index: usize, color: Rgb) -> Result<BoardEvent, BoardError> {
        let outcome = self.board.mark(index, color)?;
        let mut markers = outcome.markers;
        markers.sort();

        let mut exposed = Vec::new();
        let mut hidden = Vec::new();
        if Some(color) == self.own_color {
            if outcome.added {
                exposed = self.explore_surrounding(index);
            } else {
                hidden = self.unexplore_surrounding(index, color);
            }
        }

        debug!(
            "Cell {} {} by {} (exposed {:?}, hidden {:?})",
            index,
            if outcome.added { "marked" } else { "unmarked" },
            color,
            exposed,
            hidden
        );

        Ok(BoardEvent {
            index,
            color,
            added: outcome.added,
            markers,
            exposed,
            hidden,
        })
    }

    fn explore_surrounding(&mut self, index: usize) -> Vec<usize> {
        let mut exposed = Vec::new();
        for adjacent in self.geometry().adjacent_indices(index) {
            if self.visibility[adjacent] == Visibility::Invisible {
                self.visibility[adjacent] = Visibility::Visible;
                exposed.push(adjacent);
            }
        }
        exposed
    }

    fn unexplore_surrounding(&mut self, index: usize, color: Rgb) -> Vec<usize> {
        let mut hidden = Vec::new();
        for adjacent in self.geometry().adjacent_indices(index) {
            if self.visibility[adjacent] == Visibility::Visible
                && !self.surrounded_by(adjacent, color)
            {
                self.visibility[adjacent] = Visibility::Invisible;
                hidden.push(adjacent);
            }
        }
        hidden
    }

    /// True when some neighbor of `index` still carries `color`
    fn surrounded_by(&self, index: usize, color: Rgb) -> bool {
        self.geometry()
            .adjacent_indices(index)
            .into_iter()
            .any(|adjacent| self.board.is_marked_by(adjacent, &color))
    }

    pub fn geometry(&self) -> BoardGeometry {
        self.board.geometry()
    }

    pub fn size(&self) -> usize {
        self.board.size()
    }

    pub fn board(&self) -> &Board<Rgb> {
        &self.board
    }

    pub fn own_color(&self) -> Option<Rgb> {
        self.own_color
    }

    pub fn visibility(&self, index: usize) -> Option<Visibility> {
        self.visibility.get(index).copied()
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visibility(index).is_some_and(Visibility::is_visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREEN: Rgb = Rgb::new(0, 255, 0);

    fn player_board(size: usize) -> ClientBoard {
        let goals: Vec<u8> = (0..(size * size) as u8).collect();
        ClientBoard::new(size, &goals, Some(RED)).unwrap()
    }

    fn visible_cells(board: &ClientBoard) -> Vec<usize> {
        (0..board.board().cell_count())
            .filter(|&i| board.is_visible(i))
            .collect()
    }

    #[test]
    fn test_starting_cluster_is_always_visible() {
        let board = player_board(3);
        assert_eq!(visible_cells(&board), vec![1, 3, 4, 5, 7]);
        assert_eq!(board.visibility(4), Some(Visibility::Always));
        assert_eq!(board.visibility(0), Some(Visibility::Invisible));
        assert_eq!(board.visibility(9), None);
    }

    #[test]
    fn test_spectator_sees_everything() {
        let goals: Vec<u8> = (0..16).collect();
        let board = ClientBoard::new(4, &goals, None).unwrap();
        assert_eq!(visible_cells(&board).len(), 16);
        assert!((0..16).all(|i| board.visibility(i) == Some(Visibility::Always)));
    }

    #[test]
    fn test_own_mark_exposes_neighbors() {
        let mut board = player_board(3);
        let event = board.apply_mark(1, RED).unwrap();

        assert!(event.added);
        assert_eq!(event.markers, vec![RED]);
        // 4 is always visible, only the corners open up
        assert_eq!(event.exposed, vec![0, 2]);
        assert_eq!(board.visibility(0), Some(Visibility::Visible));
        assert_eq!(board.visibility(2), Some(Visibility::Visible));
    }

    #[test]
    fn test_own_unmark_hides_unsupported_neighbors() {
        let mut board = player_board(3);
        board.apply_mark(1, RED).unwrap();
        board.apply_mark(5, RED).unwrap();

        // 2 is still next to the mark on 5, 0 is not
        let event = board.apply_mark(1, RED).unwrap();
        assert!(!event.added);
        assert!(event.markers.is_empty());
        assert_eq!(event.hidden, vec![0]);
        assert_eq!(board.visibility(0), Some(Visibility::Invisible));
        assert_eq!(board.visibility(2), Some(Visibility::Visible));

        let event = board.apply_mark(5, RED).unwrap();
        assert_eq!(event.hidden, vec![2, 8]);
    }

    #[test]
    fn test_always_visible_cells_never_revert() {
        let mut board = player_board(3);
        for _ in 0..3 {
            board.apply_mark(4, RED).unwrap();
            board.apply_mark(4, RED).unwrap();
            board.apply_mark(1, RED).unwrap();
            board.apply_mark(1, RED).unwrap();
        }
        for index in [1, 3, 4, 5, 7] {
            assert_eq!(board.visibility(index), Some(Visibility::Always));
        }
    }

    #[test]
    fn test_other_colors_do_not_touch_visibility() {
        let mut board = player_board(3);
        let event = board.apply_mark(1, GREEN).unwrap();
        assert!(event.exposed.is_empty());
        assert_eq!(board.visibility(0), Some(Visibility::Invisible));

        board.apply_mark(1, RED).unwrap();
        let event = board.apply_mark(1, GREEN).unwrap();
        assert!(event.hidden.is_empty());
        assert_eq!(board.visibility(0), Some(Visibility::Visible));
    }

    #[test]
    fn test_markers_sorted_in_events() {
        let mut board = player_board(2);
        board.apply_mark(0, RED).unwrap();
        let event = board.apply_mark(0, GREEN).unwrap();
        assert_eq!(event.markers, vec![GREEN, RED]);
    }

    #[test]
    fn test_from_snapshot_replays_own_marks() {
        let snapshot = Snapshot {
            size: 3,
            goal_indices: (0..9).collect(),
            markers: vec![
                vec![],
                vec![RED],
                vec![],
                vec![GREEN],
                vec![],
                vec![],
                vec![],
                vec![],
                vec![],
            ],
        };

        let board = ClientBoard::from_snapshot(&snapshot, Some(RED)).unwrap();
        assert!(board.board().is_marked_by(1, &RED));
        assert!(board.board().is_marked_by(3, &GREEN));
        assert_eq!(board.visibility(0), Some(Visibility::Visible));
        assert_eq!(board.visibility(2), Some(Visibility::Visible));
        assert_eq!(board.visibility(6), Some(Visibility::Invisible));
    }

    #[test]
    fn test_out_of_range_mark_is_an_error() {
        let mut board = player_board(2);
        assert!(matches!(
            board.apply_mark(4, RED),
            Err(BoardError::IndexOutOfRange { index: 4, cells: 4 })
        ));
    }
}
