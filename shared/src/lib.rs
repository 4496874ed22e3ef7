//! Types and wire format shared by the board server and its clients

pub mod board;
pub mod generator;
pub mod goals;
pub mod protocol;

pub use board::{
    Board, BoardError, BoardGeometry, Cell, MarkOutcome, Rgb, MAX_BOARD_SIZE, MIN_BOARD_SIZE,
};
pub use generator::{BoardGenerator, GeneratorError};
pub use goals::{GoalError, GoalList};
pub use protocol::{
    encode_deltas, DeltaDecoder, DeltaUnit, JoinRequest, MarkRequest, ProtocolError, Snapshot,
    MAX_CELL_MARKERS,
};

/// Default port the server listens on
pub const DEFAULT_PORT: u16 = 8080;
