//! Byte-exact wire format spoken between the board server and its clients
//!
//! ```text
//! join request  (client -> server, once)   [role:1] ([R:1][G:1][B:1] when role = 0)
//! snapshot      (server -> client, once)   [N:1] [goal:1]*N² ([count:1] ([R][G][B])*count)*N²
//! mark request  (client -> server)         [index:1]
//! delta         (server -> client)         ([index:1][R:1][G:1][B:1])+
//! ```
//!
//! Every field is a single byte; colors are sent in R, G, B order.

use crate::board::{Rgb, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

pub const ROLE_PLAYER: u8 = 0;
pub const ROLE_SPECTATOR: u8 = 1;
/// Length of one `index + color` unit in a delta message
pub const DELTA_UNIT_LEN: usize = 4;
/// Most markers a snapshot can describe for one cell; the count is one byte
pub const MAX_CELL_MARKERS: usize = u8::MAX as usize;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("peer disconnected while sending the {stage}")]
    EarlyDisconnect { stage: &'static str },
    #[error("unknown role byte {0}")]
    InvalidRole(u8),
    #[error("board size {0} is outside 2..=16")]
    InvalidBoardSize(u8),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

fn read_error(stage: &'static str) -> impl FnOnce(io::Error) -> ProtocolError {
    move |err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ProtocolError::EarlyDisconnect { stage }
        } else {
            ProtocolError::Io(err)
        }
    }
}

/// First message on every connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRequest {
    Player { color: Rgb },
    Spectator,
}

impl JoinRequest {
    pub fn color(&self) -> Option<Rgb> {
        match self {
            JoinRequest::Player { color } => Some(*color),
            JoinRequest::Spectator => None,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            JoinRequest::Player { color } => {
                let mut bytes = vec![ROLE_PLAYER];
                bytes.extend_from_slice(&color.to_bytes());
                bytes
            }
            JoinRequest::Spectator => vec![ROLE_SPECTATOR],
        }
    }

    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, ProtocolError> {
        let role = reader.read_u8().await.map_err(read_error("join role"))?;
        match role {
            ROLE_PLAYER => {
                let mut color = [0u8; 3];
                reader
                    .read_exact(&mut color)
                    .await
                    .map_err(read_error("player color"))?;
                Ok(JoinRequest::Player {
                    color: Rgb::from_bytes(color),
                })
            }
            ROLE_SPECTATOR => Ok(JoinRequest::Spectator),
            other => Err(ProtocolError::InvalidRole(other)),
        }
    }
}

/// Full board state handed to a client right after it joins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub size: u8,
    /// Row-major goal assignment, one byte per cell
    pub goal_indices: Vec<u8>,
    /// Colors currently marking each cell, row-major
    pub markers: Vec<Vec<Rgb>>,
}

impl Snapshot {
    pub fn cell_count(&self) -> usize {
        self.size as usize * self.size as usize
    }

    pub fn encode(&self) -> Vec<u8> {
        let marker_bytes: usize = self.markers.iter().map(|m| 1 + m.len() * 3).sum();
        let mut bytes = Vec::with_capacity(1 + self.goal_indices.len() + marker_bytes);
        bytes.push(self.size);
        bytes.extend_from_slice(&self.goal_indices);
        for colors in &self.markers {
            bytes.push(colors.len() as u8);
            for color in colors {
                bytes.extend_from_slice(&color.to_bytes());
            }
        }
        bytes
    }

    /// Reads a whole snapshot, however it happens to be split across reads
    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, ProtocolError> {
        let size = reader.read_u8().await.map_err(read_error("board size"))?;
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&(size as usize)) {
            return Err(ProtocolError::InvalidBoardSize(size));
        }
        let cells = size as usize * size as usize;

        let mut goal_indices = vec![0u8; cells];
        reader
            .read_exact(&mut goal_indices)
            .await
            .map_err(read_error("goal assignment"))?;

        let mut markers = Vec::with_capacity(cells);
        for _ in 0..cells {
            let count = reader.read_u8().await.map_err(read_error("marker table"))?;
            let mut raw = vec![0u8; count as usize * 3];
            reader
                .read_exact(&mut raw)
                .await
                .map_err(read_error("marker table"))?;
            markers.push(
                raw.chunks_exact(3)
                    .map(|c| Rgb::new(c[0], c[1], c[2]))
                    .collect(),
            );
        }

        Ok(Snapshot {
            size,
            goal_indices,
            markers,
        })
    }
}

/// Single-byte request to toggle the sender's own mark on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkRequest {
    pub index: u8,
}

impl MarkRequest {
    pub fn encode(&self) -> [u8; 1] {
        [self.index]
    }
}

/// One toggle broadcast by the server: cell index plus the toggling color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaUnit {
    pub index: u8,
    pub color: Rgb,
}

impl DeltaUnit {
    pub fn new(index: u8, color: Rgb) -> Self {
        Self { index, color }
    }

    pub fn encode(&self) -> [u8; DELTA_UNIT_LEN] {
        let [r, g, b] = self.color.to_bytes();
        [self.index, r, g, b]
    }

    pub fn decode(bytes: [u8; DELTA_UNIT_LEN]) -> Self {
        Self::new(bytes[0], Rgb::new(bytes[1], bytes[2], bytes[3]))
    }
}

pub fn encode_deltas(units: &[DeltaUnit]) -> Vec<u8> {
    units.iter().flat_map(|unit| unit.encode()).collect()
}

/// Reassembles delta units from arbitrarily split reads
///
/// Bytes are buffered until a full unit is available; a partial unit is never
/// handed out.
#[derive(Debug, Default)]
pub struct DeltaDecoder {
    buffer: Vec<u8>,
}

impl DeltaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Bytes held back because they do not yet form a whole unit
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn next_unit(&mut self) -> Option<DeltaUnit> {
        if self.buffer.len() < DELTA_UNIT_LEN {
            return None;
        }
        let mut unit = [0u8; DELTA_UNIT_LEN];
        unit.copy_from_slice(&self.buffer[..DELTA_UNIT_LEN]);
        self.buffer.drain(..DELTA_UNIT_LEN);
        Some(DeltaUnit::decode(unit))
    }
}

impl Iterator for DeltaDecoder {
    type Item = DeltaUnit;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_unit()
    }
}
