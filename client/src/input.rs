//! Turning user input into board cell indices

use shared::BoardGeometry;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mark(usize),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("cell {0} is not on the board")]
    OffBoard(usize),
}

pub const HELP: &str = "\
commands:
  <index> | mark <index>   toggle your mark on a cell
  <row> <col>              toggle your mark on the cell at row, col
  show                     print the board
  help                     print this help
  quit                     leave";

fn parse_number(word: &str) -> Result<usize, InputError> {
    word.parse()
        .map_err(|_| InputError::NotANumber(word.to_string()))
}

/// Parses one line typed by the user
pub fn parse_command(line: &str, geometry: BoardGeometry) -> Result<Command, InputError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let index = match words.as_slice() {
        [] => return Err(InputError::Empty),
        ["show" | "s"] => return Ok(Command::Show),
        ["help" | "h" | "?"] => return Ok(Command::Help),
        ["quit" | "q" | "exit"] => return Ok(Command::Quit),
        ["mark" | "m", index] => parse_number(index)?,
        [row, col] => {
            let (row, col) = (parse_number(row)?, parse_number(col)?);
            geometry.index(row, col).ok_or(InputError::OffBoard(
                row.saturating_mul(geometry.size()).saturating_add(col),
            ))?
        }
        [word] => match parse_number(word) {
            Ok(index) => index,
            Err(_) => return Err(InputError::Unknown(word.to_string())),
        },
        _ => return Err(InputError::Unknown(line.trim().to_string())),
    };

    if geometry.contains(index) {
        Ok(Command::Mark(index))
    } else {
        Err(InputError::OffBoard(index))
    }
}

/// Maps a click at `(x, y)` on a `width`×`height` canvas to a cell index
pub fn cell_at_point(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    geometry: BoardGeometry,
) -> Option<usize> {
    if !(0.0..width).contains(&x) || !(0.0..height).contains(&y) {
        return None;
    }
    let size = geometry.size() as f32;
    let col = (x * size / width) as usize;
    let row = (y * size / height) as usize;
    geometry.index(row, col)
}
