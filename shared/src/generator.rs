//! Seeded assignment of goals to board cells

use crate::board::{Board, BoardError, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

/// Goal indices travel as single bytes, so only this many goals are addressable
pub const MAX_GOAL_POOL: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("board size {size} is below the minimum of {min}")]
    TooSmall { size: usize, min: usize },
    #[error("board size {size} needs more goals than available (max size {max})")]
    TooLarge { size: usize, max: usize },
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Deterministic goal shuffler
///
/// The same seed and the same goal count always produce the same assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardGenerator {
    seed: u64,
}

impl BoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Picks a fresh seed and logs it so the board can be reproduced later
    pub fn from_entropy() -> Self {
        let seed = u64::from(rand::random::<u32>());
        info!("Generating board with seed {}", seed);
        Self::new(seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Largest board that can be filled without repeating a goal
    pub fn max_board_size(goal_count: usize) -> usize {
        let pool = goal_count.min(MAX_GOAL_POOL);
        let mut size = 0;
        while (size + 1) * (size + 1) <= pool {
            size += 1;
        }
        size.min(MAX_BOARD_SIZE)
    }

    /// Returns `size²` distinct goal indices in row-major cell order
    pub fn generate(&self, goal_count: usize, size: usize) -> Result<Vec<u8>, GeneratorError> {
        if size < MIN_BOARD_SIZE {
            return Err(GeneratorError::TooSmall {
                size,
                min: MIN_BOARD_SIZE,
            });
        }
        let max = Self::max_board_size(goal_count);
        if size > max {
            return Err(GeneratorError::TooLarge { size, max });
        }

        let pool = goal_count.min(MAX_GOAL_POOL);
        let mut indices: Vec<u8> = (0..pool).map(|i| i as u8).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);
        indices.truncate(size * size);
        Ok(indices)
    }

    pub fn generate_board<M: PartialEq + Clone>(
        &self,
        goal_count: usize,
        size: usize,
    ) -> Result<Board<M>, GeneratorError> {
        let indices = self.generate(goal_count, size)?;
        Ok(Board::new(size, &indices)?)
    }
}
