use em_core::{CoreError, Day};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedingError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("seeding event scheduled on negative {0}")]
    NegativeDay(Day),

    #[error("seeding event on {day} has invalid amount {amount}")]
    InvalidAmount { day: Day, amount: f64 },

    #[error("day pointer is not monotonic at entry {0}")]
    DayPointer(usize),
}

pub type SeedingResult<T> = Result<T, SeedingError>;
