//! Sparse Game of Life engine on an unbounded grid.

pub mod cell;
pub mod enc;
pub mod engine;
pub mod input;
pub mod line;
pub mod stats;

pub use cell::Cell;
pub use enc::{DecodeError, RunLengthEncoded};
pub use engine::{
    Channel, DEFAULT_SPEED, Engine, EngineState, EngineWindow, RunState, SPEED_RANGE,
    Subscription, Ticker,
};
pub use input::{Brush, screen_to_cell};
pub use line::LineCells;
pub use stats::StatsRecorder;
