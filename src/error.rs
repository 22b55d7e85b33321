use thiserror::Error;

use crate::grid::Pos;

/// Errors raised while loading a maze layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("layout has no rows")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown symbol {symbol:?} at ({x}, {y})")]
    UnknownSymbol { symbol: char, x: usize, y: usize },

    #[error("layout has no player spawn marker 'P'")]
    MissingPlayerSpawn,

    #[error("second player spawn at {second} (first at {first})")]
    DuplicatePlayerSpawn { first: Pos, second: Pos },

    #[error("row {row} has {count} teleporters, expected a pair")]
    UnpairedTeleporter { row: usize, count: usize },
}

/// Errors raised by configuration validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("population size must be at least 1")]
    ZeroPopulation,

    #[error("chromosome length {0} is too short, need at least 2 genes")]
    ChromosomeTooShort(usize),

    #[error("mutation rate {0} is outside [0, 1]")]
    MutationRate(f64),

    #[error("unknown difficulty {0:?}")]
    UnknownDifficulty(String),

    #[error("a session needs at least one level")]
    ZeroLevels,
}
