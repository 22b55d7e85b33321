//! Pac-Man played by a genetic-algorithm planner against path-finding ghosts.

pub mod config;
pub mod error;
pub mod fitness;
pub mod game;
pub mod genetics;
pub mod ghost;
pub mod grid;
pub mod pathfinder;
pub mod planner;
pub mod world;

pub use config::{Difficulty, FitnessMode, FitnessWeights, GameConfig, PlannerConfig};
pub use error::{ConfigError, LevelError};
pub use game::{Outcome, Session};
pub use grid::{Dir, Grid, Pos, DEFAULT_LAYOUT};
pub use planner::{FitnessHistory, Planner, PlannerState};
