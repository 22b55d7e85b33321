use crate::grid::{Dir, Grid, Pos};

/// Frozen view of one tick, handed to the planner and to every ghost.
#[derive(Clone, Copy)]
pub struct World<'a> {
    pub grid: &'a Grid,
    pub player: Pos,
    /// Last direction the player actually moved in, if any.
    pub heading: Option<Dir>,
    pub ghosts: &'a [Pos],
}

impl<'a> World<'a> {
    pub fn new(grid: &'a Grid, player: Pos, ghosts: &'a [Pos]) -> Self {
        Self {
            grid,
            player,
            heading: None,
            ghosts,
        }
    }

    pub fn with_heading(mut self, heading: Option<Dir>) -> Self {
        self.heading = heading;
        self
    }

    /// Heading as a unit vector; zero before the first move.
    pub fn heading_delta(&self) -> (isize, isize) {
        self.heading.map_or((0, 0), Dir::delta)
    }

    pub fn near_ghost(&self, pos: Pos, radius: usize) -> bool {
        near_any(pos, self.ghosts, radius)
    }
}

pub(crate) fn near_any(pos: Pos, ghosts: &[Pos], radius: usize) -> bool {
    ghosts.iter().any(|g| g.manhattan(pos) <= radius)
}
