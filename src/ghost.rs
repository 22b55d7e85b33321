//! Ghost roster, target selection and path following.

use std::collections::VecDeque;

use tracing::trace;

use crate::grid::{Dir, Grid, Pos};
use crate::pathfinder::{frontier_search, Frontier, Path};
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GhostKind {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostKind {
    pub const ALL: [GhostKind; 4] = [
        GhostKind::Blinky,
        GhostKind::Pinky,
        GhostKind::Inky,
        GhostKind::Clyde,
    ];

    /// Layout symbol that spawns this ghost.
    pub fn from_marker(symbol: char) -> Option<Self> {
        match symbol {
            'R' => Some(GhostKind::Blinky),
            'L' => Some(GhostKind::Pinky),
            'I' => Some(GhostKind::Inky),
            'C' => Some(GhostKind::Clyde),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GhostKind::Blinky => "blinky",
            GhostKind::Pinky => "pinky",
            GhostKind::Inky => "inky",
            GhostKind::Clyde => "clyde",
        }
    }

    pub fn strategy(self) -> Box<dyn GhostStrategy> {
        match self {
            GhostKind::Blinky => Box::new(Direct),
            GhostKind::Pinky => Box::new(InterceptAhead { lookahead: 4 }),
            GhostKind::Inky => Box::new(AmbushOffset { radius: 2 }),
            GhostKind::Clyde => Box::new(Wanderer),
        }
    }
}

/// Picks a target tile and the search used to reach it.
pub trait GhostStrategy: Send + Sync {
    fn calculate_goal(&self, world: &World<'_>) -> Pos;

    fn frontier(&self) -> Frontier;

    fn preferred_search(&self, grid: &Grid, start: Pos, goal: Pos) -> Path {
        frontier_search(grid, start, goal, self.frontier())
    }
}

/// Chases the player's tile along a shortest path.
pub struct Direct;

impl GhostStrategy for Direct {
    fn calculate_goal(&self, world: &World<'_>) -> Pos {
        world.player
    }

    fn frontier(&self) -> Frontier {
        Frontier::Fifo
    }
}

/// Aims diagonally off the player, on the side of its heading, and gets
/// there by depth-first search.
pub struct AmbushOffset {
    pub radius: isize,
}

impl GhostStrategy for AmbushOffset {
    fn calculate_goal(&self, world: &World<'_>) -> Pos {
        let (dx, dy) = world.heading_delta();
        let ox = if dx >= 0 { self.radius } else { -self.radius };
        let oy = if dy >= 0 { self.radius } else { -self.radius };
        clamp_to_grid(
            world.grid,
            world.player.x as isize + ox,
            world.player.y as isize + oy,
        )
    }

    fn frontier(&self) -> Frontier {
        Frontier::Lifo
    }
}

/// Aims `lookahead` tiles ahead of the player.
pub struct InterceptAhead {
    pub lookahead: isize,
}

impl GhostStrategy for InterceptAhead {
    fn calculate_goal(&self, world: &World<'_>) -> Pos {
        let (dx, dy) = world.heading_delta();
        clamp_to_grid(
            world.grid,
            world.player.x as isize + dx * self.lookahead,
            world.player.y as isize + dy * self.lookahead,
        )
    }

    fn frontier(&self) -> Frontier {
        Frontier::Fifo
    }
}

/// Chases the player's tile along whatever route depth-first search finds.
pub struct Wanderer;

impl GhostStrategy for Wanderer {
    fn calculate_goal(&self, world: &World<'_>) -> Pos {
        world.player
    }

    fn frontier(&self) -> Frontier {
        Frontier::Lifo
    }
}

fn clamp_to_grid(grid: &Grid, x: isize, y: isize) -> Pos {
    let max_x = grid.width().saturating_sub(1) as isize;
    let max_y = grid.height().saturating_sub(1) as isize;
    Pos::new(x.clamp(0, max_x) as usize, y.clamp(0, max_y) as usize)
}

pub struct Ghost {
    kind: GhostKind,
    pos: Pos,
    spawn: Pos,
    path: VecDeque<Pos>,
    strategy: Box<dyn GhostStrategy>,
}

impl Ghost {
    pub fn new(kind: GhostKind, spawn: Pos) -> Self {
        Self {
            kind,
            pos: spawn,
            spawn,
            path: VecDeque::new(),
            strategy: kind.strategy(),
        }
    }

    pub fn kind(&self) -> GhostKind {
        self.kind
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// Tiles still queued, next one first.
    pub fn path(&self) -> &VecDeque<Pos> {
        &self.path
    }

    /// Advances one tile. Replans only once the stored path is used up.
    ///
    /// Returns the direction taken, or `None` when holding position.
    pub fn step(&mut self, world: &World<'_>) -> Option<Dir> {
        if self.path.is_empty() {
            let goal = self.strategy.calculate_goal(world);
            self.path = self
                .strategy
                .preferred_search(world.grid, self.pos, goal)
                .into();
            trace!(ghost = self.kind.name(), %goal, len = self.path.len(), "replanned");
        }
        let next = self.path.pop_front()?;
        let dir = Dir::between(self.pos, next);
        self.pos = next;
        dir
    }

    pub fn respawn(&mut self) {
        self.pos = self.spawn;
        self.path.clear();
    }
}
