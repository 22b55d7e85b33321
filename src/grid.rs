//! Static maze structure plus the mutable pellet layer.

use std::collections::HashMap;
use std::fmt;

use crate::error::LevelError;
use crate::ghost::GhostKind;

/// The built-in 21x21 maze. `T` cells on row 9 form the teleporter pair.
pub const DEFAULT_LAYOUT: [&str; 21] = [
    "WWWWWWWWWWWWWWWWWWWWW",
    "W........WWW........W",
    "W.WWWWWW.WWW.WWWWWW.W",
    "W...................W",
    "W.WW.W.WWWWWWW.W.WW.W",
    "W....W....W....W....W",
    "WWWW.WWWW.W.WWWW.WWWW",
    "WWWW.W         W.WWWW",
    "WWWW.W WWW WWW W.WWWW",
    "WTP... WIR LCW ... TW",
    "WWWW.W WWWWWWW W.WWWW",
    "WWWW.W         W.WWWW",
    "WWWW.W.WWWWWWW.W.WWWW",
    "W.........W.........W",
    "W.WW.WWWW.W.WWWW.WW.W",
    "W..W.............W..W",
    "WW.W.W.WWWWWWW.W.W.WW",
    "W....W....W....W....W",
    "W.WWWWWWW.W.WWWWWWW.W",
    "W...................W",
    "WWWWWWWWWWWWWWWWWWWWW",
];

/// Static kind of a cell. Never changes after load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Floor,
    Teleporter,
}

/// Dynamic content of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Content {
    Pellet,
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Pos) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Shifts by a signed offset. `None` if either coordinate would go negative.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Pos> {
        Some(Pos {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }

    pub fn step(self, dir: Dir) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A move symbol. Doubles as the gene alphabet of the planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    /// Direction of a single orthogonal step from `from` to `to`.
    pub fn between(from: Pos, to: Pos) -> Option<Dir> {
        let dx = to.x as isize - from.x as isize;
        let dy = to.y as isize - from.y as isize;
        match (dx, dy) {
            (1, 0) => Some(Dir::Right),
            (-1, 0) => Some(Dir::Left),
            (0, 1) => Some(Dir::Down),
            (0, -1) => Some(Dir::Up),
            _ => None,
        }
    }
}

pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
    initial: Vec<Content>,
    content: Vec<Content>,
    teleporters: HashMap<Pos, Pos>,
    player_spawn: Pos,
    ghost_spawns: Vec<(GhostKind, Pos)>,
}

impl Grid {
    /// Parses a layout of single-character symbols.
    ///
    /// `W` wall, `.` pellet, `T` teleporter, ` ` open floor, `P` player spawn and
    /// `R`/`L`/`I`/`C` ghost spawns. Spawn markers become open floor once read.
    pub fn load<I, S>(rows: I) -> Result<Grid, LevelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows: Vec<Vec<char>> = rows
            .into_iter()
            .map(|row| row.as_ref().chars().collect())
            .collect();
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(LevelError::Empty);
        }

        let mut tiles = Vec::with_capacity(width * height);
        let mut initial = Vec::with_capacity(width * height);
        let mut player_spawn: Option<Pos> = None;
        let mut ghost_spawns = Vec::new();
        let mut teleporters = HashMap::new();

        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(LevelError::RaggedRow {
                    row: y,
                    expected: width,
                    found: row.len(),
                });
            }
            let mut row_teleporters = Vec::new();
            for (x, &symbol) in row.iter().enumerate() {
                let pos = Pos { x, y };
                let (tile, content) = match symbol {
                    'W' => (Tile::Wall, Content::Empty),
                    '.' => (Tile::Floor, Content::Pellet),
                    ' ' => (Tile::Floor, Content::Empty),
                    'T' => {
                        row_teleporters.push(pos);
                        (Tile::Teleporter, Content::Empty)
                    }
                    'P' => {
                        if let Some(first) = player_spawn {
                            return Err(LevelError::DuplicatePlayerSpawn { first, second: pos });
                        }
                        player_spawn = Some(pos);
                        (Tile::Floor, Content::Empty)
                    }
                    other => match GhostKind::from_marker(other) {
                        Some(kind) => {
                            ghost_spawns.push((kind, pos));
                            (Tile::Floor, Content::Empty)
                        }
                        None => return Err(LevelError::UnknownSymbol { symbol: other, x, y }),
                    },
                };
                tiles.push(tile);
                initial.push(content);
            }
            match row_teleporters.as_slice() {
                [] => {}
                [a, b] => {
                    teleporters.insert(*a, *b);
                    teleporters.insert(*b, *a);
                }
                rest => {
                    return Err(LevelError::UnpairedTeleporter {
                        row: y,
                        count: rest.len(),
                    })
                }
            }
        }

        let player_spawn = player_spawn.ok_or(LevelError::MissingPlayerSpawn)?;
        Ok(Grid {
            width,
            height,
            tiles,
            content: initial.clone(),
            initial,
            teleporters,
            player_spawn,
            ghost_spawns,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    pub(crate) fn index(&self, pos: Pos) -> usize {
        pos.y * self.width + pos.x
    }

    pub fn tile(&self, pos: Pos) -> Option<Tile> {
        self.in_bounds(pos).then(|| self.tiles[self.index(pos)])
    }

    pub fn is_walkable(&self, pos: Pos) -> bool {
        matches!(self.tile(pos), Some(Tile::Floor | Tile::Teleporter))
    }

    /// Adjacent in-bounds cell, walkable or not.
    pub fn neighbor(&self, pos: Pos, dir: Dir) -> Option<Pos> {
        pos.step(dir).filter(|next| self.in_bounds(*next))
    }

    /// Where an agent at `pos` ends up after trying `dir`.
    ///
    /// Blocked moves leave the agent in place; landing on a teleporter
    /// relocates to its pair.
    pub fn advance(&self, pos: Pos, dir: Dir) -> Pos {
        match self.neighbor(pos, dir) {
            Some(next) if self.is_walkable(next) => self.teleport_target(next).unwrap_or(next),
            _ => pos,
        }
    }

    pub fn teleport_target(&self, pos: Pos) -> Option<Pos> {
        self.teleporters.get(&pos).copied()
    }

    pub fn content(&self, pos: Pos) -> Content {
        if self.in_bounds(pos) {
            self.content[self.index(pos)]
        } else {
            Content::Empty
        }
    }

    pub fn has_pellet(&self, pos: Pos) -> bool {
        self.content(pos) == Content::Pellet
    }

    /// Clears a pellet. Returns whether one was there.
    pub fn consume_pellet(&mut self, pos: Pos) -> bool {
        if !self.has_pellet(pos) {
            return false;
        }
        let idx = self.index(pos);
        self.content[idx] = Content::Empty;
        true
    }

    pub fn count_pellets(&self) -> usize {
        self.content.iter().filter(|&&c| c == Content::Pellet).count()
    }

    pub fn remaining_pellets(&self) -> usize {
        self.count_pellets()
    }

    pub fn pellets(&self) -> impl Iterator<Item = Pos> + '_ {
        self.content
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Content::Pellet)
            .map(move |(idx, _)| Pos {
                x: idx % self.width,
                y: idx / self.width,
            })
    }

    /// Closest pellet by Manhattan distance. Ties go to the first in row-major order.
    pub fn nearest_pellet(&self, from: Pos) -> Option<Pos> {
        let mut best: Option<(usize, Pos)> = None;
        for pos in self.pellets() {
            let d = from.manhattan(pos);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, pos));
            }
        }
        best.map(|(_, pos)| pos)
    }

    /// Restores the pellet layer to its loaded state.
    pub fn reset(&mut self) {
        self.content.clone_from(&self.initial);
    }

    pub fn player_spawn(&self) -> Pos {
        self.player_spawn
    }

    pub fn ghost_spawns(&self) -> &[(GhostKind, Pos)] {
        &self.ghost_spawns
    }

    pub fn spawn_of(&self, kind: GhostKind) -> Option<Pos> {
        self.ghost_spawns
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, pos)| *pos)
    }
}
