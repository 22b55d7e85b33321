//! A headless game session: the planner plays, ghosts chase, levels repeat.

use tracing::info;

use crate::config::GameConfig;
use crate::error::ConfigError;
use crate::ghost::Ghost;
use crate::grid::{Dir, Grid, Pos};
use crate::planner::{FitnessHistory, Planner};
use crate::world::World;

const PELLET_SCORE: i64 = 100;
const COLLISION_PENALTY: i64 = 500;
const COLLISION_COOLDOWN_TICKS: u32 = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Running,
    /// The given level was cleared and the next one has been laid out.
    LevelCleared(u32),
    /// Every level has been cleared.
    Won,
}

pub struct Session {
    grid: Grid,
    player: Pos,
    heading: Option<Dir>,
    ghosts: Vec<Ghost>,
    planner: Planner,
    score: i64,
    total_score: i64,
    level: u32,
    levels: u32,
    ticks: u64,
    level_ticks: u64,
    ghost_tick: u32,
    ghost_move_interval: u32,
    collision_cooldown: u32,
    collisions: u32,
    finished: bool,
}

impl Session {
    pub fn new(grid: Grid, config: &GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let planner = Planner::new(config.planner.clone())?;
        let ghosts: Vec<Ghost> = config
            .difficulty
            .ghosts()
            .iter()
            .filter_map(|&kind| grid.spawn_of(kind).map(|spawn| Ghost::new(kind, spawn)))
            .collect();
        info!(
            difficulty = ?config.difficulty,
            ghosts = ghosts.len(),
            pellets = grid.remaining_pellets(),
            mode = ?config.planner.mode,
            "level 1 loaded"
        );
        Ok(Self {
            player: grid.player_spawn(),
            grid,
            heading: None,
            ghosts,
            planner,
            score: 0,
            total_score: 0,
            level: 1,
            levels: config.levels,
            ticks: 0,
            level_ticks: 0,
            ghost_tick: 0,
            ghost_move_interval: config.ghost_move_interval.max(1),
            collision_cooldown: 0,
            collisions: 0,
            finished: false,
        })
    }

    pub fn tick(&mut self) -> Outcome {
        if self.finished {
            return Outcome::Won;
        }
        self.ticks += 1;
        self.level_ticks += 1;

        self.move_player();
        self.consume_tile();
        self.update_ghosts();
        self.handle_collisions();

        if self.grid.remaining_pellets() == 0 {
            return self.finish_level();
        }
        Outcome::Running
    }

    /// Executes the planner's move if it is safe, else the first step of the
    /// reference path, else holds.
    fn move_player(&mut self) {
        let ghosts: Vec<Pos> = self.ghosts.iter().map(Ghost::pos).collect();
        let world = World::new(&self.grid, self.player, &ghosts).with_heading(self.heading);
        let planned = self.planner.step(&world);
        let radius = self.planner.evaluator().weights().ghost_radius;

        let fallback = || {
            let first = *self.planner.reference_path().first()?;
            let dir = Dir::between(self.player, first)?;
            Some((dir, self.grid.advance(self.player, dir)))
        };
        let chosen = planned
            .and_then(|dir| safe_destination(&world, dir, radius).map(|dest| (dir, dest)))
            .or_else(fallback);
        let Some((dir, dest)) = chosen else {
            return;
        };
        self.heading = Some(dir);
        self.player = dest;
    }

    fn consume_tile(&mut self) {
        if self.grid.consume_pellet(self.player) {
            self.score += PELLET_SCORE;
        }
    }

    fn update_ghosts(&mut self) {
        self.ghost_tick = self.ghost_tick.wrapping_add(1);
        if self.ghost_tick % self.ghost_move_interval != 0 {
            return;
        }
        let positions: Vec<Pos> = self.ghosts.iter().map(Ghost::pos).collect();
        let world = World::new(&self.grid, self.player, &positions).with_heading(self.heading);
        for ghost in self.ghosts.iter_mut() {
            ghost.step(&world);
        }
    }

    fn handle_collisions(&mut self) {
        if self.collision_cooldown > 0 {
            self.collision_cooldown -= 1;
        }
        let hit = self.ghosts.iter().any(|g| g.pos() == self.player);
        if hit && self.collision_cooldown == 0 {
            self.score -= COLLISION_PENALTY;
            self.collisions += 1;
            self.collision_cooldown = COLLISION_COOLDOWN_TICKS;
        }
    }

    fn finish_level(&mut self) -> Outcome {
        self.total_score += self.score;
        info!(
            level = self.level,
            score = self.score,
            total = self.total_score,
            ticks = self.level_ticks,
            generations = self.planner.generation(),
            "level cleared"
        );
        if self.level >= self.levels {
            self.finished = true;
            info!(
                total = self.total_score,
                ticks = self.ticks,
                collisions = self.collisions,
                "session won"
            );
            return Outcome::Won;
        }
        let cleared = self.level;
        self.level += 1;
        self.score = 0;
        self.level_ticks = 0;
        self.grid.reset();
        self.player = self.grid.player_spawn();
        self.heading = None;
        self.ghost_tick = 0;
        self.collision_cooldown = 0;
        for ghost in self.ghosts.iter_mut() {
            ghost.respawn();
        }
        Outcome::LevelCleared(cleared)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player(&self) -> Pos {
        self.player
    }

    pub fn heading(&self) -> Option<Dir> {
        self.heading
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn fitness_history(&self) -> &FitnessHistory {
        self.planner.fitness_history()
    }

    /// Score of the level in progress.
    pub fn score(&self) -> i64 {
        self.score
    }

    /// Sum of cleared levels' scores.
    pub fn total_score(&self) -> i64 {
        self.total_score
    }

    /// Cleared levels plus the level in progress.
    pub fn overall_score(&self) -> i64 {
        if self.finished {
            self.total_score
        } else {
            self.total_score + self.score
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn collisions(&self) -> u32 {
        self.collisions
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Where `dir` takes the player, after any teleport, provided it actually
/// moves and lands outside every ghost's radius.
fn safe_destination(world: &World<'_>, dir: Dir, radius: usize) -> Option<Pos> {
    let dest = world.grid.advance(world.player, dir);
    (dest != world.player && !world.near_ghost(dest, radius)).then_some(dest)
}
