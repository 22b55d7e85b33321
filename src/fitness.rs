//! Scores a chromosome by replaying it against a frozen world.

use std::collections::HashSet;

use rayon::prelude::*;

use crate::config::{FitnessMode, FitnessWeights};
use crate::genetics::Chromosome;
use crate::grid::{Dir, Grid, Pos};
use crate::pathfinder::{find_path, Path};
use crate::world::near_any;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitnessEvaluator {
    mode: FitnessMode,
    weights: FitnessWeights,
}

impl FitnessEvaluator {
    pub fn new(mode: FitnessMode, weights: FitnessWeights) -> Self {
        Self { mode, weights }
    }

    pub fn mode(&self) -> FitnessMode {
        self.mode
    }

    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Shaping route toward `target`. The adversarial mode routes around
    /// ghost tiles.
    pub fn reference_path(&self, grid: &Grid, start: Pos, target: Pos, ghosts: &[Pos]) -> Path {
        let blocked: HashSet<Pos> = match self.mode {
            FitnessMode::Baseline => HashSet::new(),
            FitnessMode::Adversarial => ghosts.iter().copied().collect(),
        };
        find_path(grid, start, target, &blocked)
    }

    pub fn evaluate(
        &self,
        grid: &Grid,
        chromosome: &Chromosome,
        reference: &[Pos],
        start: Pos,
        ghosts: &[Pos],
    ) -> i64 {
        self.rollout_score(grid, chromosome, start, ghosts) + self.path_bonus(chromosome, reference, start)
    }

    /// Scores every chromosome against the same snapshot, in parallel.
    pub fn evaluate_all(
        &self,
        grid: &Grid,
        population: &[Chromosome],
        reference: &[Pos],
        start: Pos,
        ghosts: &[Pos],
    ) -> Vec<i64> {
        population
            .par_iter()
            .map(|chromosome| self.evaluate(grid, chromosome, reference, start, ghosts))
            .collect()
    }

    /// Replays the moves: penalizes revisits, rewards pellets, penalizes
    /// ending up next to a ghost. Blocked moves still use up a gene.
    fn rollout_score(&self, grid: &Grid, chromosome: &Chromosome, start: Pos, ghosts: &[Pos]) -> i64 {
        let w = &self.weights;
        let mut visited = vec![false; grid.width() * grid.height()];
        let mut position = start;
        let mut score = 0;
        for &dir in chromosome.genes() {
            position = grid.advance(position, dir);
            let seen = &mut visited[grid.index(position)];
            if *seen {
                score -= w.revisit_penalty;
                continue;
            }
            *seen = true;
            if grid.has_pellet(position) {
                score += w.pellet_reward;
            }
            if near_any(position, ghosts, w.ghost_radius) {
                score -= w.ghost_penalty;
            }
        }
        score
    }

    /// Walks the chromosome alongside the reference path, advancing along the
    /// path only on matching moves.
    pub fn path_bonus(&self, chromosome: &Chromosome, reference: &[Pos], start: Pos) -> i64 {
        let w = &self.weights;
        let mut position = start;
        let mut next = 0;
        let mut score = 0;
        for &dir in chromosome.genes() {
            let Some(&target) = reference.get(next) else {
                score -= w.path_exhausted_penalty;
                continue;
            };
            if Dir::between(position, target) == Some(dir) {
                score += w.path_match_reward;
                position = target;
                next += 1;
            } else {
                score -= w.path_mismatch_penalty;
            }
        }
        score
    }
}
