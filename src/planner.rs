//! Per-tick evolution loop for the player agent.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::config::PlannerConfig;
use crate::error::ConfigError;
use crate::fitness::FitnessEvaluator;
use crate::genetics::{initialize, reproduce, select, Chromosome, Population};
use crate::grid::{Dir, Pos};
use crate::pathfinder::{reachable, Path};
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlannerState {
    /// No target this tick (or no tick yet).
    Idle,
    /// Scoring the current population.
    Evaluating,
    /// Next population is in place.
    Evolved,
}

/// Best score of every generation, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FitnessHistory(Vec<i64>);

impl FitnessHistory {
    fn push(&mut self, score: i64) {
        self.0.push(score);
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn best(&self) -> Option<i64> {
        self.0.iter().copied().max()
    }

    pub fn latest(&self) -> Option<i64> {
        self.0.last().copied()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.0.is_empty() {
            return None;
        }
        Some(self.0.iter().sum::<i64>() as f64 / self.0.len() as f64)
    }

    /// One-line block chart, at most `width` columns. Each column shows the
    /// best score of its bucket of generations.
    pub fn sparkline(&self, width: usize) -> String {
        const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
        if self.0.is_empty() || width == 0 {
            return String::new();
        }
        let bucket = self.0.len().div_ceil(width);
        let peaks: Vec<i64> = self
            .0
            .chunks(bucket)
            .filter_map(|chunk| chunk.iter().copied().max())
            .collect();
        let lo = peaks.iter().copied().min().unwrap_or(0);
        let hi = peaks.iter().copied().max().unwrap_or(0);
        let span = (hi - lo).max(1) as f64;
        peaks
            .iter()
            .map(|&v| {
                let level = ((v - lo) as f64 / span * (BARS.len() - 1) as f64).round() as usize;
                BARS[level.min(BARS.len() - 1)]
            })
            .collect()
    }
}

pub struct Planner {
    config: PlannerConfig,
    evaluator: FitnessEvaluator,
    population: Population,
    history: FitnessHistory,
    state: PlannerState,
    target: Option<Pos>,
    reference: Path,
    rng: StdRng,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let population = initialize(&mut rng, config.population_size, config.chromosome_length);
        Ok(Self {
            evaluator: FitnessEvaluator::new(config.mode, config.weights),
            config,
            population,
            history: FitnessHistory::default(),
            state: PlannerState::Idle,
            target: None,
            reference: Path::new(),
            rng,
        })
    }

    /// Runs one generation and returns the move to make this tick.
    pub fn step(&mut self, world: &World<'_>) -> Option<Dir> {
        self.evolve(world).first_move()
    }

    /// Runs one generation and returns the fittest chromosome of the
    /// population that was just scored. With no reachable pellet left it
    /// returns a random chromosome and leaves the population alone.
    pub fn evolve(&mut self, world: &World<'_>) -> Chromosome {
        let start = world.player;
        let Some(target) = world.grid.nearest_pellet(start) else {
            return self.idle();
        };
        let reference = self
            .evaluator
            .reference_path(world.grid, start, target, world.ghosts);
        if reference.is_empty() {
            let seen = reachable(world.grid, start);
            if !world.grid.pellets().any(|p| seen.contains(&p)) {
                return self.idle();
            }
        }

        self.state = PlannerState::Evaluating;
        self.target = Some(target);
        self.reference = reference;
        let scores = self.evaluator.evaluate_all(
            world.grid,
            &self.population,
            &self.reference,
            start,
            world.ghosts,
        );

        let best_score = scores.iter().copied().max().unwrap_or(0);
        let best_idx = scores.iter().position(|&s| s == best_score).unwrap_or(0);
        let best = self.population[best_idx].clone();
        self.history.push(best_score);
        debug!(
            generation = self.history.len(),
            best = best_score,
            mean = scores.iter().sum::<i64>() / scores.len().max(1) as i64,
            %target,
            mode = ?self.evaluator.mode(),
            reference = self.reference.len(),
            "generation scored"
        );

        let selected = select(&mut self.rng, &self.population, &scores);
        let next = reproduce(
            &mut self.rng,
            &selected,
            self.config.population_size,
            self.config.mutation_rate,
        );
        self.population = next;
        self.state = PlannerState::Evolved;
        best
    }

    fn idle(&mut self) -> Chromosome {
        self.state = PlannerState::Idle;
        self.target = None;
        self.reference.clear();
        Chromosome::random(&mut self.rng, self.config.chromosome_length)
    }

    pub fn fitness_history(&self) -> &FitnessHistory {
        &self.history
    }

    pub fn generation(&self) -> usize {
        self.history.len()
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    pub fn evaluator(&self) -> &FitnessEvaluator {
        &self.evaluator
    }

    /// Pellet targeted by the last generation.
    pub fn target(&self) -> Option<Pos> {
        self.target
    }

    /// Reference path used by the last generation.
    pub fn reference_path(&self) -> &[Pos] {
        &self.reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FitnessMode;
    use crate::grid::{Grid, DEFAULT_LAYOUT};

    fn seeded(seed: u64) -> PlannerConfig {
        PlannerConfig {
            population_size: 30,
            chromosome_length: 12,
            seed: Some(seed),
            ..PlannerConfig::default()
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = PlannerConfig {
            population_size: 0,
            ..PlannerConfig::default()
        };
        assert!(matches!(Planner::new(cfg), Err(ConfigError::ZeroPopulation)));
    }

    #[test]
    fn population_shape_is_stable_across_generations() {
        let grid = Grid::load(DEFAULT_LAYOUT).unwrap();
        let mut planner = Planner::new(seeded(1)).unwrap();
        assert_eq!(planner.state(), PlannerState::Idle);
        let world = World::new(&grid, grid.player_spawn(), &[]);
        for generation in 1..=20 {
            assert!(planner.step(&world).is_some());
            assert_eq!(planner.state(), PlannerState::Evolved);
            assert_eq!(planner.population().len(), 30);
            assert!(planner.population().iter().all(|c| c.len() == 12));
            assert_eq!(planner.fitness_history().len(), generation);
        }
    }

    #[test]
    fn returns_best_of_scored_population() {
        let grid = Grid::load(DEFAULT_LAYOUT).unwrap();
        let mut planner = Planner::new(seeded(2)).unwrap();
        let ghosts = [Pos::new(9, 9)];
        let world = World::new(&grid, grid.player_spawn(), &ghosts);
        for _ in 0..5 {
            let before = planner.population().to_vec();
            let best = planner.evolve(&world);
            let reference = planner.reference_path().to_vec();
            let scores: Vec<i64> = before
                .iter()
                .map(|c| {
                    planner
                        .evaluator()
                        .evaluate(&grid, c, &reference, world.player, &ghosts)
                })
                .collect();
            let max = *scores.iter().max().unwrap();
            let idx = scores.iter().position(|&s| s == max).unwrap();
            assert_eq!(best, before[idx]);
            assert_eq!(planner.fitness_history().latest(), Some(max));
        }
    }

    #[test]
    fn no_pellets_means_idle_random_plan() {
        let mut grid = Grid::load(["P.", "  "]).unwrap();
        assert!(grid.consume_pellet(Pos::new(1, 0)));
        let mut planner = Planner::new(seeded(3)).unwrap();
        let before = planner.population().to_vec();
        let world = World::new(&grid, grid.player_spawn(), &[]);
        let plan = planner.evolve(&world);
        assert_eq!(plan.len(), 12);
        assert_eq!(planner.state(), PlannerState::Idle);
        assert!(planner.fitness_history().is_empty());
        assert_eq!(planner.population(), before.as_slice());
        assert_eq!(planner.target(), None);
    }

    #[test]
    fn walled_off_pellets_mean_idle_random_plan() {
        let grid = Grid::load(["P W."]).unwrap();
        let mut planner = Planner::new(seeded(6)).unwrap();
        let before = planner.population().to_vec();
        let world = World::new(&grid, grid.player_spawn(), &[]);
        for _ in 0..3 {
            assert_eq!(planner.evolve(&world).len(), 12);
            assert_eq!(planner.state(), PlannerState::Idle);
        }
        assert!(planner.fitness_history().is_empty());
        assert_eq!(planner.population(), before.as_slice());
        assert_eq!(planner.target(), None);
        assert!(planner.reference_path().is_empty());
    }

    #[test]
    fn unreachable_nearest_pellet_still_evolves_toward_others() {
        // (3,0) is nearest but sealed in; (4,2) is reachable.
        let grid = Grid::load(["P W.W", "  WWW", "    ."]).unwrap();
        let mut planner = Planner::new(seeded(7)).unwrap();
        let world = World::new(&grid, grid.player_spawn(), &[]);
        planner.step(&world);
        assert_eq!(planner.state(), PlannerState::Evolved);
        assert_eq!(planner.target(), Some(Pos::new(3, 0)));
        assert_eq!(planner.fitness_history().len(), 1);
    }

    #[test]
    fn seeded_planners_agree() {
        let grid = Grid::load(DEFAULT_LAYOUT).unwrap();
        let world = World::new(&grid, grid.player_spawn(), &[]);
        let mut a = Planner::new(seeded(9)).unwrap();
        let mut b = Planner::new(seeded(9)).unwrap();
        for _ in 0..10 {
            assert_eq!(a.step(&world), b.step(&world));
        }
        assert_eq!(a.fitness_history(), b.fitness_history());
    }

    #[test]
    fn adversarial_reference_skirts_ghosts() {
        let grid = Grid::load(["P  .", " WW ", "    "]).unwrap();
        let ghosts = [Pos::new(2, 0)];
        let cfg = PlannerConfig {
            mode: FitnessMode::Adversarial,
            ..seeded(4)
        };
        let mut planner = Planner::new(cfg).unwrap();
        let world = World::new(&grid, grid.player_spawn(), &ghosts);
        planner.step(&world);
        assert_eq!(planner.target(), Some(Pos::new(3, 0)));
        assert_eq!(planner.reference_path().len(), 7);
        assert!(!planner.reference_path().contains(&Pos::new(2, 0)));
    }

    #[test]
    fn best_fitness_improves_in_a_corridor() {
        let grid = Grid::load(["P.........."]).unwrap();
        let mut planner = Planner::new(PlannerConfig {
            population_size: 60,
            chromosome_length: 10,
            seed: Some(5),
            ..PlannerConfig::default()
        })
        .unwrap();
        let world = World::new(&grid, grid.player_spawn(), &[]);
        for _ in 0..40 {
            planner.step(&world);
        }
        let history = planner.fitness_history();
        let first = history.as_slice()[0];
        assert!(history.best().unwrap() >= first);
        // Ten rights collect every pellet and follow the path exactly.
        assert!(history.best().unwrap() > 10 * 2500 / 2);
    }

    #[test]
    fn sparkline_scales_between_min_and_max() {
        let history = FitnessHistory(vec![0, 10, 20, 30]);
        assert_eq!(history.sparkline(4), "▁▃▆█");
        assert_eq!(history.sparkline(2).chars().count(), 2);
        assert_eq!(FitnessHistory::default().sparkline(10), "");
        assert_eq!(history.mean(), Some(15.0));
        assert_eq!(history.best(), Some(30));
    }
}
