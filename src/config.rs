//! Tunables for the planner, the fitness function and a game session.

use std::str::FromStr;

use tracing::warn;

use crate::error::ConfigError;
use crate::ghost::GhostKind;

const DEFAULT_TICK_MS: u64 = 70;
const DEFAULT_RENDER_FPS: u64 = 120;
const DEFAULT_LEVELS: u32 = 5;
const GHOST_MOVE_INTERVAL: u32 = 2;

/// Scoring constants used by the fitness evaluator. All are magnitudes;
/// penalties are subtracted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitnessWeights {
    pub revisit_penalty: i64,
    pub pellet_reward: i64,
    pub ghost_penalty: i64,
    pub path_match_reward: i64,
    pub path_mismatch_penalty: i64,
    pub path_exhausted_penalty: i64,
    /// Manhattan radius around a ghost that triggers `ghost_penalty`.
    pub ghost_radius: usize,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            revisit_penalty: 500,
            pellet_reward: 2500,
            ghost_penalty: 1000,
            path_match_reward: 100,
            path_mismatch_penalty: 50,
            path_exhausted_penalty: 20,
            ghost_radius: 1,
        }
    }
}

/// How the planner builds its reference path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FitnessMode {
    /// Plain shortest path to the target pellet.
    #[default]
    Baseline,
    /// Shortest path that treats ghost tiles as blocked.
    Adversarial,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannerConfig {
    pub population_size: usize,
    pub chromosome_length: usize,
    pub mutation_rate: f64,
    pub mode: FitnessMode,
    pub weights: FitnessWeights,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            chromosome_length: 50,
            mutation_rate: 0.1,
            mode: FitnessMode::Baseline,
            weights: FitnessWeights::default(),
            seed: None,
        }
    }
}

impl PlannerConfig {
    /// Small planner owned by a single agent.
    pub fn per_agent() -> Self {
        Self {
            population_size: 10,
            chromosome_length: 10,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::ZeroPopulation);
        }
        if self.chromosome_length < 2 {
            return Err(ConfigError::ChromosomeTooShort(self.chromosome_length));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::MutationRate(self.mutation_rate));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    /// Ghosts instantiated at this difficulty.
    pub fn ghosts(self) -> &'static [GhostKind] {
        use GhostKind::*;
        match self {
            Difficulty::Easy => &[Blinky],
            Difficulty::Medium => &[Blinky, Pinky],
            Difficulty::Hard => &[Blinky, Pinky, Inky],
            Difficulty::VeryHard => &[Blinky, Pinky, Inky, Clyde],
        }
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "1" => Ok(Difficulty::Easy),
            "medium" | "2" => Ok(Difficulty::Medium),
            "hard" | "3" => Ok(Difficulty::Hard),
            "very_hard" | "very-hard" | "veryhard" | "4" => Ok(Difficulty::VeryHard),
            _ => Err(ConfigError::UnknownDifficulty(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub tick_ms: u64,
    pub render_fps: u64,
    pub difficulty: Difficulty,
    pub levels: u32,
    /// Ghosts advance once every this many ticks.
    pub ghost_move_interval: u32,
    pub planner: PlannerConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            render_fps: DEFAULT_RENDER_FPS,
            difficulty: Difficulty::default(),
            levels: DEFAULT_LEVELS,
            ghost_move_interval: GHOST_MOVE_INTERVAL,
            planner: PlannerConfig::default(),
        }
    }
}

impl GameConfig {
    /// Reads `PACMAN_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let planner = PlannerConfig {
            population_size: parsed(&lookup, "PACMAN_POPULATION", defaults.planner.population_size, |v| *v > 0),
            chromosome_length: parsed(&lookup, "PACMAN_CHROMOSOME", defaults.planner.chromosome_length, |v| *v >= 2),
            mutation_rate: parsed(&lookup, "PACMAN_MUTATION", defaults.planner.mutation_rate, |v| {
                (0.0..=1.0).contains(v)
            }),
            mode: if parsed(&lookup, "PACMAN_ADVERSARIAL", false, |_| true) {
                FitnessMode::Adversarial
            } else {
                FitnessMode::Baseline
            },
            weights: FitnessWeights::default(),
            seed: lookup("PACMAN_SEED").and_then(|v| v.parse::<u64>().ok()),
        };
        Self {
            tick_ms: parsed(&lookup, "PACMAN_TICK_MS", defaults.tick_ms, |v| *v > 0),
            render_fps: parsed(&lookup, "PACMAN_FPS", defaults.render_fps, |v| *v > 0),
            difficulty: parsed(&lookup, "PACMAN_DIFFICULTY", defaults.difficulty, |_| true),
            levels: parsed(&lookup, "PACMAN_LEVELS", defaults.levels, |v| *v > 0),
            ghost_move_interval: defaults.ghost_move_interval,
            planner,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels == 0 {
            return Err(ConfigError::ZeroLevels);
        }
        self.planner.validate()
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    accept: impl Fn(&T) -> bool,
) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) if accept(&value) => value,
        _ => {
            warn!(key, value = %raw, "ignoring invalid setting");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_validate() {
        assert!(GameConfig::default().validate().is_ok());
        assert!(PlannerConfig::per_agent().validate().is_ok());
        assert_eq!(PlannerConfig::per_agent().population_size, 10);
    }

    #[test]
    fn env_overrides_and_fallbacks() {
        let cfg = GameConfig::from_lookup(lookup_from(&[
            ("PACMAN_TICK_MS", "30"),
            ("PACMAN_FPS", "0"),
            ("PACMAN_DIFFICULTY", "very_hard"),
            ("PACMAN_POPULATION", "abc"),
            ("PACMAN_MUTATION", "0.25"),
            ("PACMAN_ADVERSARIAL", "true"),
            ("PACMAN_SEED", "7"),
        ]));
        assert_eq!(cfg.tick_ms, 30);
        assert_eq!(cfg.render_fps, DEFAULT_RENDER_FPS);
        assert_eq!(cfg.difficulty, Difficulty::VeryHard);
        assert_eq!(cfg.planner.population_size, 100);
        assert_eq!(cfg.planner.mutation_rate, 0.25);
        assert_eq!(cfg.planner.mode, FitnessMode::Adversarial);
        assert_eq!(cfg.planner.seed, Some(7));
    }

    #[test]
    fn invalid_planner_settings_are_rejected() {
        let mut cfg = PlannerConfig::default();
        cfg.population_size = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroPopulation));
        cfg.population_size = 4;
        cfg.chromosome_length = 1;
        assert_eq!(cfg.validate(), Err(ConfigError::ChromosomeTooShort(1)));
        cfg.chromosome_length = 8;
        cfg.mutation_rate = 1.5;
        assert_eq!(cfg.validate(), Err(ConfigError::MutationRate(1.5)));
    }

    #[test]
    fn difficulty_gates_ghosts() {
        assert_eq!("2".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert!("nightmare".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Easy.ghosts(), &[GhostKind::Blinky]);
        assert_eq!(Difficulty::VeryHard.ghosts().len(), 4);
    }
}
