//! Chromosome representation and the genetic operators.

use rand::distributions::WeightedIndex;
use rand::prelude::*;

use crate::grid::Dir;

/// A fixed-length plan of moves. Only the first gene is ever executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chromosome(Vec<Dir>);

pub type Population = Vec<Chromosome>;

impl Chromosome {
    pub fn random(rng: &mut impl Rng, length: usize) -> Self {
        Chromosome((0..length).map(|_| random_gene(rng)).collect())
    }

    pub fn genes(&self) -> &[Dir] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first_move(&self) -> Option<Dir> {
        self.0.first().copied()
    }
}

impl From<Vec<Dir>> for Chromosome {
    fn from(genes: Vec<Dir>) -> Self {
        Chromosome(genes)
    }
}

fn random_gene(rng: &mut impl Rng) -> Dir {
    Dir::ALL[rng.gen_range(0..Dir::ALL.len())]
}

pub fn initialize(rng: &mut impl Rng, size: usize, length: usize) -> Population {
    (0..size).map(|_| Chromosome::random(rng, length)).collect()
}

/// Roulette selection on `max(score, 0)` down to half the population.
///
/// Falls back to a uniform sample without replacement when no score is
/// positive. Never returns an empty set for a non-empty population.
pub fn select<'a>(
    rng: &mut impl Rng,
    population: &'a [Chromosome],
    scores: &[i64],
) -> Vec<&'a Chromosome> {
    if population.is_empty() {
        return Vec::new();
    }
    let count = (population.len() / 2).max(1);
    let weights = scores.iter().map(|&s| s.max(0) as u64);
    match WeightedIndex::new(weights) {
        Ok(dist) => (0..count).map(|_| &population[dist.sample(rng)]).collect(),
        Err(_) => population.choose_multiple(rng, count).collect(),
    }
}

/// Single-point crossover with the cut drawn from `[1, len - 1]`.
pub fn crossover(
    rng: &mut impl Rng,
    parent1: &Chromosome,
    parent2: &Chromosome,
) -> (Chromosome, Chromosome) {
    let len = parent1.len().min(parent2.len());
    if len < 2 {
        return (parent1.clone(), parent2.clone());
    }
    let cut = rng.gen_range(1..len);
    let (a, b) = (&parent1.0, &parent2.0);
    let child1 = a[..cut].iter().chain(&b[cut..]).copied().collect();
    let child2 = b[..cut].iter().chain(&a[cut..]).copied().collect();
    (Chromosome(child1), Chromosome(child2))
}

/// Redraws each gene with probability `rate`. The redraw may land on the
/// same symbol.
pub fn mutate(rng: &mut impl Rng, chromosome: &mut Chromosome, rate: f64) {
    for gene in chromosome.0.iter_mut() {
        if rng.gen::<f64>() < rate {
            *gene = random_gene(rng);
        }
    }
}

/// Breeds a full replacement population from the selected parents.
pub fn reproduce(
    rng: &mut impl Rng,
    selected: &[&Chromosome],
    size: usize,
    mutation_rate: f64,
) -> Population {
    let mut next = Vec::with_capacity(size);
    if selected.is_empty() {
        return next;
    }
    while next.len() < size {
        let parents: Vec<&&Chromosome> = selected.choose_multiple(rng, 2).collect();
        let (p1, p2) = match parents.as_slice() {
            [a, b] => (**a, **b),
            _ => (selected[0], selected[0]),
        };
        let (mut c1, mut c2) = crossover(rng, p1, p2);
        mutate(rng, &mut c1, mutation_rate);
        next.push(c1);
        if next.len() < size {
            mutate(rng, &mut c2, mutation_rate);
            next.push(c2);
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn initialize_has_requested_shape() {
        let pop = initialize(&mut rng(1), 12, 9);
        assert_eq!(pop.len(), 12);
        assert!(pop.iter().all(|c| c.len() == 9));
    }

    #[test]
    fn crossover_splices_prefix_and_suffix() {
        let mut r = rng(2);
        for _ in 0..200 {
            let p1 = Chromosome::random(&mut r, 16);
            let p2 = Chromosome::random(&mut r, 16);
            let (c1, c2) = crossover(&mut r, &p1, &p2);
            assert_eq!(c1.len() + c2.len(), p1.len() + p2.len());
            let cut = (1..16)
                .find(|&cut| {
                    c1.genes()[..cut] == p1.genes()[..cut]
                        && c1.genes()[cut..] == p2.genes()[cut..]
                        && c2.genes()[..cut] == p2.genes()[..cut]
                        && c2.genes()[cut..] == p1.genes()[cut..]
                });
            assert!(cut.is_some());
        }
    }

    #[test]
    fn crossover_cut_is_never_at_the_ends() {
        let mut r = rng(3);
        let p1 = Chromosome::from(vec![Dir::Up; 4]);
        let p2 = Chromosome::from(vec![Dir::Down; 4]);
        for _ in 0..200 {
            let (c1, _) = crossover(&mut r, &p1, &p2);
            assert_eq!(c1.genes()[0], Dir::Up);
            assert_eq!(c1.genes()[3], Dir::Down);
        }
    }

    #[test]
    fn mutation_rate_zero_is_identity() {
        let mut r = rng(4);
        let original = Chromosome::random(&mut r, 50);
        let mut copy = original.clone();
        mutate(&mut r, &mut copy, 0.0);
        assert_eq!(copy, original);
    }

    #[test]
    fn mutation_rate_one_redraws_every_gene() {
        // A twin RNG replays exactly one redraw per gene.
        let mut a = rng(5);
        let mut b = rng(5);
        let mut chromosome = Chromosome::from(vec![Dir::Up; 40]);
        mutate(&mut a, &mut chromosome, 1.0);
        let expected: Vec<Dir> = (0..40)
            .map(|_| {
                let _: f64 = b.gen();
                random_gene(&mut b)
            })
            .collect();
        assert_eq!(chromosome.genes(), expected.as_slice());
        assert!(chromosome.genes().iter().any(|g| *g != Dir::Up));
    }

    #[test]
    fn selection_is_never_empty() {
        let mut r = rng(6);
        for size in 1..10 {
            let pop = initialize(&mut r, size, 4);
            let zero = vec![0; size];
            let negative = vec![-100; size];
            let mixed: Vec<i64> = (0..size as i64).map(|i| i * 10 - 20).collect();
            for scores in [&zero, &negative, &mixed] {
                let picked = select(&mut r, &pop, scores);
                assert!(!picked.is_empty());
                assert_eq!(picked.len(), (size / 2).max(1));
            }
        }
        assert!(select(&mut r, &[], &[]).is_empty());
    }

    #[test]
    fn roulette_ignores_non_positive_scores() {
        let mut r = rng(7);
        let pop = vec![
            Chromosome::from(vec![Dir::Up; 3]),
            Chromosome::from(vec![Dir::Down; 3]),
            Chromosome::from(vec![Dir::Left; 3]),
            Chromosome::from(vec![Dir::Right; 3]),
        ];
        for _ in 0..100 {
            let picked = select(&mut r, &pop, &[-5, 0, 40, -1]);
            assert!(picked.iter().all(|c| c.genes()[0] == Dir::Left));
        }
    }

    #[test]
    fn uniform_fallback_samples_distinct_members() {
        let mut r = rng(8);
        let pop = initialize(&mut r, 10, 6);
        let picked = select(&mut r, &pop, &[0; 10]);
        for (i, a) in picked.iter().enumerate() {
            for b in &picked[i + 1..] {
                assert!(!std::ptr::eq(*a, *b));
            }
        }
    }

    #[test]
    fn reproduce_keeps_population_shape() {
        let mut r = rng(9);
        let pop = initialize(&mut r, 11, 7);
        let picked = select(&mut r, &pop, &[1; 11]);
        let next = reproduce(&mut r, &picked, 11, 0.1);
        assert_eq!(next.len(), 11);
        assert!(next.iter().all(|c| c.len() == 7));

        let lone = [&pop[0]];
        let next = reproduce(&mut r, &lone, 3, 0.0);
        assert_eq!(next, vec![pop[0].clone(); 3]);
    }
}
