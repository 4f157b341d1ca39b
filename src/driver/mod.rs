//! The clonal-selection evolutionary driver (§4.F): the outer loop that
//! turns a population of genomes into a better one, generation after
//! generation, across however many exchange ranks are in play.
//!
//! Grounded on `original_source/IDSort/src/mpi_runner.py`'s main loop:
//! `mutations`, `filter_genomes`, the aging and restart logic, and the
//! `e*` (best-fitness target) update.

pub mod checkpoint;
pub mod exchange;

use crate::catalogue::MagnetCatalogue;
use crate::field;
use crate::field::lookup::LookupTensor;
use crate::field::trajectory;
use crate::genome::Genome;
use crate::layout::Info;
use crate::loss;
use exchange::Exchange;
use log::{debug, info};
use ndarray::Array4;
use rand::Rng;

/// Child count and mutation depth applied when refilling a population after
/// a restart, independent of the adaptive schedule below.
pub const RESTART_MUTATIONS: u32 = 20;

/// Tunables for one run of the evolutionary loop.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub population_per_rank: usize,
    pub children_per_genome: u32,
    pub mutation_base: f64,
    pub max_age: u32,
    pub iterations: usize,
}

/// Holds everything needed to evaluate a genome's fitness: the layout, the
/// real catalogue, the per-beam lookup tensors field synthesis contracts
/// against, and the reference trajectory it is scored against.
pub struct Evaluator<'a> {
    pub info: &'a Info,
    pub catalogue: &'a MagnetCatalogue,
    pub lookup: &'a [(String, LookupTensor)],
    reference_trajectories: Array4<f64>,
}

impl<'a> Evaluator<'a> {
    pub fn new(info: &'a Info, catalogue: &'a MagnetCatalogue, lookup: &'a [(String, LookupTensor)]) -> crate::errors::Result<Evaluator<'a>> {
        let reference_catalogue = catalogue.synthesize_reference()?;
        let mut rng = rand::thread_rng();
        let reference_genome = Genome::random(&reference_catalogue, info, 0, &mut rng)?;
        let reference_field = field::synthesize(info, &reference_genome, &reference_catalogue, lookup)?;
        let (_, reference_trajectories) = trajectory::compute(info, &reference_field)?;
        Ok(Evaluator {
            info,
            catalogue,
            lookup,
            reference_trajectories,
        })
    }

    /// Synthesizes `genome`'s field, double-integrates its trajectory,
    /// scores it against the reference trajectory, and writes the result
    /// into `genome.fitness`.
    pub fn evaluate(&self, genome: &mut Genome) -> crate::errors::Result<()> {
        let field = field::synthesize(self.info, genome, self.catalogue, self.lookup)?;
        let (_, trajectories) = trajectory::compute(self.info, &field)?;
        let traj_loss = loss::trajectory_loss(&trajectories, &self.reference_trajectories);
        genome.fitness = loss::fitness(traj_loss);
        Ok(())
    }
}

/// Number of mutations to apply to a genome's children, scaled inversely
/// with how close its fitness already is to the running target `e*`.
pub fn mutation_count(fitness: f64, e_star: f64, base: f64) -> u32 {
    if fitness == 0.0 {
        return 0;
    }
    let raw = ((1.0 - (e_star / fitness)) * base) + base;
    raw.abs().round() as u32
}

/// Filters a pooled set of genomes down to one rank's share (§4.F):
/// collapses genomes that land in the same 8-significant-figure fitness
/// bucket (keeping the older one), drops anyone past `max_age`, sorts
/// ascending by fitness, then returns the contiguous slice belonging to
/// `rank` (rank 0 gets the very best genomes, not a strided sample).
pub fn filter_genomes(genomes: Vec<Genome>, max_age: u32, population_per_rank: usize, rank: usize) -> Vec<Genome> {
    use std::collections::HashMap;

    let mut buckets: HashMap<String, Genome> = HashMap::new();
    for genome in genomes {
        let key = format!("{:.8E}", genome.fitness);
        match buckets.get(&key) {
            Some(existing) if existing.age >= genome.age => {}
            _ => {
                buckets.insert(key, genome);
            }
        }
    }

    let mut survivors: Vec<Genome> = buckets
        .into_values()
        .filter(|g| g.age < max_age)
        .collect();
    survivors.sort_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap_or(std::cmp::Ordering::Equal));

    let start = (rank * population_per_rank).min(survivors.len());
    let end = ((rank + 1) * population_per_rank).min(survivors.len());
    survivors[start..end].to_vec()
}

/// Logs a one-line summary of the current population's fitness spread.
pub fn log_population_stats(generation: usize, genomes: &[Genome]) {
    if genomes.is_empty() {
        info!("generation {}: population empty", generation);
        return;
    }
    let best = genomes.iter().map(|g| g.fitness).fold(f64::INFINITY, f64::min);
    let worst = genomes.iter().map(|g| g.fitness).fold(f64::NEG_INFINITY, f64::max);
    let mean = genomes.iter().map(|g| g.fitness).sum::<f64>() / genomes.len() as f64;
    info!(
        "generation {}: n={} best={:.8E} mean={:.8E} worst={:.8E}",
        generation,
        genomes.len(),
        best,
        mean,
        worst
    );
    for genome in genomes {
        debug!(
            "  uid={} age={} mutations={} fitness={:.8E}",
            genome.uid, genome.age, genome.mutations_count, genome.fitness
        );
    }
}

/// Runs the evolutionary loop to completion on a single exchange endpoint.
///
/// On restart, an empty or too-small population found on disk is filled
/// out to `config.population_per_rank` with children of the best loaded
/// genome, mutated `RESTART_MUTATIONS` times each, rather than treating a
/// short checkpoint as a hard error.
pub fn run<E: Exchange, R: Rng>(
    evaluator: &Evaluator,
    exchange: &E,
    config: &DriverConfig,
    mut population: Vec<Genome>,
    next_uid: &mut u64,
    rng: &mut R,
    mut on_generation: impl FnMut(usize),
) -> crate::errors::Result<Vec<Genome>> {
    if population.is_empty() {
        return Err(crate::errors::ErrorKind::NoGenomesLoaded.into());
    }

    for genome in &mut population {
        if !genome.fitness.is_finite() {
            evaluator.evaluate(genome)?;
        }
    }

    if population.len() < config.population_per_rank {
        let best = population
            .iter()
            .min_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap())
            .unwrap()
            .clone();
        while population.len() < config.population_per_rank {
            let mut child = best.generate_children(1, RESTART_MUTATIONS, next_uid, rng).remove(0);
            evaluator.evaluate(&mut child)?;
            population.push(child);
        }
    }

    let mut e_star = population
        .iter()
        .map(|g| g.fitness)
        .fold(f64::INFINITY, f64::min);

    for generation in 0..config.iterations {
        let mut children = Vec::new();
        for genome in &population {
            let k = mutation_count(genome.fitness, e_star, config.mutation_base);
            let mut kids = genome.generate_children(config.children_per_genome, k, next_uid, rng);
            for child in &mut kids {
                evaluator.evaluate(child)?;
            }
            children.extend(kids);
        }

        let mut pooled = population;
        pooled.extend(children);
        for genome in &mut pooled {
            genome.age += 1;
        }

        exchange.barrier();
        let gathered = exchange.all_to_all(pooled);

        population = filter_genomes(gathered, config.max_age, config.population_per_rank, exchange.rank());

        let best_fitness = population
            .iter()
            .map(|g| g.fitness)
            .fold(f64::INFINITY, f64::min);
        e_star = 0.99 * best_fitness;

        log_population_stats(generation, &population);
        on_generation(generation);
    }

    Ok(population)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn genome_with_fitness(uid: u64, fitness: f64, age: u32) -> Genome {
        let cat = MagnetCatalogue::new();
        let info = crate::layout::Info {
            name: "t".into(),
            device_type: crate::layout::DeviceType::HybridSymmetric,
            nperiods: 0,
            period_length: 1.0,
            beams: vec![],
            x: crate::layout::SampleRange { min: 0.0, max: 0.0, step: 1.0 },
            z: crate::layout::SampleRange { min: 0.0, max: 0.0, step: 1.0 },
            s: crate::layout::SampleRange { min: 0.0, max: 0.0, step: 1.0 },
        };
        let mut rng = rand_pcg::Pcg64::seed_from_u64(uid);
        let mut g = Genome::random(&cat, &info, uid, &mut rng).unwrap();
        g.fitness = fitness;
        g.age = age;
        g
    }

    #[test]
    fn mutation_count_is_nonnegative_and_grows_with_distance_from_target() {
        let close = mutation_count(1.0, 0.99, 5.0);
        let far = mutation_count(10.0, 0.99, 5.0);
        assert!(far >= close);
    }

    #[test]
    fn filter_collapses_same_bucket_keeping_older() {
        let genomes = vec![
            genome_with_fitness(1, 0.123456785, 3),
            genome_with_fitness(2, 0.123456784, 9),
        ];
        let survivors = filter_genomes(genomes, 100, 10, 0);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].age, 9);
    }

    #[test]
    fn filter_drops_genomes_past_max_age() {
        let genomes = vec![genome_with_fitness(1, 1.0, 50)];
        let survivors = filter_genomes(genomes, 10, 10, 0);
        assert!(survivors.is_empty());
    }

    #[test]
    fn filter_gives_rank_zero_the_best_contiguous_slice() {
        let genomes = vec![
            genome_with_fitness(1, 3.0, 0),
            genome_with_fitness(2, 1.0, 0),
            genome_with_fitness(3, 2.0, 0),
            genome_with_fitness(4, 4.0, 0),
        ];
        let survivors = filter_genomes(genomes, 100, 2, 0);
        assert_eq!(survivors.len(), 2);
        assert_eq!(survivors[0].fitness, 1.0);
        assert_eq!(survivors[1].fitness, 2.0);
    }
}
