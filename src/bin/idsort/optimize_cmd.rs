//! `idsort optimize`: runs the clonal-selection evolutionary driver on a
//! single node against a descriptor and magnet catalogue.
//!
//! Multi-rank operation is available as a library (`driver::exchange`) but
//! this CLI only drives the single-node case; a cluster launcher is
//! expected to spawn one `idsort optimize` process per rank and wire them
//! together itself, the way the original launched one MPI rank per process.

use clap::Args;
use idsort::driver::exchange::SingleNode;
use idsort::driver::{checkpoint, run as run_driver, DriverConfig, Evaluator};
use idsort::errors::*;
use idsort::genome::Genome;
use idsort::io::{catalogue_file, descriptor, lookup_store};
use log::info;
use pbr::ProgressBar;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Args)]
pub struct OptimizeArgs {
    /// ID descriptor JSON produced by `idsort layout`.
    #[arg(long)]
    descriptor: PathBuf,

    /// Magnet catalogue JSON.
    #[arg(long)]
    catalogue: PathBuf,

    /// Per-beam field lookup tensor store (§6), generated offline from the
    /// layout's geometry.
    #[arg(long)]
    lookup: PathBuf,

    /// Directory to read/write genome checkpoints from.
    #[arg(long)]
    checkpoint_dir: PathBuf,

    /// Resume from whatever genomes already exist in `checkpoint_dir`.
    #[arg(long, default_value_t = false)]
    resume: bool,

    #[arg(long, default_value_t = 32)]
    population_per_rank: usize,
    #[arg(long, default_value_t = 4)]
    children_per_genome: u32,
    #[arg(long, default_value_t = 5.0)]
    mutation_base: f64,
    #[arg(long, default_value_t = 50)]
    max_age: u32,
    #[arg(long, default_value_t = 1000)]
    iterations: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Show a progress bar across generations.
    #[arg(long, default_value_t = false)]
    progress: bool,
}

pub fn run(args: OptimizeArgs) -> Result<()> {
    let descriptor_doc = descriptor::read(&args.descriptor).chain_err(|| "failed to read descriptor")?;
    let info = descriptor_doc
        .regenerate()
        .chain_err(|| "failed to rebuild layout from descriptor")?;

    let catalogue = catalogue_file::read(&args.catalogue).chain_err(|| "failed to read catalogue")?;
    let needed_types: Vec<_> = info.beams.iter().flat_map(|b| b.types()).collect();
    catalogue
        .validate_nonempty(&needed_types)
        .chain_err(|| "catalogue is missing magnets required by the layout")?;

    let lookup = lookup_store::read(&args.lookup).chain_err(|| "failed to read lookup tensor store")?;

    let evaluator = Evaluator::new(&info, &catalogue, &lookup).chain_err(|| "failed to build reference field")?;

    let mut rng = rand_pcg::Pcg64::seed_from_u64(args.seed);
    let mut next_uid = 1u64;

    let population = if args.resume {
        checkpoint::load_for_restart(&args.checkpoint_dir).chain_err(|| "failed to load checkpoint for restart")?
    } else {
        let mut population = Vec::with_capacity(args.population_per_rank);
        for _ in 0..args.population_per_rank {
            let mut genome = Genome::random(&catalogue, &info, next_uid, &mut rng)?;
            next_uid += 1;
            evaluator.evaluate(&mut genome)?;
            population.push(genome);
        }
        population
    };

    let config = DriverConfig {
        population_per_rank: args.population_per_rank,
        children_per_genome: args.children_per_genome,
        mutation_base: args.mutation_base,
        max_age: args.max_age,
        iterations: args.iterations,
    };

    let mut progress = if args.progress {
        Some(ProgressBar::new(args.iterations as u64))
    } else {
        None
    };

    let exchange = SingleNode;
    let final_population = run_driver(
        &evaluator,
        &exchange,
        &config,
        population,
        &mut next_uid,
        &mut rng,
        |_generation| {
            if let Some(bar) = progress.as_mut() {
                bar.inc();
            }
        },
    )?;

    if let Some(bar) = progress.as_mut() {
        bar.finish();
    }

    std::fs::create_dir_all(&args.checkpoint_dir).chain_err(|| "failed to create checkpoint directory")?;
    for genome in &final_population {
        checkpoint::save_genome(&args.checkpoint_dir, genome).chain_err(|| "failed to write checkpoint")?;
    }

    let best = final_population
        .iter()
        .min_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap())
        .ok_or_else(|| Error::from("optimization produced an empty population"))?;
    info!(
        "best genome: uid={} fitness={:.8E} mutations={}",
        best.uid, best.fitness, best.mutations_count
    );

    Ok(())
}
