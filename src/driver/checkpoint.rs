//! Genome checkpointing: persists the population to disk so a run can be
//! restarted, and reconstructs a population from an existing checkpoint
//! directory.
//!
//! Grounded on `original_source/IDSort/src/mpi_runner.py`'s genome save
//! path (`%1.8E`-encoded fitness in the filename) and its restart scan.

use crate::errors::*;
use crate::genome::Genome;
use std::fs;
use std::path::Path;

/// Writes one genome to `dir/<fitness>_<uid>_<age>.json`.
pub fn save_genome(dir: &Path, genome: &Genome) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.json", genome.checkpoint_stem()));
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, genome)?;
    Ok(())
}

/// Loads every genome found directly under `dir`, sorted by filename (and
/// therefore by fitness, since the filename is fitness-prefixed).
pub fn load_population(dir: &Path) -> Result<Vec<Genome>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut genomes = Vec::with_capacity(paths.len());
    for path in paths {
        let file = fs::File::open(&path)?;
        let genome: Genome = serde_json::from_reader(file)?;
        genomes.push(genome);
    }
    Ok(genomes)
}

/// Loads a population for restart, erroring if none was found — a restart
/// with nothing to restart from is a configuration mistake, not a case to
/// silently fall back from.
pub fn load_for_restart(dir: &Path) -> Result<Vec<Genome>> {
    let genomes = load_population(dir)?;
    if genomes.is_empty() {
        return Err(ErrorKind::NoGenomesLoaded.into());
    }
    Ok(genomes)
}
