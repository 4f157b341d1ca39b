//! Genomes: a candidate assignment of real magnets to layout slots.
//!
//! A genome is, per magnet type, a permutation of that type's magnet pool
//! (one entry per slot needing that type, in beam-then-slot order) plus a
//! parallel flip bit saying whether the magnet sits in its catalogue
//! orientation or rotated 180 degrees about S. Mutation and child
//! generation operate purely on these permutations; the field evaluator
//! (`field`) and loss functions (`loss`) are what turn a genome into a
//! fitness.
//!
//! Grounded on `original_source/IDSort/src/mpi_runner.py`'s `BCell` class
//! and its `mutate`/`generate_children` methods.

use crate::catalogue::{MagnetCatalogue, MagnetType};
use crate::errors::*;
use crate::layout::Info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The permutation and flip assignment for a single magnet type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// `order[i]` is the pool index of the magnet placed at the i-th slot
    /// of this type (slots enumerated beam-major, then slot-major).
    pub order: Vec<usize>,
    pub flips: Vec<bool>,
}

/// A candidate full assignment of magnets to every slot in a layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    pub uid: u64,
    pub age: u32,
    pub mutations_count: u32,
    pub fitness: f64,
    assignments: HashMap<MagnetType, Assignment>,
}

impl Genome {
    /// Builds a genome with a uniformly random permutation and random flip
    /// bits for every type present in `info`'s slots, validated against
    /// `catalogue` (every type must have exactly as many magnets as slots).
    pub fn random<R: Rng>(catalogue: &MagnetCatalogue, info: &Info, uid: u64, rng: &mut R) -> Result<Genome> {
        let mut assignments = HashMap::new();
        for (t, count) in slot_counts(info) {
            let pool = catalogue
                .pool(t)
                .ok_or_else(|| ErrorKind::EmptyMagnetPool(t.to_string()))?;
            if pool.len() != count {
                return Err(ErrorKind::LayoutLengthMismatch(format!(
                    "{} has {} magnets but layout needs {}",
                    t, pool.len(), count
                ))
                .into());
            }
            let mut order: Vec<usize> = (0..count).collect();
            order.shuffle(rng);
            let flips: Vec<bool> = (0..count).map(|_| rng.gen_bool(0.5)).collect();
            assignments.insert(t, Assignment { order, flips });
        }
        Ok(Genome {
            uid,
            age: 0,
            mutations_count: 0,
            fitness: f64::INFINITY,
            assignments,
        })
    }

    pub fn assignment(&self, t: MagnetType) -> Option<&Assignment> {
        self.assignments.get(&t)
    }

    pub fn assignment_mut(&mut self, t: MagnetType) -> Option<&mut Assignment> {
        self.assignments.get_mut(&t)
    }

    /// Applies `k` random mutations: each picks a magnet type at random
    /// (weighted by how many slots it has) and either swaps two of its
    /// slot assignments or flips one bit.
    pub fn mutate<R: Rng>(&mut self, k: u32, rng: &mut R) {
        let types: Vec<MagnetType> = self.assignments.keys().copied().collect();
        if types.is_empty() {
            return;
        }
        let weights: Vec<usize> = types.iter().map(|t| self.assignments[t].order.len()).collect();
        let total: usize = weights.iter().sum();
        if total == 0 {
            return;
        }
        for _ in 0..k {
            let mut pick = rng.gen_range(0..total);
            let mut chosen = types[0];
            for (t, w) in types.iter().zip(&weights) {
                if pick < *w {
                    chosen = *t;
                    break;
                }
                pick -= *w;
            }
            let a = self.assignments.get_mut(&chosen).unwrap();
            let n = a.order.len();
            if n < 2 {
                continue;
            }
            if rng.gen_bool(0.5) {
                let i = rng.gen_range(0..n);
                let j = rng.gen_range(0..n);
                a.order.swap(i, j);
            } else {
                let i = rng.gen_range(0..n);
                a.flips[i] = !a.flips[i];
            }
        }
        self.mutations_count += k;
    }

    /// Produces `n` children, each a clone mutated by `k` fresh mutations,
    /// with a new uid and reset age/mutation counters (the evolutionary
    /// driver assigns uids and re-evaluates fitness afterward).
    pub fn generate_children<R: Rng>(&self, n: u32, k: u32, next_uid: &mut u64, rng: &mut R) -> Vec<Genome> {
        (0..n)
            .map(|_| {
                let mut child = self.clone();
                child.uid = *next_uid;
                *next_uid += 1;
                child.age = 0;
                child.mutations_count = 0;
                child.mutate(k, rng);
                child
            })
            .collect()
    }

    /// Filename stem used for checkpointed genomes: `%1.8E` fitness
    /// followed by uid and age, matching the original restart-scan format.
    pub fn checkpoint_stem(&self) -> String {
        format!("{:1.8E}_{}_{}", self.fitness, self.uid, self.age)
    }
}

/// Counts how many slots of each type a layout needs, across all beams.
fn slot_counts(info: &Info) -> Vec<(MagnetType, usize)> {
    let mut counts: HashMap<MagnetType, usize> = HashMap::new();
    for beam in &info.beams {
        for slot in &beam.slots {
            *counts.entry(slot.type_tag).or_insert(0) += 1;
        }
    }
    counts.into_iter().collect()
}
