//! Typed pools of real magnets with measured field vectors, and synthesis
//! of an idealized reference magnet set.
//!
//! Grounded on `original_source/IDSort/src/field_generator.py::
//! generate_reference_magnets`.

use crate::errors::*;
use crate::layout::matrices::Matrix3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Closed set of physical magnet roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MagnetType {
    /// Standard horizontal field magnet.
    HH,
    /// Standard vertical field magnet.
    VV,
    /// Horizontal end magnet.
    HE,
    /// Vertical end magnet.
    VE,
    /// Horizontal terminator (kicker) magnet.
    HT,
}

impl MagnetType {
    pub const ALL: [MagnetType; 5] = [
        MagnetType::HH,
        MagnetType::VV,
        MagnetType::HE,
        MagnetType::VE,
        MagnetType::HT,
    ];
}

impl std::fmt::Display for MagnetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// An individual physical magnet. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Magnet {
    pub id: String,
    pub field: [f64; 3],
    pub mtype: MagnetType,
}

/// An ordered, keyed pool of magnets for one type, plus derived scalars.
#[derive(Debug, Clone, Default)]
pub struct MagnetPool {
    /// Insertion-ordered; the order is part of the catalogue's determinism
    /// contract (restart/round-trip rely on it).
    entries: Vec<(String, Magnet)>,
    index: HashMap<String, usize>,
}

impl MagnetPool {
    pub fn push(&mut self, magnet: Magnet) {
        let key = magnet.id.clone();
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, magnet));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Magnet> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn first(&self) -> Option<&Magnet> {
        self.entries.first().map(|(_, m)| m)
    }
}

/// A mapping from type tag to an ordered, keyed pool of magnets, plus
/// per-type mean field magnitude and canonical flip matrix.
#[derive(Debug, Clone, Default)]
pub struct MagnetCatalogue {
    pools: HashMap<MagnetType, MagnetPool>,
    mean_field: HashMap<MagnetType, f64>,
    flip_matrix: HashMap<MagnetType, Matrix3>,
}

impl MagnetCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_magnet(&mut self, magnet: Magnet) {
        self.pools.entry(magnet.mtype).or_default().push(magnet);
    }

    pub fn set_flip_matrix(&mut self, t: MagnetType, m: Matrix3) {
        self.flip_matrix.insert(t, m);
    }

    pub fn pool(&self, t: MagnetType) -> Option<&MagnetPool> {
        self.pools.get(&t)
    }

    pub fn flip_matrix(&self, t: MagnetType) -> Matrix3 {
        self.flip_matrix.get(&t).copied().unwrap_or(Matrix3::IDENTITY)
    }

    pub fn mean_field(&self, t: MagnetType) -> f64 {
        self.mean_field.get(&t).copied().unwrap_or(0.0)
    }

    /// Recomputes `mean_field` for every type present from the field
    /// magnitudes of its magnets. Called once after loading.
    pub fn recompute_mean_fields(&mut self) {
        for (t, pool) in &self.pools {
            let n = pool.len() as f64;
            let sum: f64 = pool
                .entries
                .iter()
                .map(|(_, m)| (m.field[0].powi(2) + m.field[1].powi(2) + m.field[2].powi(2)).sqrt())
                .sum();
            self.mean_field.insert(*t, if n > 0.0 { sum / n } else { 0.0 });
        }
    }

    /// Validates that every magnet type needed by a layout is present and
    /// non-empty. Called before building a genome.
    pub fn validate_nonempty(&self, types: &[MagnetType]) -> Result<()> {
        for t in types {
            match self.pools.get(t) {
                Some(p) if !p.is_empty() => {}
                _ => return Err(ErrorKind::EmptyMagnetPool(t.to_string()).into()),
            }
        }
        Ok(())
    }

    /// Synthesizes the idealized reference magnet set (§4.A): for each
    /// type, take the argmax-magnitude axis of the first real magnet as
    /// the canonical easy axis, and build a reference field vector with
    /// only that axis nonzero, set to `mean_field[type]`. The reference
    /// pool shares the real pool's keys and canonical flip matrix.
    pub fn synthesize_reference(&self) -> Result<MagnetCatalogue> {
        let mut reference = MagnetCatalogue::new();

        for (t, pool) in &self.pools {
            let first = pool
                .first()
                .ok_or_else(|| ErrorKind::EmptyMagnetPool(t.to_string()))?;

            let easy_axis = argmax_abs(&first.field);
            let magnitude = self.mean_field(*t);

            let mut ref_field = [0.0; 3];
            ref_field[easy_axis] = magnitude;

            for key in pool.keys() {
                reference.insert_magnet(Magnet {
                    id: key.to_string(),
                    field: ref_field,
                    mtype: *t,
                });
            }
            reference.set_flip_matrix(*t, self.flip_matrix(*t));
        }
        reference.recompute_mean_fields();
        Ok(reference)
    }
}

fn argmax_abs(v: &[f64; 3]) -> usize {
    let mut best = 0;
    let mut best_val = v[0].abs();
    for (i, &x) in v.iter().enumerate().skip(1) {
        if x.abs() > best_val {
            best = i;
            best_val = x.abs();
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalogue() -> MagnetCatalogue {
        let mut cat = MagnetCatalogue::new();
        cat.insert_magnet(Magnet {
            id: "HH-001".into(),
            field: [0.1, 1.23, -0.05],
            mtype: MagnetType::HH,
        });
        cat.insert_magnet(Magnet {
            id: "HH-002".into(),
            field: [0.05, 1.27, 0.02],
            mtype: MagnetType::HH,
        });
        cat.set_flip_matrix(MagnetType::HH, Matrix3::ROTS_180);
        cat.recompute_mean_fields();
        cat
    }

    #[test]
    fn reference_field_has_single_nonzero_axis() {
        let cat = sample_catalogue();
        let reference = cat.synthesize_reference().unwrap();
        let pool = reference.pool(MagnetType::HH).unwrap();
        for key in pool.keys() {
            let m = pool.get(key).unwrap();
            let nonzero: Vec<usize> = m
                .field
                .iter()
                .enumerate()
                .filter(|(_, v)| **v != 0.0)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(nonzero, vec![1]);
            assert_eq!(m.field[1], cat.mean_field(MagnetType::HH));
        }
    }

    #[test]
    fn reference_keeps_same_keys_and_flip() {
        let cat = sample_catalogue();
        let reference = cat.synthesize_reference().unwrap();
        let real_keys: Vec<&str> = cat.pool(MagnetType::HH).unwrap().keys().collect();
        let ref_keys: Vec<&str> = reference.pool(MagnetType::HH).unwrap().keys().collect();
        assert_eq!(real_keys, ref_keys);
        assert_eq!(
            reference.flip_matrix(MagnetType::HH),
            cat.flip_matrix(MagnetType::HH)
        );
    }

    #[test]
    fn empty_pool_rejected() {
        let cat = MagnetCatalogue::new();
        assert!(cat.validate_nonempty(&[MagnetType::HH]).is_err());
    }
}
