//! The per-beam lookup tensor (§3): precomputed geometry/field-transfer
//! data that `field::synthesize` contracts against a genome's oriented
//! magnet vectors to produce the sampled field, rather than resynthesizing
//! the device's magnetostatics from scratch on every genome evaluation.
//!
//! Grounded on `original_source/IDSort/src/field_generator.py`'s
//! `generate_per_beam_bfield`/`generate_per_magnet_array`, and on spec.md
//! §3's `(nx, nz, ns, 3, 3, N)` shape contract.

use ndarray::Array6;
use serde::{Deserialize, Serialize};

/// One beam's lookup tensor: `data[[ix, iz, is, a, c, i]]` is slot `i`'s
/// transfer coefficient from magnet field-axis `c` to output field-axis
/// `a` at grid point `(ix, iz, is)`. Shape `(nx, nz, ns, 3, 3, n_slots)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupTensor {
    pub data: Array6<f64>,
}

impl LookupTensor {
    pub fn new(data: Array6<f64>) -> LookupTensor {
        LookupTensor { data }
    }

    /// `(nx, nz, ns)`, the first three axes.
    pub fn grid_dims(&self) -> (usize, usize, usize) {
        let s = self.data.shape();
        (s[0], s[1], s[2])
    }

    /// Number of slots this beam's tensor covers (the last axis).
    pub fn n_slots(&self) -> usize {
        self.data.shape()[5]
    }
}
