//! Loss functions (§4.E): turn a synthesized field and its double-integrated
//! trajectory into scalars a genome can be ranked by.
//!
//! Grounded on `original_source/IDSort/src/field_generator.py::
//! calculate_bfield_loss` and `calculate_trajectory_loss`, which both
//! slice their last axis `[..., 2:4]` before summing squared differences —
//! preserved here exactly, not reinterpreted as the leading `0..2` axes.

use ndarray::{s, Array4};

/// Sum of squared differences between a candidate field and the reference
/// field, over the trailing `[..., 2:4]` slice of the field's component
/// axis. `B` has exactly 3 components, so this clips to just the last one
/// (`Bs`), matching numpy's out-of-range slice clipping in the original.
pub fn bfield_loss(candidate: &Array4<f64>, reference: &Array4<f64>) -> f64 {
    debug_assert_eq!(candidate.dim(), reference.dim());
    let a = candidate.slice(s![.., .., .., 2..]);
    let b = reference.slice(s![.., .., .., 2..]);
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Sum of squared differences between a candidate trajectory tensor and
/// the reference trajectory tensor, over the second-integral components
/// (indices 2, 3 of the trailing `(x, z, second_integral_x,
/// second_integral_z)` axis).
pub fn trajectory_loss(candidate: &Array4<f64>, reference: &Array4<f64>) -> f64 {
    debug_assert_eq!(candidate.dim(), reference.dim());
    let a = candidate.slice(s![.., .., .., 2..4]);
    let b = reference.slice(s![.., .., .., 2..4]);
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// A genome's fitness (lower is better): the trajectory loss against the
/// reference trajectory, and nothing else. `bfield_loss` is not part of
/// the optimized objective; it exists for direct comparison only.
pub fn fitness(traj_loss: f64) -> f64 {
    traj_loss
}
