//! Core library for the insertion-device assembly optimizer.
//!
//! Three coupled pieces live here: the magnet catalogue and layout
//! generator (`catalogue`, `layout`), the field evaluator (`field`,
//! `loss`), and the genome / evolutionary driver (`genome`, `driver`).
//! External codecs (ID descriptor JSON, catalogue file, lookup store) live
//! under `io`.

#[macro_use]
extern crate error_chain;

pub mod catalogue;
pub mod driver;
pub mod errors;
pub mod field;
pub mod genome;
pub mod io;
pub mod layout;
pub mod loss;

/// Floating point precision used throughout the crate.
pub type Float = f64;
