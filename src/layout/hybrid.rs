//! Hybrid Symmetric device family (2 beams).
//!
//! Grounded on `original_source/IDSort/src/id_setup.py`'s
//! `create_{type,position,direction_matrix,flip_matrix}_list_hybrid_symmetric*`.

use super::matrices::Matrix3;
use crate::catalogue::MagnetType;

pub struct HybridDims {
    pub fullmagdims: [f64; 3],
    pub hemagdims: [f64; 3],
    pub htmagdims: [f64; 3],
    pub poledims: [f64; 3],
    pub interstice: f64,
    pub gap: f64,
    pub endgapsym: f64,
    pub terminalgapsymhyb: f64,
}

pub fn type_list(nperiods: u32) -> Vec<MagnetType> {
    let mut v = vec![MagnetType::HT, MagnetType::HE];
    v.extend(std::iter::repeat(MagnetType::HH).take(2 * nperiods as usize));
    v.push(MagnetType::HE);
    v.push(MagnetType::HT);
    v
}

pub fn flip_matrix_list(nperiods: u32) -> Vec<Matrix3> {
    vec![Matrix3::ROTS_180; (2 * nperiods as usize) + 4]
}

fn position_list(x: f64, z: f64, nperiods: u32, d: &HybridDims) -> Vec<[f64; 3]> {
    let n = nperiods as f64;
    let length = (n
        * ((2. * d.poledims[2]) + (2. * d.fullmagdims[2]) + (4. * d.interstice)))
        + (2. * (d.poledims[2] + d.interstice + d.hemagdims[2] + d.endgapsym + d.terminalgapsymhyb + d.htmagdims[2]));

    let mut s = -(length / 2.);
    let mut positions = vec![[x, z, s]];
    s += d.htmagdims[2] + d.endgapsym + d.terminalgapsymhyb + (d.poledims[2] / 2.);

    positions.push([x, z, s]);
    s += d.hemagdims[2] + d.poledims[2] + (2. * d.interstice);

    for _ in 0..(2 * nperiods) {
        positions.push([x, z, s]);
        s += d.fullmagdims[2] + d.poledims[2] + (2. * d.interstice);
    }

    positions.push([x, z, s]);
    s += d.hemagdims[2] + (d.poledims[2] / 2.) + d.endgapsym + d.terminalgapsymhyb;

    positions.push([x, z, s]);
    let _ = s;
    positions
}

pub fn position_list_top(nperiods: u32, d: &HybridDims) -> Vec<[f64; 3]> {
    let x = -(d.fullmagdims[0] / 2.);
    let z = d.gap / 2.;
    position_list(x, z, nperiods, d)
}

pub fn position_list_btm(nperiods: u32, d: &HybridDims) -> Vec<[f64; 3]> {
    let x = -(d.fullmagdims[0] / 2.);
    let z = -d.fullmagdims[1] - (d.gap / 2.);
    position_list(x, z, nperiods, d)
}

pub fn direction_matrix_list_top(nperiods: u32) -> Vec<Matrix3> {
    std::iter::repeat([Matrix3::ROTZ_180, Matrix3::IDENTITY])
        .take(nperiods as usize + 2)
        .flatten()
        .collect()
}

pub fn direction_matrix_list_btm(nperiods: u32) -> Vec<Matrix3> {
    std::iter::repeat([Matrix3::IDENTITY, Matrix3::ROTZ_180])
        .take(nperiods as usize + 2)
        .flatten()
        .collect()
}

/// Dimensions used for each slot type, keyed the same way as the type list.
pub fn dims_for(t: MagnetType, d: &HybridDims) -> [f64; 3] {
    match t {
        MagnetType::HH => d.fullmagdims,
        MagnetType::HE => d.hemagdims,
        MagnetType::HT => d.htmagdims,
        _ => unreachable!("hybrid symmetric only uses HH/HE/HT"),
    }
}

/// S-axis period length as used for sampling grid sizing (§4.B).
pub fn period_length(d: &HybridDims) -> f64 {
    2. * (d.fullmagdims[2] + d.poledims[2] + (2. * d.interstice))
}
