//! PPM Anti-Symmetric device family (2 beams).
//!
//! Grounded on `original_source/IDSort/src/id_setup.py`'s
//! `create_{type,position,direction_matrix,flip_matrix}_list_ppm_antisymmetric*`.

use super::matrices::Matrix3;
use crate::catalogue::MagnetType;

pub struct PpmDims {
    pub fullmagdims: [f64; 3],
    pub hemagdims: [f64; 3],
    pub vemagdims: [f64; 3],
    pub poledims: [f64; 3],
    pub interstice: f64,
    pub gap: f64,
    pub endgapsym: f64,
}

pub fn type_list(nperiods: u32) -> Vec<MagnetType> {
    let mut body = Vec::with_capacity(4 * nperiods as usize + 1);
    for i in 0..(4 * nperiods + 1) {
        body.push(if i % 2 == 0 { MagnetType::HH } else { MagnetType::VV });
    }
    let mut v = vec![MagnetType::HE, MagnetType::VE];
    v.extend(body);
    v.push(MagnetType::VE);
    v.push(MagnetType::HE);
    v
}

pub fn flip_matrix_list(nperiods: u32) -> Vec<Matrix3> {
    let mut v: Vec<Matrix3> = std::iter::repeat([Matrix3::ROTS_180, Matrix3::ROTZ_180])
        .take((nperiods as usize + 1) * 2)
        .flatten()
        .collect();
    v.push(Matrix3::ROTS_180);
    v
}

pub fn direction_matrix_list_top(nperiods: u32) -> Vec<Matrix3> {
    let mut v: Vec<Matrix3> = std::iter::repeat([
        Matrix3::ROTZ_180,
        Matrix3::IDENTITY,
        Matrix3::IDENTITY,
        Matrix3::ROTS_180,
    ])
    .take(nperiods as usize + 1)
    .flatten()
    .collect();
    v.push(Matrix3::ROTZ_180);
    v
}

pub fn direction_matrix_list_btm(nperiods: u32) -> Vec<Matrix3> {
    let mut v: Vec<Matrix3> = std::iter::repeat([
        Matrix3::IDENTITY,
        Matrix3::IDENTITY,
        Matrix3::ROTZ_180,
        Matrix3::ROTS_180,
    ])
    .take(nperiods as usize + 1)
    .flatten()
    .collect();
    v.push(Matrix3::IDENTITY);
    v
}

fn position_list(x: f64, z: f64, nperiods: u32, d: &PpmDims) -> Vec<[f64; 3]> {
    let types = type_list(nperiods);
    let mut lengths = Vec::with_capacity(types.len());
    for t in &types {
        let dims = dims_for(*t, d);
        lengths.push(dims[2]);
    }
    let total: f64 = lengths.iter().sum::<f64>()
        + (d.poledims[2] * (types.len() as f64 - 1.0))
        + (2.0 * d.interstice * (types.len() as f64 - 1.0))
        + (2.0 * d.endgapsym);
    let mut s = -(total / 2.0) + d.endgapsym;

    let mut positions = Vec::with_capacity(types.len());
    for (i, len) in lengths.iter().enumerate() {
        positions.push([x, z, s]);
        if i + 1 < lengths.len() {
            s += len + d.poledims[2] + (2.0 * d.interstice);
        }
    }
    positions
}

pub fn position_list_top(nperiods: u32, d: &PpmDims) -> Vec<[f64; 3]> {
    let x = -(d.fullmagdims[0] / 2.);
    let z = d.gap / 2.;
    position_list(x, z, nperiods, d)
}

pub fn position_list_btm(nperiods: u32, d: &PpmDims) -> Vec<[f64; 3]> {
    let x = -(d.fullmagdims[0] / 2.);
    let z = -d.fullmagdims[1] - (d.gap / 2.);
    position_list(x, z, nperiods, d)
}

pub fn dims_for(t: MagnetType, d: &PpmDims) -> [f64; 3] {
    match t {
        MagnetType::HH | MagnetType::VV => d.fullmagdims,
        MagnetType::HE => d.hemagdims,
        MagnetType::VE => d.vemagdims,
        _ => unreachable!("ppm anti-symmetric only uses HH/VV/HE/VE"),
    }
}

pub fn period_length(d: &PpmDims) -> f64 {
    2. * (d.fullmagdims[2] + d.poledims[2] + (2. * d.interstice))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_2_nperiods_1() {
        let types = type_list(1);
        assert_eq!(types.len(), 9);
        assert_eq!(
            types,
            vec![
                MagnetType::HE,
                MagnetType::VE,
                MagnetType::HH,
                MagnetType::VV,
                MagnetType::HH,
                MagnetType::VV,
                MagnetType::HH,
                MagnetType::VE,
                MagnetType::HE,
            ]
        );

        let flips = flip_matrix_list(1);
        assert_eq!(flips.len(), 9);

        let top_dirs = direction_matrix_list_top(1);
        assert_eq!(top_dirs.len(), 9);
    }
}
