//! APPLE-II Symmetric device family (4 beams: Q1-Q4).
//!
//! Grounded on `original_source/IDSort/src/id_setup.py`'s
//! `create_{type,position,direction_matrix,flip_matrix}_list_apple_symmetric*`.

use super::matrices::Matrix3;
use crate::catalogue::MagnetType;

pub struct AppleDims {
    pub fullmagdims: [f64; 3],
    pub hemagdims: [f64; 3],
    pub vemagdims: [f64; 3],
    pub poledims: [f64; 3],
    pub interstice: f64,
    pub gap: f64,
    pub endgapsym: f64,
    pub phasinggap: f64,
    pub clampcut: f64,
}

/// Which of the four APPLE-II quadrant beams a slot list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    Q1,
    Q2,
    Q3,
    Q4,
}

pub fn type_list(nperiods: u32) -> Vec<MagnetType> {
    let body_len = (4 * nperiods).saturating_sub(7);
    let mut body = Vec::with_capacity(body_len as usize);
    for i in 0..body_len {
        body.push(if i % 2 == 0 { MagnetType::VV } else { MagnetType::HH });
    }
    let ends = [MagnetType::HE, MagnetType::VE, MagnetType::HE];
    let mut v = ends.to_vec();
    v.extend(body);
    v.extend(ends.iter().rev().copied());
    v
}

pub fn flip_matrix_list(nperiods: u32) -> Vec<Matrix3> {
    let reps = (2 * nperiods as usize).saturating_sub(1);
    let mut v: Vec<Matrix3> = std::iter::repeat([Matrix3::ROTS_180, Matrix3::IDENTITY])
        .take(reps)
        .flatten()
        .collect();
    v.push(Matrix3::ROTS_180);
    v
}

fn direction_matrix_list(nperiods: u32, quadrant: Quadrant) -> Vec<Matrix3> {
    let reps = nperiods as usize - 1;
    let (pattern, tail): ([Matrix3; 4], Matrix3) = match quadrant {
        Quadrant::Q1 => (
            [
                Matrix3::ROTZ_180,
                Matrix3::IDENTITY,
                Matrix3::IDENTITY,
                Matrix3::ROTS_180,
            ],
            Matrix3::ROTZ_180,
        ),
        Quadrant::Q2 => (
            [
                Matrix3::ROTS_270,
                Matrix3::ROTS_90,
                Matrix3::ROTS_90,
                Matrix3::ROTS_270_ROTZ_180,
            ],
            Matrix3::ROTS_270,
        ),
        Quadrant::Q3 => (
            [
                Matrix3::IDENTITY,
                Matrix3::IDENTITY,
                Matrix3::ROTZ_180,
                Matrix3::ROTS_180,
            ],
            Matrix3::IDENTITY,
        ),
        Quadrant::Q4 => (
            [
                Matrix3::ROTS_90,
                Matrix3::ROTS_270,
                Matrix3::ROTS_270,
                Matrix3::ROTS_270_ROTX_180,
            ],
            Matrix3::ROTS_90,
        ),
    };
    let mut v: Vec<Matrix3> = std::iter::repeat(pattern).take(reps).flatten().collect();
    v.push(tail);
    v
}

pub fn direction_matrix_list_q1(nperiods: u32) -> Vec<Matrix3> {
    direction_matrix_list(nperiods, Quadrant::Q1)
}
pub fn direction_matrix_list_q2(nperiods: u32) -> Vec<Matrix3> {
    direction_matrix_list(nperiods, Quadrant::Q2)
}
pub fn direction_matrix_list_q3(nperiods: u32) -> Vec<Matrix3> {
    direction_matrix_list(nperiods, Quadrant::Q3)
}
pub fn direction_matrix_list_q4(nperiods: u32) -> Vec<Matrix3> {
    direction_matrix_list(nperiods, Quadrant::Q4)
}

fn position_list(x: f64, z: f64, nperiods: u32, d: &AppleDims) -> Vec<[f64; 3]> {
    let types = type_list(nperiods);
    let lengths: Vec<f64> = types.iter().map(|t| dims_for(*t, d)[2]).collect();
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

/// Quadrant transverse offsets: Q1/Q3 share the top/bottom gap split used by
/// the two-beam families, Q2/Q4 are shifted in x by the phasing gap and
/// clamp cutout (§4.B APPLE-II).
pub fn position_list_quadrant(quadrant: Quadrant, nperiods: u32, d: &AppleDims) -> Vec<[f64; 3]> {
    let half_x = d.fullmagdims[0] / 2.;
    let half_z = d.gap / 2.;
    let (x, z) = match quadrant {
        Quadrant::Q1 => (-half_x, half_z),
        Quadrant::Q2 => (-half_x - d.phasinggap - d.clampcut, half_z),
        Quadrant::Q3 => (-half_x, -d.fullmagdims[1] - half_z),
        Quadrant::Q4 => (-half_x - d.phasinggap - d.clampcut, -d.fullmagdims[1] - half_z),
    };
    position_list(x, z, nperiods, d)
}

pub fn dims_for(t: MagnetType, d: &AppleDims) -> [f64; 3] {
    match t {
        MagnetType::HH | MagnetType::VV => d.fullmagdims,
        MagnetType::HE => d.hemagdims,
        MagnetType::VE => d.vemagdims,
        _ => unreachable!("apple symmetric only uses HH/VV/HE/VE"),
    }
}

pub fn period_length(d: &AppleDims) -> f64 {
    2. * (d.fullmagdims[2] + d.poledims[2] + (2. * d.interstice))
}
