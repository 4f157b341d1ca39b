//! Insertion-device layout generation (§4.B): turns a handful of geometry
//! parameters into the ordered slot lists (`type`, `position`,
//! `direction_matrix`, `flip_matrix`) that the genome and field evaluator
//! operate on, for each of the three supported device families.
//!
//! Grounded on `original_source/IDSort/src/id_setup.py` almost entirely;
//! the module split (`mod.rs` / `hybrid.rs` / `ppm.rs` / `apple.rs`) follows
//! the teacher's submodule-per-concern layout (c.f. `simulation/`).

pub mod apple;
pub mod hybrid;
pub mod matrices;
pub mod ppm;

use crate::catalogue::MagnetType;
use crate::errors::*;
use matrices::Matrix3;
use serde::{Deserialize, Serialize};

/// One magnet position in a beam: the type it must be filled with, its
/// nominal placement, and the direction/flip matrices applied to whatever
/// magnet is assigned there.
#[derive(Debug, Clone)]
pub struct Slot {
    pub type_tag: MagnetType,
    pub position: [f64; 3],
    pub direction_matrix: Matrix3,
    pub flip_matrix: Matrix3,
}

/// One physical beam (a row of slots running along the S axis).
#[derive(Debug, Clone)]
pub struct Beam {
    pub name: String,
    pub slots: Vec<Slot>,
}

impl Beam {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn types(&self) -> Vec<MagnetType> {
        self.slots.iter().map(|s| s.type_tag).collect()
    }
}

/// Which of the three supported mechanical families a layout implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    HybridSymmetric,
    PpmAntiSymmetric,
    AppleSymmetric,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::HybridSymmetric => "Hybrid_Symmetric",
            DeviceType::PpmAntiSymmetric => "PPM_AntiSymmetric",
            DeviceType::AppleSymmetric => "APPLE_Symmetric",
        }
    }

    pub fn parse(s: &str) -> Result<DeviceType> {
        match s {
            "Hybrid_Symmetric" => Ok(DeviceType::HybridSymmetric),
            "PPM_AntiSymmetric" => Ok(DeviceType::PpmAntiSymmetric),
            "APPLE_Symmetric" => Ok(DeviceType::AppleSymmetric),
            other => Err(ErrorKind::UnsupportedDeviceType(other.to_string()).into()),
        }
    }
}

/// A `(min, max, step)` sampling range along one spatial axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SampleRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Geometry and sampling inputs accepted from the CLI / descriptor file.
/// Field names mirror the original option parser's flag names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutParams {
    pub name: String,
    pub device_type: DeviceType,
    pub nperiods: u32,
    pub fullmagdims: [f64; 3],
    pub hemagdims: [f64; 3],
    pub vemagdims: [f64; 3],
    pub htmagdims: [f64; 3],
    pub poledims: [f64; 3],
    pub interstice: f64,
    pub gap: f64,
    pub endgapsym: f64,
    pub terminalgapsymhyb: f64,
    pub phasinggap: f64,
    pub clampcut: f64,
    pub x: SampleRange,
    pub z: SampleRange,
    pub steps: f64,
}

/// The fully generated device: beams plus the derived S-axis sampling grid.
#[derive(Debug, Clone)]
pub struct Info {
    pub name: String,
    pub device_type: DeviceType,
    pub nperiods: u32,
    pub period_length: f64,
    pub beams: Vec<Beam>,
    pub x: SampleRange,
    pub z: SampleRange,
    pub s: SampleRange,
}

/// Builds an `Info` for the requested device family, validating that every
/// beam's type/position/direction/flip lists agree in length.
pub fn generate_layout(p: &LayoutParams) -> Result<Info> {
    let (beams, period_length) = match p.device_type {
        DeviceType::HybridSymmetric => generate_hybrid(p)?,
        DeviceType::PpmAntiSymmetric => generate_ppm(p)?,
        DeviceType::AppleSymmetric => generate_apple(p)?,
    };

    for beam in &beams {
        let n = beam.slots.len();
        if n == 0 {
            return Err(ErrorKind::LayoutLengthMismatch(beam.name.clone()).into());
        }
    }

    let s = s_axis_sampling(period_length, p.nperiods, p.steps);

    Ok(Info {
        name: p.name.clone(),
        device_type: p.device_type,
        nperiods: p.nperiods,
        period_length,
        beams,
        x: p.x,
        z: p.z,
        s,
    })
}

/// S-axis sampling extents (§4.B): the evaluation window spans sixteen
/// extra periods beyond the magnet array so the field tails are captured,
/// and the step is rounded to five significant decimal places.
fn s_axis_sampling(period_length: f64, nperiods: u32, steps: f64) -> SampleRange {
    let eval_length = period_length * (nperiods as f64 + 16.0);
    let raw_step = (period_length / (4.0 * steps)) * 1e5;
    let sstep = raw_step.round() / 1e5;
    let smin = -eval_length / 2.0;
    let smax = (eval_length / 2.0) + sstep;
    SampleRange {
        min: smin,
        max: smax,
        step: sstep,
    }
}

fn make_beam(name: &str, types: Vec<MagnetType>, positions: Vec<[f64; 3]>, directions: Vec<Matrix3>, flips: Vec<Matrix3>) -> Result<Beam> {
    if types.len() != positions.len() || types.len() != directions.len() || types.len() != flips.len() {
        return Err(ErrorKind::LayoutLengthMismatch(name.to_string()).into());
    }
    let slots = types
        .into_iter()
        .zip(positions)
        .zip(directions)
        .zip(flips)
        .map(|(((type_tag, position), direction_matrix), flip_matrix)| Slot {
            type_tag,
            position,
            direction_matrix,
            flip_matrix,
        })
        .collect();
    Ok(Beam {
        name: name.to_string(),
        slots,
    })
}

fn generate_hybrid(p: &LayoutParams) -> Result<(Vec<Beam>, f64)> {
    let d = hybrid::HybridDims {
        fullmagdims: p.fullmagdims,
        hemagdims: p.hemagdims,
        htmagdims: p.htmagdims,
        poledims: p.poledims,
        interstice: p.interstice,
        gap: p.gap,
        endgapsym: p.endgapsym,
        terminalgapsymhyb: p.terminalgapsymhyb,
    };
    let top = make_beam(
        "top",
        hybrid::type_list(p.nperiods),
        hybrid::position_list_top(p.nperiods, &d),
        hybrid::direction_matrix_list_top(p.nperiods),
        hybrid::flip_matrix_list(p.nperiods),
    )?;
    let btm = make_beam(
        "btm",
        hybrid::type_list(p.nperiods),
        hybrid::position_list_btm(p.nperiods, &d),
        hybrid::direction_matrix_list_btm(p.nperiods),
        hybrid::flip_matrix_list(p.nperiods),
    )?;
    Ok((vec![top, btm], hybrid::period_length(&d)))
}

fn generate_ppm(p: &LayoutParams) -> Result<(Vec<Beam>, f64)> {
    let d = ppm::PpmDims {
        fullmagdims: p.fullmagdims,
        hemagdims: p.hemagdims,
        vemagdims: p.vemagdims,
        poledims: p.poledims,
        interstice: p.interstice,
        gap: p.gap,
        endgapsym: p.endgapsym,
    };
    let top = make_beam(
        "top",
        ppm::type_list(p.nperiods),
        ppm::position_list_top(p.nperiods, &d),
        ppm::direction_matrix_list_top(p.nperiods),
        ppm::flip_matrix_list(p.nperiods),
    )?;
    let btm = make_beam(
        "btm",
        ppm::type_list(p.nperiods),
        ppm::position_list_btm(p.nperiods, &d),
        ppm::direction_matrix_list_btm(p.nperiods),
        ppm::flip_matrix_list(p.nperiods),
    )?;
    Ok((vec![top, btm], ppm::period_length(&d)))
}

fn generate_apple(p: &LayoutParams) -> Result<(Vec<Beam>, f64)> {
    let d = apple::AppleDims {
        fullmagdims: p.fullmagdims,
        hemagdims: p.hemagdims,
        vemagdims: p.vemagdims,
        poledims: p.poledims,
        interstice: p.interstice,
        gap: p.gap,
        endgapsym: p.endgapsym,
        phasinggap: p.phasinggap,
        clampcut: p.clampcut,
    };
    let quads: [(&str, apple::Quadrant, Vec<Matrix3>); 4] = [
        ("q1", apple::Quadrant::Q1, apple::direction_matrix_list_q1(p.nperiods)),
        ("q2", apple::Quadrant::Q2, apple::direction_matrix_list_q2(p.nperiods)),
        ("q3", apple::Quadrant::Q3, apple::direction_matrix_list_q3(p.nperiods)),
        ("q4", apple::Quadrant::Q4, apple::direction_matrix_list_q4(p.nperiods)),
    ];
    let mut beams = Vec::with_capacity(4);
    for (name, quadrant, directions) in quads {
        let beam = make_beam(
            name,
            apple::type_list(p.nperiods),
            apple::position_list_quadrant(quadrant, p.nperiods, &d),
            directions,
            apple::flip_matrix_list(p.nperiods),
        )?;
        beams.push(beam);
    }
    Ok((beams, apple::period_length(&d)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params(device_type: DeviceType, nperiods: u32) -> LayoutParams {
        LayoutParams {
            name: "test".into(),
            device_type,
            nperiods,
            fullmagdims: [41., 16., 6.22],
            hemagdims: [41., 16., 4.0],
            vemagdims: [41., 16., 4.0],
            htmagdims: [41., 16., 4.0],
            poledims: [41., 16., 4.0],
            interstice: 0.03,
            gap: 6.15,
            endgapsym: 5.0,
            terminalgapsymhyb: 5.0,
            phasinggap: 2.0,
            clampcut: 3.0,
            x: SampleRange { min: -10.0, max: 10.0, step: 1.0 },
            z: SampleRange { min: -10.0, max: 10.0, step: 1.0 },
            steps: 10.0,
        }
    }

    #[test]
    fn hybrid_scenario_beam_lengths() {
        let info = generate_layout(&base_params(DeviceType::HybridSymmetric, 2)).unwrap();
        assert_eq!(info.beams.len(), 2);
        for beam in &info.beams {
            assert_eq!(beam.len(), 8);
        }
    }

    #[test]
    fn ppm_scenario_beam_lengths() {
        let info = generate_layout(&base_params(DeviceType::PpmAntiSymmetric, 1)).unwrap();
        assert_eq!(info.beams.len(), 2);
        for beam in &info.beams {
            assert_eq!(beam.len(), 9);
        }
    }

    #[test]
    fn apple_scenario_beam_lengths() {
        let info = generate_layout(&base_params(DeviceType::AppleSymmetric, 3)).unwrap();
        assert_eq!(info.beams.len(), 4);
        for beam in &info.beams {
            assert_eq!(beam.len(), 11);
        }
    }

    #[test]
    fn s_sampling_window_covers_sixteen_extra_periods() {
        let info = generate_layout(&base_params(DeviceType::HybridSymmetric, 2)).unwrap();
        assert!(info.s.max > info.s.min);
        assert!((info.s.min + (info.period_length * (2.0 + 16.0) / 2.0)).abs() < 1e-9);
    }
}
