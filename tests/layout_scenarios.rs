//! The three literal device layouts used as acceptance scenarios: one per
//! supported mechanical family, each at a small period count so the
//! expected slot sequence can be written out by hand and checked exactly.

use idsort::catalogue::MagnetType;
use idsort::layout::{generate_layout, DeviceType, LayoutParams, SampleRange};

fn dims() -> (
    [f64; 3],
    [f64; 3],
    [f64; 3],
    [f64; 3],
    [f64; 3],
) {
    (
        [41., 16., 6.22], // fullmagdims
        [41., 16., 4.0],  // hemagdims
        [41., 16., 4.0],  // vemagdims
        [41., 16., 4.0],  // htmagdims
        [41., 16., 4.0],  // poledims
    )
}

fn base_params(device_type: DeviceType, nperiods: u32) -> LayoutParams {
    let (fullmagdims, hemagdims, vemagdims, htmagdims, poledims) = dims();
    LayoutParams {
        name: "scenario".into(),
        device_type,
        nperiods,
        fullmagdims,
        hemagdims,
        vemagdims,
        htmagdims,
        poledims,
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
fn hybrid_symmetric_two_periods_matches_the_expected_type_sequence() {
    let info = generate_layout(&base_params(DeviceType::HybridSymmetric, 2)).unwrap();
    assert_eq!(info.beams.len(), 2);

    let expected = [
        MagnetType::HT,
        MagnetType::HE,
        MagnetType::HH,
        MagnetType::HH,
        MagnetType::HH,
        MagnetType::HH,
        MagnetType::HE,
        MagnetType::HT,
    ];
    for beam in &info.beams {
        let types = beam.types();
        assert_eq!(types, expected);
    }
}

#[test]
fn ppm_antisymmetric_one_period_matches_the_expected_type_sequence() {
    let info = generate_layout(&base_params(DeviceType::PpmAntiSymmetric, 1)).unwrap();
    assert_eq!(info.beams.len(), 2);

    let expected = [
        MagnetType::HE,
        MagnetType::VE,
        MagnetType::HH,
        MagnetType::VV,
        MagnetType::HH,
        MagnetType::VV,
        MagnetType::HH,
        MagnetType::VE,
        MagnetType::HE,
    ];
    for beam in &info.beams {
        let types = beam.types();
        assert_eq!(types, expected);
    }
}

#[test]
fn apple_symmetric_three_periods_matches_the_expected_type_sequence() {
    let info = generate_layout(&base_params(DeviceType::AppleSymmetric, 3)).unwrap();
    assert_eq!(info.beams.len(), 4);

    let expected = [
        MagnetType::HE,
        MagnetType::VE,
        MagnetType::HE,
        MagnetType::VV,
        MagnetType::HH,
        MagnetType::VV,
        MagnetType::HH,
        MagnetType::VV,
        MagnetType::HE,
        MagnetType::VE,
        MagnetType::HE,
    ];
    for beam in &info.beams {
        let types = beam.types();
        assert_eq!(types, expected);
    }
}

#[test]
fn s_axis_window_grows_with_period_count() {
    let short = generate_layout(&base_params(DeviceType::HybridSymmetric, 1)).unwrap();
    let long = generate_layout(&base_params(DeviceType::HybridSymmetric, 5)).unwrap();
    assert!((long.s.max - long.s.min) > (short.s.max - short.s.min));
}
