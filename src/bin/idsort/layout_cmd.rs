//! `idsort layout`: turns geometry flags into an ID descriptor file.
//!
//! Flag surface mirrors `original_source/IDSort/src/id_setup.py`'s option
//! parser.

use clap::Args;
use idsort::errors::*;
use idsort::io::descriptor;
use idsort::layout::{generate_layout, DeviceType, LayoutParams, SampleRange};
use log::info;
use std::path::PathBuf;

#[derive(Args)]
pub struct LayoutArgs {
    /// Device name, used as the descriptor's identifier.
    #[arg(long)]
    name: String,

    /// One of Hybrid_Symmetric, PPM_AntiSymmetric, APPLE_Symmetric.
    #[arg(long)]
    device_type: String,

    #[arg(long)]
    nperiods: u32,

    #[arg(long, num_args = 3, value_names = ["X", "Z", "S"])]
    fullmagdims: Vec<f64>,
    #[arg(long, num_args = 3, value_names = ["X", "Z", "S"])]
    hemagdims: Vec<f64>,
    #[arg(long, num_args = 3, value_names = ["X", "Z", "S"])]
    vemagdims: Vec<f64>,
    #[arg(long, num_args = 3, value_names = ["X", "Z", "S"])]
    htmagdims: Vec<f64>,
    #[arg(long, num_args = 3, value_names = ["X", "Z", "S"])]
    poledims: Vec<f64>,

    #[arg(long)]
    interstice: f64,
    #[arg(long)]
    gap: f64,
    #[arg(long, default_value_t = 0.0)]
    endgapsym: f64,
    #[arg(long, default_value_t = 0.0)]
    terminalgapsymhyb: f64,
    #[arg(long, default_value_t = 0.0)]
    phasinggap: f64,
    #[arg(long, default_value_t = 0.0)]
    clampcut: f64,

    #[arg(long, num_args = 3, value_names = ["MIN", "MAX", "STEP"])]
    x: Vec<f64>,
    #[arg(long, num_args = 3, value_names = ["MIN", "MAX", "STEP"])]
    z: Vec<f64>,
    #[arg(long, default_value_t = 10.0)]
    steps: f64,

    /// Where to write the generated descriptor JSON.
    #[arg(long)]
    output: PathBuf,
}

fn triple(v: &[f64], label: &str) -> Result<[f64; 3]> {
    if v.len() != 3 {
        bail!("--{} expects exactly three values", label);
    }
    Ok([v[0], v[1], v[2]])
}

fn range(v: &[f64], label: &str) -> Result<SampleRange> {
    if v.len() != 3 {
        bail!("--{} expects exactly MIN MAX STEP", label);
    }
    Ok(SampleRange { min: v[0], max: v[1], step: v[2] })
}

pub fn run(args: LayoutArgs) -> Result<()> {
    let device_type = DeviceType::parse(&args.device_type)?;

    let params = LayoutParams {
        name: args.name.clone(),
        device_type,
        nperiods: args.nperiods,
        fullmagdims: triple(&args.fullmagdims, "fullmagdims")?,
        hemagdims: triple(&args.hemagdims, "hemagdims")?,
        vemagdims: triple(&args.vemagdims, "vemagdims")?,
        htmagdims: triple(&args.htmagdims, "htmagdims")?,
        poledims: triple(&args.poledims, "poledims")?,
        interstice: args.interstice,
        gap: args.gap,
        endgapsym: args.endgapsym,
        terminalgapsymhyb: args.terminalgapsymhyb,
        phasinggap: args.phasinggap,
        clampcut: args.clampcut,
        x: range(&args.x, "x")?,
        z: range(&args.z, "z")?,
        steps: args.steps,
    };

    let info = generate_layout(&params).chain_err(|| "failed to generate layout")?;

    descriptor::write(&args.output, &params, &info).chain_err(|| "failed to write descriptor")?;

    info!(
        "wrote descriptor for '{}' ({} beams, {} slots each) to {}",
        info.name,
        info.beams.len(),
        info.beams.first().map(|b| b.len()).unwrap_or(0),
        args.output.display()
    );

    Ok(())
}
