//! The ID descriptor file: a JSON document describing one device's
//! geometry and derived layout, readable by both the `layout` and
//! `optimize` subcommands. It embeds the `LayoutParams` that produced the
//! layout (so `optimize` can reconstruct the exact same `Info` without the
//! geometry flags being re-entered) alongside a human-readable rendering
//! of the generated slots.
//!
//! Grounded on `original_source/IDSort/src/id_setup.py`'s descriptor
//! output dict.

use crate::errors::*;
use crate::layout::{generate_layout, DeviceType, Info, LayoutParams};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDescriptor {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub position: [f64; 3],
    pub direction_matrix: [[f64; 3]; 3],
    pub flip_matrix: [[f64; 3]; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamDescriptor {
    pub name: String,
    pub slots: Vec<SlotDescriptor>,
}

/// The on-disk shape of a generated layout: the geometry parameters it was
/// built from, plus a rendering of the resulting beams for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Descriptor {
    pub params: LayoutParams,
    pub period_length: f64,
    pub beams: Vec<BeamDescriptor>,
}

impl Descriptor {
    pub fn from_info(params: &LayoutParams, info: &Info) -> Descriptor {
        Descriptor {
            params: params.clone(),
            period_length: info.period_length,
            beams: info
                .beams
                .iter()
                .map(|beam| BeamDescriptor {
                    name: beam.name.clone(),
                    slots: beam
                        .slots
                        .iter()
                        .map(|slot| SlotDescriptor {
                            type_tag: slot.type_tag.to_string(),
                            position: slot.position,
                            direction_matrix: slot.direction_matrix.0,
                            flip_matrix: slot.flip_matrix.0,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn device_type(&self) -> Result<DeviceType> {
        Ok(self.params.device_type)
    }

    /// Regenerates the full `layout::Info` (with typed matrices, not the
    /// descriptor's plain arrays) from the embedded geometry parameters.
    pub fn regenerate(&self) -> Result<Info> {
        generate_layout(&self.params)
    }
}

pub fn write(path: &Path, params: &LayoutParams, info: &Info) -> Result<()> {
    let descriptor = Descriptor::from_info(params, info);
    let mut file = std::fs::File::create(path)?;
    let json = serde_json::to_string_pretty(&descriptor)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

pub fn read(path: &Path) -> Result<Descriptor> {
    let mut file = std::fs::File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let descriptor: Descriptor = serde_json::from_str(&contents)?;
    Ok(descriptor)
}
