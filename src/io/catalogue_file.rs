//! On-disk format for a magnet catalogue: the set of real, measured
//! magnets available to assign into a layout, plus each type's canonical
//! flip matrix.
//!
//! Grounded on `original_source/IDSort/src/field_generator.py`'s magnet
//! loading step, reshaped into a single JSON document rather than the
//! original's directory-of-files convention.

use crate::catalogue::{Magnet, MagnetCatalogue, MagnetType};
use crate::errors::*;
use crate::layout::matrices::Matrix3;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct CatalogueFile {
    magnets: Vec<Magnet>,
    /// `(type, flip matrix)` pairs rather than a map, since `serde_json`
    /// requires string map keys and `MagnetType` is an enum.
    flip_matrices: Vec<(MagnetType, Matrix3)>,
}

pub fn write(path: &Path, catalogue: &MagnetCatalogue) -> Result<()> {
    let mut magnets = Vec::new();
    let mut flip_matrices = Vec::new();
    for t in MagnetType::ALL {
        if let Some(pool) = catalogue.pool(t) {
            for key in pool.keys() {
                if let Some(m) = pool.get(key) {
                    magnets.push(m.clone());
                }
            }
            flip_matrices.push((t, catalogue.flip_matrix(t)));
        }
    }
    let file = CatalogueFile { magnets, flip_matrices };
    let mut handle = std::fs::File::create(path)?;
    handle.write_all(serde_json::to_string_pretty(&file)?.as_bytes())?;
    Ok(())
}

pub fn read(path: &Path) -> Result<MagnetCatalogue> {
    let mut handle = std::fs::File::open(path)?;
    let mut contents = String::new();
    handle.read_to_string(&mut contents)?;
    let file: CatalogueFile = serde_json::from_str(&contents)?;

    let mut catalogue = MagnetCatalogue::new();
    for magnet in file.magnets {
        catalogue.insert_magnet(magnet);
    }
    for (t, m) in file.flip_matrices {
        catalogue.set_flip_matrix(t, m);
    }
    catalogue.recompute_mean_fields();
    Ok(catalogue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_json() {
        let mut catalogue = MagnetCatalogue::new();
        catalogue.insert_magnet(Magnet {
            id: "HH-001".into(),
            field: [0.1, 1.2, -0.05],
            mtype: MagnetType::HH,
        });
        catalogue.set_flip_matrix(MagnetType::HH, Matrix3::ROTS_180);
        catalogue.recompute_mean_fields();

        let dir = tempdir().unwrap();
        let path = dir.path().join("catalogue.json");
        write(&path, &catalogue).unwrap();
        let loaded = read(&path).unwrap();

        assert_eq!(loaded.pool(MagnetType::HH).unwrap().len(), 1);
        assert_eq!(loaded.flip_matrix(MagnetType::HH), Matrix3::ROTS_180);
    }
}
