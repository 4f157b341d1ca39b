//! A self-describing, bincode-encoded store for the per-beam lookup
//! tensors (§3, §6). Stands in for the original's HDF5 lookup tensor file
//! — no HDF5 binding exists anywhere in the example corpus, so this
//! crate's own codec carries the same job: each beam's `(nx, nz, ns, 3, 3,
//! n_slots)` transfer tensor, keyed by beam name, read once up front by
//! `idsort optimize` and threaded through every genome evaluation.

use crate::errors::*;
use crate::field::lookup::LookupTensor;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub fn write(path: &Path, beams: &[(String, LookupTensor)]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    bincode::serialize_into(BufWriter::new(file), beams)?;
    Ok(())
}

pub fn read(path: &Path) -> Result<Vec<(String, LookupTensor)>> {
    let file = std::fs::File::open(path)?;
    let beams: Vec<(String, LookupTensor)> = bincode::deserialize_from(BufReader::new(file))?;
    Ok(beams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array6;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_bincode() {
        let tensor = LookupTensor::new(Array6::from_elem((1, 1, 2, 3, 3, 2), 0.5));
        let beams = vec![("top".to_string(), tensor)];
        let dir = tempdir().unwrap();
        let path = dir.path().join("lookup.bin");
        write(&path, &beams).unwrap();
        let loaded = read(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "top");
        assert_eq!(loaded[0].1.grid_dims(), (1, 1, 2));
        assert_eq!(loaded[0].1.n_slots(), 2);
    }

    #[test]
    fn missing_file_is_a_clean_error() {
        assert!(read(Path::new("/nonexistent/lookup.bin")).is_err());
    }
}
