//! External file formats: the ID descriptor JSON, the magnet catalogue
//! file, and the field lookup store.

pub mod catalogue_file;
pub mod descriptor;
pub mod lookup_store;
