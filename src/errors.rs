//! Crate-wide error type.
//!
//! Every fallible path in this crate returns `Result<T>` from here rather
//! than bespoke error enums. Errors are meant to be `.chain_err(|| "...")`-
//! annotated at each boundary they cross, so an abort prints the full
//! causal chain (see `bin/idsort/main.rs`).

error_chain! {
    foreign_links {
        Json(serde_json::Error);
        Bincode(bincode::Error);
        Io(std::io::Error);
    }

    errors {
        UnsupportedDeviceType(t: String) {
            description("unsupported device type")
            display("unsupported device type: '{}'", t)
        }
        EmptyMagnetPool(t: String) {
            description("empty magnet pool")
            display("magnet catalogue has no magnets of type '{}'", t)
        }
        LayoutLengthMismatch(beam: String) {
            description("layout slot field length mismatch")
            display("beam '{}' has mismatched types/positions/directions/flips length", beam)
        }
        NoGenomesLoaded {
            description("restart requested but no genomes were loaded")
            display("cannot restart optimization: no existing genomes were found")
        }
        SingularLeastSquares {
            description("least-squares fit degenerate")
            display("central trajectory least-squares fit is degenerate (singular)")
        }
        LookupBeamMissing(beam: String) {
            description("lookup tensor missing for beam")
            display("no lookup tensor was supplied for beam '{}'", beam)
        }
        LookupShapeMismatch(detail: String) {
            description("lookup tensor shape mismatch")
            display("lookup tensor shape mismatch: {}", detail)
        }
    }
}
