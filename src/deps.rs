//! Re-exports of third party crates whose types are present in `mediancut`'s public API.

pub use palette;
