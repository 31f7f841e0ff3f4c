// Library crate root.
//
// This crate is used both as a binary (src/main.rs) and as a library.
// Keeping modules here prevents "dead_code" warnings for public APIs that are
// intentionally exported for downstream crates.

pub mod category;
pub mod editor;
pub mod error;
pub mod hierarchy;
pub mod im;
pub mod raster;
pub mod vol;

#[cfg(test)]
pub mod test_helpers;
