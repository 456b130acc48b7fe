//! A library for extracting representative color palettes from pixel data
//! using median-cut quantization.
//!
//! The algorithm recursively partitions RGB space into axis-aligned boxes
//! ([`VBox`]es) such that each box holds roughly the same share of the total
//! pixel population, then reports one population-weighted average color per
//! box. Duplicate-heavy inputs are handled by deduplicating pixels into
//! frequency counts up front, so the cost of a split scales with the number
//! of distinct colors rather than the number of pixels.
//!
//! # Examples
//!
//! ```
//! use mediancut::{MedianCut, PaletteSize};
//! use mediancut::deps::palette::Srgb;
//!
//! let pixels = [
//!     Srgb::new(255u8, 0, 0),
//!     Srgb::new(250, 0, 0),
//!     Srgb::new(0, 0, 255),
//! ];
//!
//! let cutter = MedianCut::run_slice(&pixels)?;
//! let palette = cutter.palette(PaletteSize::try_from(2u16)?);
//! assert_eq!(palette.len(), 2);
//! # Ok::<(), Box<dyn core::error::Error>>(())
//! ```
//!
//! The building blocks are public as well: [`VBox`] exposes the bounding
//! box, split, and average primitives for callers that want to drive the
//! recursion with their own priority policy.

#![no_std]
#![deny(unsafe_code)]
#![warn(
    missing_docs,
    clippy::pedantic,
    clippy::cargo,
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::unreachable,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::use_debug
)]

extern crate alloc;

mod median_cut;
mod types;
mod vbox;

pub mod deps;

pub use median_cut::MedianCut;
pub use types::*;
pub use vbox::VBox;

/// The maximum total pixel population supported by a [`VBox`].
///
/// Construction rejects inputs whose population would exceed this bound,
/// which keeps every count in the crate representable as a `u32`.
pub const MAX_POPULATION: u32 = u32::MAX;

#[cfg(test)]
mod tests {
    use crate::Pixel;
    use alloc::vec::Vec;

    /// Deterministic pseudo-random pixels shared by the module tests.
    ///
    /// A fixed-seed LCG keeps runs reproducible without a dependency;
    /// the byte spread is wide enough to exercise all three axes.
    pub fn test_pixels(n: usize) -> Vec<Pixel> {
        let mut state = 0x243F_6A88_85A3_08D3_u64;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                let [r, g, b, ..] = state.to_be_bytes();
                Pixel::new(r, g, b)
            })
            .collect()
    }
}
