use crate::{Axis, Pixel};
use core::{error::Error, fmt};

/// The error returned when the length of a pixel input is not in the supported range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthOutOfRange {
    /// The length of the provided input.
    len: usize,
    /// The minimum supported length.
    min: u32,
    /// The maximum supported length.
    max: u32,
}

impl LengthOutOfRange {
    /// Check that `slice` has a length in `min..=max`, returning the length as a `u32`.
    #[inline]
    pub(crate) const fn check_u32<T>(slice: &[T], min: u32, max: u32) -> Result<u32, Self> {
        let len = slice.len();
        #[allow(clippy::cast_possible_truncation)]
        if min as usize <= len && len <= max as usize {
            Ok(len as u32)
        } else {
            Err(Self { len, min, max })
        }
    }
}

impl fmt::Display for LengthOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { len, min, max } = *self;
        write!(
            f,
            "got a pixel input with length {len} which is not in the supported range of {min}..={max}",
        )
    }
}

impl Error for LengthOutOfRange {}

/// The reason a [`VBox`](crate::VBox) could not be built from a pixel-to-count map.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FromCountsError {
    /// The provided map had no entries.
    Empty,
    /// The sum of counts overflowed a `u32`.
    Overflow,
}

impl fmt::Display for FromCountsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => {
                write!(f, "cannot build a vbox from an empty pixel-to-count map")
            }
            Self::Overflow => write!(f, "the sum of pixel counts overflowed a u32"),
        }
    }
}

impl Error for FromCountsError {}

/// The reason explicit bounds and contents failed to form a [`VBox`](crate::VBox).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FromPartsError {
    /// The bounds are inverted (minimum above maximum) on the given axis.
    InvertedBounds(Axis),
    /// The given contents pixel lies outside the bounds.
    OutOfBounds(Pixel),
    /// The sum of counts overflowed a `u32`.
    Overflow,
}

impl fmt::Display for FromPartsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedBounds(axis) => {
                write!(f, "the {axis} bounds are inverted (minimum above maximum)")
            }
            Self::OutOfBounds(pixel) => {
                let [r, g, b] = pixel.into_array();
                write!(f, "pixel ({r}, {g}, {b}) lies outside the provided bounds")
            }
            Self::Overflow => write!(f, "the sum of pixel counts overflowed a u32"),
        }
    }
}

impl Error for FromPartsError {}
