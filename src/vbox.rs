//! The axis-aligned bounding box at the heart of median-cut quantization.

use crate::{
    Axis, FromCountsError, FromPartsError, LengthOutOfRange, MAX_POPULATION, Pixel, Swatch,
};
use alloc::collections::btree_map::{BTreeMap, Entry};
use alloc::vec;
use core::fmt;
use palette::Srgb;

/// An axis-aligned box in RGB space together with the weighted pixel
/// population it owns.
///
/// A `VBox` pairs two bounding corners with a map from each distinct color
/// inside the box to its occurrence count. Two invariants hold for every
/// `VBox` the crate ever produces:
///
/// - `min[axis] <= max[axis]` componentwise for all three axes, and
/// - every pixel in the contents lies within the bounds, inclusive.
///
/// Construction computes tight bounds from the input population (or
/// validates externally supplied ones), and [`split`](VBox::split) consumes
/// the parent to produce two children whose contents partition the parent's
/// exactly. The bounds of split children are inherited rather than
/// recomputed, so they may be looser than the tightest box around their
/// contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VBox {
    /// The componentwise minimum corner.
    min: Pixel,
    /// The componentwise maximum corner.
    max: Pixel,
    /// Each distinct color inside the box and its occurrence count.
    contents: BTreeMap<Pixel, u32>,
}

impl VBox {
    /// Create a [`VBox`] from bounds and contents known to satisfy the invariants.
    pub(crate) fn with_bounds(min: Pixel, max: Pixel, contents: BTreeMap<Pixel, u32>) -> Self {
        debug_assert!(
            Axis::ALL
                .into_iter()
                .all(|axis| min.channel(axis) <= max.channel(axis))
        );
        debug_assert!(contents.keys().all(|pixel| {
            Axis::ALL.into_iter().all(|axis| {
                min.channel(axis) <= pixel.channel(axis)
                    && pixel.channel(axis) <= max.channel(axis)
            })
        }));
        Self { min, max, contents }
    }

    /// Create a [`VBox`] from explicit bounds and a pixel-to-count map.
    ///
    /// The contents may be looser than the bounds require (including empty),
    /// but every pixel must lie within them.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds are inverted on any axis, if a
    /// contents pixel lies outside the bounds, or if the total population
    /// exceeds [`MAX_POPULATION`].
    pub fn from_parts(
        min: Pixel,
        max: Pixel,
        contents: BTreeMap<Pixel, u32>,
    ) -> Result<Self, FromPartsError> {
        for axis in Axis::ALL {
            if min.channel(axis) > max.channel(axis) {
                return Err(FromPartsError::InvertedBounds(axis));
            }
        }
        for &pixel in contents.keys() {
            let outside = Axis::ALL.into_iter().any(|axis| {
                pixel.channel(axis) < min.channel(axis) || pixel.channel(axis) > max.channel(axis)
            });
            if outside {
                return Err(FromPartsError::OutOfBounds(pixel));
            }
        }
        checked_population(&contents).ok_or(FromPartsError::Overflow)?;
        Ok(Self::with_bounds(min, max, contents))
    }

    /// Create a [`VBox`] from a pixel-to-count map, computing tight bounds
    /// as the componentwise extrema over all keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the map is empty or if the sum of counts exceeds
    /// [`MAX_POPULATION`].
    pub fn from_counts(contents: BTreeMap<Pixel, u32>) -> Result<Self, FromCountsError> {
        let mut keys = contents.keys();
        let Some(&first) = keys.next() else {
            return Err(FromCountsError::Empty);
        };
        let (mut min, mut max) = (first, first);
        for &pixel in keys {
            for axis in Axis::ALL {
                if pixel.channel(axis) < min.channel(axis) {
                    min = min.with(axis, pixel.channel(axis));
                }
                if pixel.channel(axis) > max.channel(axis) {
                    max = max.with(axis, pixel.channel(axis));
                }
            }
        }
        checked_population(&contents).ok_or(FromCountsError::Overflow)?;
        Ok(Self::with_bounds(min, max, contents))
    }

    /// Create a [`VBox`] from a raw pixel list, deduplicating repeats into
    /// counts while computing tight bounds.
    ///
    /// A pixel that was already seen only has its count incremented; the
    /// bounds update is skipped since the first occurrence established it.
    ///
    /// # Errors
    ///
    /// Returns an error if `pixels` is empty or longer than [`MAX_POPULATION`].
    pub fn from_pixels(pixels: &[Pixel]) -> Result<Self, LengthOutOfRange> {
        LengthOutOfRange::check_u32(pixels, 1, MAX_POPULATION)?;
        #[allow(clippy::expect_used)]
        let (&first, rest) = pixels
            .split_first()
            .expect("length checked to be at least one");
        Ok(Self::scan(first, rest.iter().copied()))
    }

    /// Create a [`VBox`] from a slice of [`Srgb`] colors.
    ///
    /// Identical to [`from_pixels`](VBox::from_pixels) over the `palette`
    /// color type.
    ///
    /// # Errors
    ///
    /// Returns an error if `pixels` is empty or longer than [`MAX_POPULATION`].
    pub fn from_srgb(pixels: &[Srgb<u8>]) -> Result<Self, LengthOutOfRange> {
        LengthOutOfRange::check_u32(pixels, 1, MAX_POPULATION)?;
        #[allow(clippy::expect_used)]
        let (&first, rest) = pixels
            .split_first()
            .expect("length checked to be at least one");
        Ok(Self::scan(
            Pixel::from(first),
            rest.iter().copied().map(Pixel::from),
        ))
    }

    /// The deduplicating construction scan behind the pixel-list constructors.
    fn scan(first: Pixel, rest: impl Iterator<Item = Pixel>) -> Self {
        let mut contents = BTreeMap::new();
        contents.insert(first, 1u32);
        let (mut min, mut max) = (first, first);
        for pixel in rest {
            match contents.entry(pixel) {
                Entry::Occupied(mut entry) => *entry.get_mut() += 1,
                Entry::Vacant(entry) => {
                    entry.insert(1);
                    for axis in Axis::ALL {
                        if pixel.channel(axis) < min.channel(axis) {
                            min = min.with(axis, pixel.channel(axis));
                        }
                        if pixel.channel(axis) > max.channel(axis) {
                            max = max.with(axis, pixel.channel(axis));
                        }
                    }
                }
            }
        }
        Self::with_bounds(min, max, contents)
    }

    /// The componentwise minimum corner.
    #[inline]
    #[must_use]
    pub const fn min_pixel(&self) -> Pixel {
        self.min
    }

    /// The componentwise maximum corner.
    #[inline]
    #[must_use]
    pub const fn max_pixel(&self) -> Pixel {
        self.max
    }

    /// Each distinct color inside the box and its occurrence count.
    #[inline]
    #[must_use]
    pub const fn contents(&self) -> &BTreeMap<Pixel, u32> {
        &self.contents
    }

    /// Returns the contents as [`Swatch`]es, in pixel order.
    pub fn swatches(&self) -> impl Iterator<Item = Swatch> + '_ {
        self.contents
            .iter()
            .map(|(&pixel, &count)| Swatch::new(pixel, count))
    }

    /// The number of distinct colors inside the box.
    #[inline]
    #[must_use]
    pub fn distinct_colors(&self) -> usize {
        self.contents.len()
    }

    /// The total weighted population of the box.
    #[inline]
    #[must_use]
    pub fn population(&self) -> u32 {
        self.contents.values().sum()
    }

    /// Lowest sub-value of the bounds in the given axis.
    #[inline]
    #[must_use]
    pub const fn lower(&self, axis: Axis) -> u8 {
        self.min.channel(axis)
    }

    /// Highest sub-value of the bounds in the given axis.
    #[inline]
    #[must_use]
    pub const fn upper(&self, axis: Axis) -> u8 {
        self.max.channel(axis)
    }

    /// The distance between the bounds along the given axis.
    #[inline]
    #[must_use]
    pub const fn length(&self, axis: Axis) -> u8 {
        self.upper(axis) - self.lower(axis)
    }

    /// The number of integer sub-values the box spans along the given axis.
    #[inline]
    #[must_use]
    pub const fn extent(&self, axis: Axis) -> u16 {
        self.length(axis) as u16 + 1
    }

    /// The sub-value halfway between the bounds along the given axis.
    #[inline]
    #[must_use]
    pub const fn midpoint(&self, axis: Axis) -> u8 {
        self.lower(axis) + self.length(axis) / 2
    }

    /// The volume of RGB space the box occupies, the product of its extents.
    ///
    /// Volume measures splittability, not population.
    #[inline]
    #[must_use]
    pub const fn volume(&self) -> u32 {
        self.extent(Axis::Red) as u32
            * self.extent(Axis::Green) as u32
            * self.extent(Axis::Blue) as u32
    }

    /// Whether the box has room to actually split.
    ///
    /// A single-point box (volume 1) cannot be divided further.
    #[inline]
    #[must_use]
    pub const fn can_split(&self) -> bool {
        self.volume() >= 2
    }

    /// Whether some color in the contents is exactly `pixel`, count ignored.
    #[inline]
    #[must_use]
    pub fn contains(&self, pixel: Pixel) -> bool {
        self.contents.contains_key(&pixel)
    }

    /// Whether a sub-value lies within or on the bounds of the given axis.
    #[inline]
    #[must_use]
    pub const fn covers_value(&self, axis: Axis, value: u8) -> bool {
        self.lower(axis) <= value && value <= self.upper(axis)
    }

    /// Whether a pixel lies within or on the bounds of the box.
    #[must_use]
    pub const fn covers(&self, pixel: Pixel) -> bool {
        self.covers_value(Axis::Red, pixel.red())
            && self.covers_value(Axis::Green, pixel.green())
            && self.covers_value(Axis::Blue, pixel.blue())
    }

    /// Whether a sub-value lies strictly within the bounds of the given axis.
    #[inline]
    #[must_use]
    pub const fn covers_value_within_boundary(&self, axis: Axis, value: u8) -> bool {
        self.lower(axis) < value && value < self.upper(axis)
    }

    /// Whether a pixel lies strictly within the bounds of the box.
    #[must_use]
    pub const fn covers_within_boundary(&self, pixel: Pixel) -> bool {
        self.covers_value_within_boundary(Axis::Red, pixel.red())
            && self.covers_value_within_boundary(Axis::Green, pixel.green())
            && self.covers_value_within_boundary(Axis::Blue, pixel.blue())
    }

    /// The axis with the greatest length.
    ///
    /// Ties resolve to the earliest axis in enumeration order, since a later
    /// axis replaces the running maximum only by strictly exceeding it.
    fn longest_dimension(&self) -> Axis {
        let mut longest = Axis::Red;
        for axis in [Axis::Green, Axis::Blue] {
            if self.length(longest) < self.length(axis) {
                longest = axis;
            }
        }
        longest
    }

    /// The population median along the given axis: the smallest sub-value
    /// such that at least half the weighted population lies below the cut.
    ///
    /// Builds a per-offset population histogram over `0..=length(axis)`,
    /// prefix-sums it, and scans for the first adjacent pair bracketing half
    /// the total. When the first slice alone holds at least half the mass,
    /// the cut is forced one past the lower bound so the split still
    /// separates that slice off.
    ///
    /// Only meaningful on an axis with nonzero length; the caller picks the
    /// longest dimension of a splittable box.
    fn median(&self, axis: Axis) -> u8 {
        let lower = self.lower(axis);
        let len = usize::from(self.length(axis));

        let mut slices = vec![0u32; len + 1];
        for (pixel, &count) in &self.contents {
            slices[usize::from(pixel.channel(axis) - lower)] += count;
        }

        let mut running = 0u32;
        for slice in &mut slices {
            running += *slice;
            *slice = running;
        }
        let half_total = running / 2;

        // most of the mass may sit in the very first slice
        if slices[0] >= half_total {
            return lower + 1;
        }

        for index in 0..len {
            if slices[index] <= half_total && half_total <= slices[index + 1] {
                #[allow(clippy::cast_possible_truncation)]
                return lower + index as u8 + 1;
            }
        }

        // a non-empty box always has an adjacent pair bracketing half_total
        #[allow(clippy::unreachable)]
        {
            unreachable!("no median cut point along the {axis} axis")
        }
    }

    /// Split the box into two children of roughly equal population.
    ///
    /// The cut runs along the longest dimension at the population median.
    /// Every entry of the parent's contents moves into exactly one child:
    /// colors below the cut point on the split axis go to the first child,
    /// the rest to the second. Both children's bounds meet at the cut point
    /// on the split axis (the first child's maximum and the second child's
    /// minimum are both set to it), so the boxes overlap geometrically in
    /// that single plane while their contents stay disjoint.
    ///
    /// Callers must only split a box for which [`can_split`](VBox::can_split)
    /// is `true`; splitting a single-point box is a contract violation.
    #[must_use]
    pub fn split(self) -> (VBox, VBox) {
        debug_assert!(self.can_split());
        let axis = self.longest_dimension();
        let split_point = self.median(axis);

        let Self { min, max, contents } = self;
        let mut smaller = BTreeMap::new();
        let mut larger = BTreeMap::new();
        for (pixel, count) in contents {
            if pixel.channel(axis) < split_point {
                smaller.insert(pixel, count);
            } else {
                larger.insert(pixel, count);
            }
        }

        (
            Self::with_bounds(min, max.with(axis, split_point), smaller),
            Self::with_bounds(min.with(axis, split_point), max, larger),
        )
    }

    /// The population-weighted average color of the box.
    ///
    /// Each channel is the count-weighted mean of the contents, rounded to
    /// the nearest sub-value with ties away from zero. A box with no
    /// population reports pure black with a zero count rather than failing.
    #[must_use]
    pub fn average(&self) -> Swatch {
        let mut population = 0u64;
        let mut sums = [0u64; 3];
        for (pixel, &count) in &self.contents {
            let count = u64::from(count);
            population += count;
            let [r, g, b] = pixel.into_array();
            sums[0] += u64::from(r) * count;
            sums[1] += u64::from(g) * count;
            sums[2] += u64::from(b) * count;
        }

        if population == 0 {
            return Swatch::new(Pixel::new(0, 0, 0), 0);
        }

        let channels = sums.map(|sum| rounded_mean(sum, population));
        #[allow(clippy::cast_possible_truncation)] // population is bounded by MAX_POPULATION
        Swatch::new(Pixel::from(channels), population as u32)
    }
}

impl fmt::Display for VBox {
    /// Bounds summary in the form `(r0-r1, g0-g1, b0-b1)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}-{}, {}-{}, {}-{})",
            self.lower(Axis::Red),
            self.upper(Axis::Red),
            self.lower(Axis::Green),
            self.upper(Axis::Green),
            self.lower(Axis::Blue),
            self.upper(Axis::Blue),
        )
    }
}

/// The total population of a contents map, or `None` on `u32` overflow.
fn checked_population(contents: &BTreeMap<Pixel, u32>) -> Option<u32> {
    contents.values().try_fold(0u32, |acc, &count| acc.checked_add(count))
}

/// Round-to-nearest weighted mean of one channel, ties away from zero.
#[inline]
fn rounded_mean(sum: u64, total: u64) -> u8 {
    #[allow(clippy::cast_possible_truncation)] // a mean of u8 terms fits u8
    {
        ((2 * sum + total) / (2 * total)) as u8
    }
}
