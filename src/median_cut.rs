//! The priority loop that drives repeated [`VBox`] splits into a palette.

use crate::{FromCountsError, LengthOutOfRange, Palette, PaletteSize, Pixel, Swatch, VBox};
use alloc::collections::{BTreeMap, BinaryHeap};
use alloc::vec::Vec;
use core::cmp::{Ordering, Reverse};
use palette::Srgb;

/// Median-cut palette extraction over a pixel population.
///
/// Wraps the root [`VBox`] of the recursion. [`palette`](MedianCut::palette)
/// repeatedly takes the highest-priority box and replaces it with its two
/// split children until the requested number of boxes exists or nothing can
/// split further, then reports each terminal box's average color.
///
/// Box priority follows the modified median-cut scheme: the first three
/// quarters of the target are carved out by raw population, the remainder by
/// population weighted with volume, which trades a little population balance
/// for wider color coverage.
///
/// # Examples
///
/// ```
/// use mediancut::{MedianCut, PaletteSize};
/// use mediancut::deps::palette::Srgb;
///
/// let pixels = [
///     Srgb::new(10u8, 0, 0),
///     Srgb::new(10, 0, 0),
///     Srgb::new(0, 200, 0),
/// ];
/// let palette = MedianCut::run_slice(&pixels)?.palette(PaletteSize::MIN);
/// assert_eq!(palette.len(), 1);
/// assert_eq!(palette.total_count(), 3);
/// # Ok::<(), Box<dyn core::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct MedianCut {
    /// The box covering the full input population.
    root: VBox,
}

impl MedianCut {
    /// Create a [`MedianCut`] over an already constructed root box.
    #[inline]
    #[must_use]
    pub const fn new(root: VBox) -> Self {
        Self { root }
    }

    /// Create a [`MedianCut`] over a slice of [`Srgb`] colors.
    ///
    /// # Errors
    ///
    /// Returns an error if `pixels` is empty or longer than
    /// [`MAX_POPULATION`](crate::MAX_POPULATION).
    pub fn run_slice(pixels: &[Srgb<u8>]) -> Result<Self, LengthOutOfRange> {
        Ok(Self::new(VBox::from_srgb(pixels)?))
    }

    /// Create a [`MedianCut`] over a slice of [`Pixel`]s.
    ///
    /// # Errors
    ///
    /// Returns an error if `pixels` is empty or longer than
    /// [`MAX_POPULATION`](crate::MAX_POPULATION).
    pub fn run_pixels(pixels: &[Pixel]) -> Result<Self, LengthOutOfRange> {
        Ok(Self::new(VBox::from_pixels(pixels)?))
    }

    /// Create a [`MedianCut`] over an already deduplicated pixel-to-count map.
    ///
    /// # Errors
    ///
    /// Returns an error if the map is empty or its counts sum past
    /// [`MAX_POPULATION`](crate::MAX_POPULATION).
    pub fn run_counts(counts: BTreeMap<Pixel, u32>) -> Result<Self, FromCountsError> {
        Ok(Self::new(VBox::from_counts(counts)?))
    }

    /// Extract a palette of at most `k` colors.
    ///
    /// The result holds fewer than `k` swatches when the population has
    /// fewer distinct colors than requested. The sum of the swatch counts
    /// always equals the root box's population.
    #[must_use]
    pub fn palette(&self, k: PaletteSize) -> Palette {
        if self.root.population() == 0 {
            return Palette::default();
        }

        let first_target = (k.as_usize() * 3).div_ceil(4);
        let mut terminal = Vec::new();
        let mut queue = BinaryHeap::with_capacity(k.as_usize());
        queue.push(RankedBox::by_population(self.root.clone()));

        split_until(&mut queue, &mut terminal, first_target, RankedBox::by_population);

        // re-rank the survivors for the volume-weighted remainder
        let mut queue = queue
            .into_iter()
            .map(|ranked| RankedBox::by_spread(ranked.vbox))
            .collect::<BinaryHeap<_>>();
        split_until(&mut queue, &mut terminal, k.as_usize(), RankedBox::by_spread);

        let mut swatches = queue
            .into_iter()
            .map(|ranked| ranked.vbox)
            .chain(terminal)
            .map(|vbox| vbox.average())
            .collect::<Vec<_>>();
        swatches.sort_by_key(|swatch| (Reverse(swatch.count()), swatch.pixel()));
        let total_count = swatches.iter().map(Swatch::count).sum();
        Palette::new_unchecked(swatches, total_count)
    }
}

/// Pop, split, and push boxes until `target` boxes exist in total or the
/// queue runs dry.
///
/// Boxes that cannot split are retired to `terminal` (they still count
/// toward the target). Children with no population are dropped, and a child
/// that comes back with its parent's full bounds is retired instead of
/// re-queued, since re-splitting it could never separate anything.
fn split_until(
    queue: &mut BinaryHeap<RankedBox>,
    terminal: &mut Vec<VBox>,
    target: usize,
    rank: fn(VBox) -> RankedBox,
) {
    while queue.len() + terminal.len() < target {
        let Some(ranked) = queue.pop() else { break };
        let vbox = ranked.vbox;
        if !vbox.can_split() {
            terminal.push(vbox);
            continue;
        }

        let (parent_min, parent_max) = (vbox.min_pixel(), vbox.max_pixel());
        let (first, second) = vbox.split();
        for child in [first, second] {
            if child.population() == 0 {
                continue;
            }
            if child.min_pixel() == parent_min && child.max_pixel() == parent_max {
                terminal.push(child);
            } else {
                queue.push(rank(child));
            }
        }
    }
}

/// A box paired with its split priority, ordered for the max-heap.
struct RankedBox {
    /// The box.
    vbox: VBox,
    /// The priority the heap orders by.
    priority: u64,
}

impl RankedBox {
    /// Rank a box by its population alone.
    fn by_population(vbox: VBox) -> Self {
        let priority = u64::from(vbox.population());
        Self { vbox, priority }
    }

    /// Rank a box by its population weighted with its volume.
    fn by_spread(vbox: VBox) -> Self {
        let priority = u64::from(vbox.population()) * u64::from(vbox.volume());
        Self { vbox, priority }
    }
}

impl PartialOrd for RankedBox {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankedBox {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

impl Eq for RankedBox {}

impl PartialEq for RankedBox {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::test_pixels;
    use crate::Pixel;

    fn size(k: u16) -> PaletteSize {
        PaletteSize::try_from(k).unwrap()
    }

    #[test]
    fn reaches_requested_size() {
        let pixels = test_pixels(4096);
        let cutter = MedianCut::run_pixels(&pixels).unwrap();
        let palette = cutter.palette(size(16));

        assert_eq!(palette.len(), 16);
        assert_eq!(palette.total_count() as usize, pixels.len());
        // dominant color first
        let counts: Vec<_> = palette.swatches().iter().map(Swatch::count).collect();
        assert!(counts.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn single_color_yields_single_swatch() {
        let pixels = [Pixel::new(31, 41, 59); 50];
        let palette = MedianCut::run_pixels(&pixels).unwrap().palette(size(8));

        assert_eq!(palette.len(), 1);
        let dominant = palette.dominant().unwrap();
        assert_eq!(dominant.pixel(), Pixel::new(31, 41, 59));
        assert_eq!(dominant.count(), 50);
    }

    #[test]
    fn not_enough_colors() {
        let mut pixels = Vec::new();
        for color in [Pixel::new(0, 0, 0), Pixel::new(10, 0, 0), Pixel::new(20, 0, 0)] {
            pixels.extend([color; 4]);
        }
        let palette = MedianCut::run_pixels(&pixels).unwrap().palette(PaletteSize::MAX);

        assert_eq!(palette.len(), 3);
        assert_eq!(palette.total_count(), 12);
        assert!(palette.swatches().iter().all(|swatch| swatch.count() == 4));
    }

    #[test]
    fn separates_well_separated_clusters() {
        let mut pixels = Vec::new();
        pixels.extend([Pixel::new(250, 0, 0); 30]);
        pixels.extend([Pixel::new(0, 250, 0); 20]);
        let palette = MedianCut::run_pixels(&pixels).unwrap().palette(size(2));

        assert_eq!(palette.len(), 2);
        assert_eq!(palette.total_count(), 50);
        let dominant = palette.dominant().unwrap();
        assert_eq!(dominant.pixel(), Pixel::new(250, 0, 0));
        assert_eq!(dominant.count(), 30);
    }

    #[test]
    fn retires_box_the_cut_cannot_separate() {
        // loose bounds around a single color: the cut lands on the upper
        // bound, one child keeps everything, and the driver must not spin
        let mut counts = BTreeMap::new();
        counts.insert(Pixel::new(0, 0, 0), 4);
        let root = VBox::from_parts(Pixel::new(0, 0, 0), Pixel::new(1, 0, 0), counts).unwrap();

        let palette = MedianCut::new(root).palette(size(8));
        assert_eq!(palette.len(), 1);
        let dominant = palette.dominant().unwrap();
        assert_eq!(dominant.pixel(), Pixel::new(0, 0, 0));
        assert_eq!(dominant.count(), 4);
    }

    #[test]
    fn empty_population_yields_empty_palette() {
        let root = VBox::from_parts(
            Pixel::new(0, 0, 0),
            Pixel::new(255, 255, 255),
            BTreeMap::new(),
        )
        .unwrap();
        let palette = MedianCut::new(root).palette(size(4));
        assert!(palette.is_empty());
        assert_eq!(palette.total_count(), 0);
    }

    #[test]
    fn run_counts_matches_run_pixels() {
        let red = Pixel::new(200, 10, 10);
        let blue = Pixel::new(10, 10, 200);
        let pixels = [red, red, red, blue];

        let mut counts = BTreeMap::new();
        counts.insert(red, 3);
        counts.insert(blue, 1);

        let from_pixels = MedianCut::run_pixels(&pixels).unwrap().palette(size(2));
        let from_counts = MedianCut::run_counts(counts).unwrap().palette(size(2));

        assert_eq!(from_pixels.len(), from_counts.len());
        assert_eq!(from_pixels.total_count(), from_counts.total_count());
        for (a, b) in from_pixels.swatches().iter().zip(from_counts.swatches()) {
            assert_eq!(a.pixel(), b.pixel());
            assert_eq!(a.count(), b.count());
        }
    }

    #[test]
    fn population_is_conserved_at_every_size() {
        let pixels = test_pixels(777);
        let cutter = MedianCut::run_pixels(&pixels).unwrap();
        for k in [1u16, 2, 3, 5, 8, 16, 64, 256] {
            let palette = cutter.palette(size(k));
            assert!(palette.len() <= usize::from(k));
            assert_eq!(palette.total_count() as usize, pixels.len(), "k = {k}");
        }
    }
}
