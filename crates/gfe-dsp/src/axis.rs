//! Visible frequency axis and zone tables
//!
//! The editable curve has one point per visible bin. Bins are spread over
//! ten segments with their own linear step, so that every octave band from
//! 31 Hz to 16 kHz gets a useful number of points. The same segments form
//! the equivalent zones; a coarser grouping of them forms the shelf zones.

use std::ops::Range;

use gfe_core::{EQUIVALENT_ZONE_COUNT, SHELF_ZONE_COUNT, VISIBLE_BIN_COUNT};

use crate::mapping::FrequencyAxis;

// ============================================================================
// Zone tables
// ============================================================================

/// First frequency of each equivalent-zone segment (Hz)
const SEGMENT_FIRST_FREQUENCIES: [u32; EQUIVALENT_ZONE_COUNT] =
    [5, 50, 95, 185, 360, 720, 1420, 2860, 5740, 11498];

/// Frequency step inside each segment (Hz)
const SEGMENT_STEPS: [u32; EQUIVALENT_ZONE_COUNT] = [5, 5, 5, 5, 10, 10, 20, 40, 80, 89];

const EQUIVALENT_ZONE_CENTERS: [u32; EQUIVALENT_ZONE_COUNT] =
    [31, 62, 125, 250, 500, 1000, 2000, 4000, 8000, 16000];

const EQUIVALENT_ZONE_BOUNDS: [usize; EQUIVALENT_ZONE_COUNT + 1] =
    [0, 9, 18, 36, 71, 107, 177, 249, 321, 393, VISIBLE_BIN_COUNT];

const SHELF_ZONE_CENTERS: [u32; SHELF_ZONE_COUNT] = [62, 250, 500, 1000, 2000, 4000, 8000];

const SHELF_ZONE_BOUNDS: [usize; SHELF_ZONE_COUNT + 1] =
    [0, 36, 71, 107, 177, 249, 321, VISIBLE_BIN_COUNT];

/// Contiguous partition of the visible bins into zones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneTable {
    centers: &'static [u32],
    bounds: &'static [usize],
}

/// Ten octave-wide zones, one per peaking band
pub const EQUIVALENT_ZONES: ZoneTable = ZoneTable {
    centers: &EQUIVALENT_ZONE_CENTERS,
    bounds: &EQUIVALENT_ZONE_BOUNDS,
};

/// Seven zones, one per low-shelf stage
pub const SHELF_ZONES: ZoneTable = ZoneTable {
    centers: &SHELF_ZONE_CENTERS,
    bounds: &SHELF_ZONE_BOUNDS,
};

impl ZoneTable {
    #[inline]
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Representative frequency of `zone` (Hz)
    #[inline]
    pub fn center(&self, zone: usize) -> u32 {
        self.centers[zone]
    }

    pub fn centers(&self) -> &'static [u32] {
        self.centers
    }

    /// Visible bins covered by `zone`
    #[inline]
    pub fn range(&self, zone: usize) -> Range<usize> {
        self.bounds[zone]..self.bounds[zone + 1]
    }

    /// Zone containing `bin`; bins past the end belong to the last zone
    pub fn zone_of(&self, bin: usize) -> usize {
        let last = self.len() - 1;
        if bin >= VISIBLE_BIN_COUNT - 1 {
            return last;
        }
        (0..=last)
            .rev()
            .find(|&zone| bin >= self.bounds[zone])
            .unwrap_or(0)
    }
}

// ============================================================================
// Visible axis
// ============================================================================

/// The 500 frequencies under the editable curve
#[derive(Debug, Clone)]
pub struct VisibleAxis {
    frequencies: [u32; VISIBLE_BIN_COUNT],
}

impl Default for VisibleAxis {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibleAxis {
    pub fn new() -> Self {
        let mut frequencies = [0u32; VISIBLE_BIN_COUNT];
        for segment in 0..EQUIVALENT_ZONE_COUNT {
            let first = SEGMENT_FIRST_FREQUENCIES[segment];
            let step = SEGMENT_STEPS[segment];
            for (k, bin) in EQUIVALENT_ZONES.range(segment).enumerate() {
                frequencies[bin] = first + k as u32 * step;
            }
        }
        Self { frequencies }
    }

    #[inline]
    pub fn frequencies(&self) -> &[u32; VISIBLE_BIN_COUNT] {
        &self.frequencies
    }

    /// Frequency under `bin` (clamped to the axis)
    #[inline]
    pub fn visible_bin_to_frequency(&self, bin: usize) -> u32 {
        self.frequencies[bin.min(VISIBLE_BIN_COUNT - 1)]
    }

    /// Frequency under `bin` together with the center of its equivalent zone
    pub fn visible_bin_to_frequency_group(&self, bin: usize) -> (u32, u32) {
        let bin = bin.min(VISIBLE_BIN_COUNT - 1);
        let zone = EQUIVALENT_ZONES.zone_of(bin);
        (self.frequencies[bin], EQUIVALENT_ZONES.center(zone))
    }

    #[inline]
    pub fn visible_bin_to_zone_index(&self, bin: usize) -> usize {
        EQUIVALENT_ZONES.zone_of(bin)
    }

    #[inline]
    pub fn visible_bin_to_shelf_zone_index(&self, bin: usize) -> usize {
        SHELF_ZONES.zone_of(bin)
    }

    pub fn zones(&self) -> &ZoneTable {
        &EQUIVALENT_ZONES
    }

    pub fn shelf_zones(&self) -> &ZoneTable {
        &SHELF_ZONES
    }
}

impl FrequencyAxis for VisibleAxis {
    #[inline]
    fn len(&self) -> usize {
        VISIBLE_BIN_COUNT
    }

    #[inline]
    fn frequency(&self, index: usize) -> f64 {
        self.frequencies[index] as f64
    }
}
