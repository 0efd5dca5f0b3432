//! Curve store and Y-space conversions
//!
//! Curves live in screen space: `Y = 0` is +40 dB, `Y = 320` is -40 dB and
//! `Y = 321` stands for silence. The conversions here are the only place
//! that knows the mapping.

use gfe_core::{
    Channel, Decibels, MAXIMUM_CHANNEL_VALUE_Y, MAXIMUM_DB, MINIMUM_CHANNEL_VALUE_Y, MINIMUM_DB,
    MINUS_INFINITY_Y, VISIBLE_BIN_COUNT, ZERO_CHANNEL_VALUE_Y,
};

use crate::axis::{EQUIVALENT_ZONES, SHELF_ZONES, ZoneTable};

/// One Y value per visible bin
pub type Curve = [i32; VISIBLE_BIN_COUNT];

/// 0 dB everywhere
pub const FLAT_CURVE: Curve = [ZERO_CHANNEL_VALUE_Y; VISIBLE_BIN_COUNT];

/// Largest magnitude representable on the curve (+40 dB)
const MAXIMUM_MAGNITUDE: f64 = 100.0;

/// Below this a magnitude maps to -inf (slightly under 0.01 to absorb rounding)
const MINIMUM_MAGNITUDE: f64 = 0.009;

/// Quantization of the smooth-edit blend weight
const SMOOTH_WEIGHT_ONE: i32 = 512;

// ============================================================================
// Conversions
// ============================================================================

#[inline]
pub fn clamp_x(x: i32) -> usize {
    if x <= 0 {
        0
    } else {
        (x as usize).min(VISIBLE_BIN_COUNT - 1)
    }
}

#[inline]
pub fn clamp_y(y: i32) -> i32 {
    if y <= MAXIMUM_CHANNEL_VALUE_Y {
        MAXIMUM_CHANNEL_VALUE_Y
    } else if y > MINIMUM_CHANNEL_VALUE_Y {
        MINUS_INFINITY_Y
    } else {
        y
    }
}

pub fn y_to_db(y: impl Into<f64>) -> f64 {
    let y = y.into();
    if y <= MAXIMUM_CHANNEL_VALUE_Y as f64 {
        MAXIMUM_DB
    } else if y > MINIMUM_CHANNEL_VALUE_Y as f64 {
        f64::NEG_INFINITY
    } else {
        MAXIMUM_DB + (MINIMUM_DB - MAXIMUM_DB) * y / MINIMUM_CHANNEL_VALUE_Y as f64
    }
}

pub fn y_to_magnitude(y: impl Into<f64>) -> f64 {
    let y = y.into();
    if y <= MAXIMUM_CHANNEL_VALUE_Y as f64 {
        MAXIMUM_MAGNITUDE
    } else if y > MINIMUM_CHANNEL_VALUE_Y as f64 {
        0.0
    } else {
        Decibels(y_to_db(y)).to_gain()
    }
}

pub fn magnitude_to_y(magnitude: f64) -> i32 {
    if magnitude >= MAXIMUM_MAGNITUDE {
        MAXIMUM_CHANNEL_VALUE_Y
    } else if magnitude < MINIMUM_MAGNITUDE || magnitude.is_nan() {
        MINUS_INFINITY_Y
    } else {
        let zero = ZERO_CHANNEL_VALUE_Y as f64;
        let db = Decibels::from_gain(magnitude).0;
        round_half_up(zero - db * zero / MAXIMUM_DB - 0.4)
    }
}

/// Nearest Y for a gain in dB, clamped to the curve space
pub fn db_to_y(db: f64) -> i32 {
    if db == f64::NEG_INFINITY {
        return MINUS_INFINITY_Y;
    }
    let y = (MAXIMUM_DB - db) * MINIMUM_CHANNEL_VALUE_Y as f64 / (MAXIMUM_DB - MINIMUM_DB);
    clamp_y(round_half_up(y.clamp(-1.0, MINUS_INFINITY_Y as f64)))
}

#[inline]
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Hermite smoothstep of `x` between `edge0` and `edge1`
fn smooth_step(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

// ============================================================================
// Curve store
// ============================================================================

/// Target curves for both channels plus the measured response
#[derive(Debug, Clone)]
pub struct CurveStore {
    channels: [Curve; 2],
    actual: Curve,
    smooth_snapshot: Option<Box<Curve>>,
}

impl Default for CurveStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CurveStore {
    pub fn new() -> Self {
        Self {
            channels: [FLAT_CURVE; 2],
            actual: FLAT_CURVE,
            smooth_snapshot: None,
        }
    }

    #[inline]
    pub fn channel(&self, channel: Channel) -> &Curve {
        &self.channels[channel.index()]
    }

    /// Direct write access; values outside `0..=321` are tolerated by every consumer
    #[inline]
    pub fn channel_mut(&mut self, channel: Channel) -> &mut Curve {
        &mut self.channels[channel.index()]
    }

    #[inline]
    pub fn actual(&self) -> &Curve {
        &self.actual
    }

    #[inline]
    pub fn actual_mut(&mut self) -> &mut Curve {
        &mut self.actual
    }

    pub fn reset(&mut self, channel: Channel) {
        self.channels[channel.index()] = FLAT_CURVE;
    }

    /// Set every bin of the equivalent zone under `x`
    pub fn change_zone_y(&mut self, channel: Channel, x: i32, y: i32) {
        self.fill_zone(channel, &EQUIVALENT_ZONES, x, y);
    }

    /// Set every bin of the shelf zone under `x`
    pub fn change_shelf_zone_y(&mut self, channel: Channel, x: i32, y: i32) {
        self.fill_zone(channel, &SHELF_ZONES, x, y);
    }

    fn fill_zone(&mut self, channel: Channel, zones: &ZoneTable, x: i32, y: i32) {
        let zone = zones.zone_of(clamp_x(x));
        self.channels[channel.index()][zones.range(zone)].fill(clamp_y(y));
    }

    /// Set a single bin
    pub fn change_point_y(&mut self, channel: Channel, x: i32, y: i32) {
        self.channels[channel.index()][clamp_x(x)] = clamp_y(y);
    }

    /// Freehand stroke from `(x0, y0)` to `(x1, y1)`, both endpoints included
    pub fn change_line_y(&mut self, channel: Channel, x0: i32, y0: i32, x1: i32, y1: i32) {
        let (start, end) = (clamp_x(x0) as i64, clamp_x(x1) as i64);
        let curve = &mut self.channels[channel.index()];
        let span = (end - start).abs();
        if span == 0 {
            curve[end as usize] = clamp_y(y1);
            return;
        }
        let (y0, y1) = (clamp_y(y0), clamp_y(y1));
        let step = if end > start { 1 } else { -1 };
        let delta = (y1 - y0) as f64 / span as f64;
        for k in 0..=span {
            let x = (start + k * step) as usize;
            curve[x] = clamp_y(round_half_up(y0 as f64 + delta * k as f64));
        }
    }

    /// Remember the current curve of `channel` as the base of a smooth edit
    pub fn start_smooth_edition(&mut self, channel: Channel) {
        let curve = self.channels[channel.index()];
        **self.smooth_snapshot.get_or_insert_with(|| Box::new(FLAT_CURVE)) = curve;
    }

    /// Blend a smoothstep-shaped bump of `width` bins centered on `x`
    /// into the snapshot taken by [`start_smooth_edition`](Self::start_smooth_edition)
    ///
    /// Does nothing until a snapshot exists.
    pub fn change_smooth_y(&mut self, channel: Channel, x: i32, y: i32, width: i32) {
        let Some(snapshot) = self.smooth_snapshot.as_deref() else {
            log::trace!("change_smooth_y without snapshot ignored");
            return;
        };
        let count = VISIBLE_BIN_COUNT as i64;
        let target = clamp_y(y);
        let curve = &mut self.channels[channel.index()];
        *curve = *snapshot;

        // Widened so coordinates far off the axis cannot overflow
        let (x, half) = (i64::from(x), i64::from(width >> 1));
        let blend = |current: i32, edge: i64, i: i64| {
            let s = (SMOOTH_WEIGHT_ONE as f64 * smooth_step(edge as f64, x as f64, i as f64)) as i32;
            let mixed = (target * s + current * (SMOOTH_WEIGHT_ONE - s)) as f64
                / SMOOTH_WEIGHT_ONE as f64;
            clamp_y(round_half_up(mixed))
        };

        let start = x - half;
        for i in start.max(0)..x.min(count) {
            curve[i as usize] = blend(curve[i as usize], start, i);
        }
        let end = x + half;
        for i in x.max(0)..end.min(count) {
            curve[i as usize] = blend(curve[i as usize], end, i);
        }
    }
}
