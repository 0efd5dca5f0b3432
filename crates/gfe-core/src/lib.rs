//! gfe-core: Shared types for the graphical filter editor
//!
//! Constants of the visible curve space, channel addressing, engine
//! configuration and the error type used by every crate in the workspace.

mod channel;
mod config;
mod error;

pub use channel::*;
pub use config::*;
pub use error::*;

/// Number of points on the editable curve (and on the visible frequency axis)
pub const VISIBLE_BIN_COUNT: usize = 500;

/// Number of equivalent zones (octave bands from 31 Hz to 16 kHz)
pub const EQUIVALENT_ZONE_COUNT: usize = 10;

/// Number of shelf zones used by the low-shelf cascade
pub const SHELF_ZONE_COUNT: usize = 7;

/// Vertical extent of the curve space: Y in `0..VALID_Y_RANGE_HEIGHT`
pub const VALID_Y_RANGE_HEIGHT: i32 = 321;

/// Y of +40 dB
pub const MAXIMUM_CHANNEL_VALUE_Y: i32 = 0;

/// Y of 0 dB
pub const ZERO_CHANNEL_VALUE_Y: i32 = 160;

/// Y of -40 dB
pub const MINIMUM_CHANNEL_VALUE_Y: i32 = VALID_Y_RANGE_HEIGHT - 1;

/// Y standing for -inf dB (one past the bottom of the curve space)
pub const MINUS_INFINITY_Y: i32 = VALID_Y_RANGE_HEIGHT;

/// Largest gain a curve point can express, in dB
pub const MAXIMUM_DB: f64 = 40.0;

/// Smallest finite gain a curve point can express, in dB
pub const MINIMUM_DB: f64 = -40.0;

pub const MIN_FILTER_LENGTH: usize = 8;
pub const MAX_FILTER_LENGTH: usize = 8192;
pub const DEFAULT_FILTER_LENGTH: usize = 2048;
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Gain in decibels
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, serde::Serialize, serde::Deserialize)]
pub struct Decibels(pub f64);

impl Decibels {
    #[inline]
    pub fn to_gain(self) -> f64 {
        10.0_f64.powf(self.0 / 20.0)
    }

    #[inline]
    pub fn from_gain(gain: f64) -> Self {
        if gain <= 0.0 {
            Self(f64::NEG_INFINITY)
        } else {
            Self(20.0 * gain.log10())
        }
    }
}
