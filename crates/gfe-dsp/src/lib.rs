//! gfe-dsp: Filter design engine for the graphical equalizer
//!
//! Turns a hand-drawn frequency-response curve into something a host audio
//! graph can run, and measures what it realized.
//!
//! ## Modules
//! - `rfft` - split-radix real FFT with packed spectrum layout
//! - `axis` - visible frequency axis, equivalent and shelf zone tables
//! - `mapping` - resampling between FFT bins and visible bins
//! - `curve` - per-channel curves, Y/dB/magnitude conversions, edits
//! - `biquad` - cookbook peaking and low-shelf coefficients
//! - `fir` - linear-phase FIR kernel synthesis
//! - `iir` - peaking bank and low-shelf cascade
//! - `window` - analysis windows applied before measuring a kernel
//! - `response` - actual-response estimation for kernels and cascades
//! - `codec` - compact base64 curve encoding
//! - `editor` - the engine facade

pub mod axis;
pub mod biquad;
pub mod codec;
pub mod curve;
pub mod editor;
pub mod fir;
pub mod iir;
pub mod mapping;
pub mod response;
pub mod rfft;
pub mod window;

pub use codec::{decode_curve, encode_curve};
pub use curve::{Curve, FLAT_CURVE};
pub use editor::GraphicalFilterEditor;

/// Anything with a magnitude response
pub trait FrequencyResponse {
    /// |H| at `freq` Hz for a system running at `sample_rate`
    fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64;
}
