//! Engine configuration
//!
//! Everything the editor needs to know before it can synthesize a filter:
//! kernel length, sample rate, normalization, the IIR mode and the window
//! used when measuring the realized response.

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_FILTER_LENGTH, DEFAULT_SAMPLE_RATE, GfeError, GfeResult, MAX_FILTER_LENGTH,
    MIN_FILTER_LENGTH,
};

/// Which IIR approximation replaces the FIR kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IirType {
    /// Convolution with the synthesized FIR kernel
    #[default]
    None,
    /// Ten peaking biquads centered on the equivalent zones
    Peaking,
    /// Cascade of low-shelf biquads, one per shelf zone
    Shelf,
}

impl IirType {
    #[inline]
    pub fn is_iir(self) -> bool {
        self != IirType::None
    }
}

/// Window applied to the kernel before measuring its response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnalysisWindow {
    Rectangular,
    Hann,
    Hamming,
    #[default]
    Blackman,
}

/// Static engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// FIR kernel length in samples (power of two)
    pub filter_length: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Scale the kernel so the measured peak sits at 0 dB
    pub normalized: bool,
    pub iir_type: IirType,
    pub window: AnalysisWindow,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            filter_length: DEFAULT_FILTER_LENGTH,
            sample_rate: DEFAULT_SAMPLE_RATE,
            normalized: false,
            iir_type: IirType::None,
            window: AnalysisWindow::Blackman,
        }
    }
}

impl EngineConfig {
    pub fn new(filter_length: usize, sample_rate: u32) -> Self {
        Self {
            filter_length,
            sample_rate,
            ..Self::default()
        }
    }

    /// Check the preconditions every engine component relies on
    pub fn validate(&self) -> GfeResult<()> {
        validate_filter_length(self.filter_length)?;
        validate_sample_rate(self.sample_rate)
    }
}

pub fn validate_filter_length(filter_length: usize) -> GfeResult<()> {
    if filter_length.is_power_of_two()
        && (MIN_FILTER_LENGTH..=MAX_FILTER_LENGTH).contains(&filter_length)
    {
        Ok(())
    } else {
        log::debug!(
            "rejected filter length {filter_length}: need a power of two in {MIN_FILTER_LENGTH}..={MAX_FILTER_LENGTH}"
        );
        Err(GfeError::InvalidFilterLength(filter_length))
    }
}

pub fn validate_sample_rate(sample_rate: u32) -> GfeResult<()> {
    if sample_rate == 0 {
        log::debug!("rejected sample rate {sample_rate} Hz");
        Err(GfeError::InvalidSampleRate(sample_rate))
    } else {
        Ok(())
    }
}

/// What the host audio graph can do
///
/// The engine never assumes IIR filter nodes exist; hosts opt in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostCapabilities {
    pub iir_filters: bool,
}

impl HostCapabilities {
    /// A host offering every primitive the engine can drive
    pub fn full() -> Self {
        Self { iir_filters: true }
    }
}
