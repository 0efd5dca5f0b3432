//! Linear-phase FIR synthesis
//!
//! The curve is resampled onto the FFT bins, every bin gets the phase of a
//! pure delay of `(N/2 - 1)/2` samples, and one inverse FFT yields the
//! kernel. The result is symmetric over its first half and is handed to
//! the host's convolver as-is.

use std::f64::consts::PI;

use gfe_core::{Channel, GfeResult, validate_filter_length, validate_sample_rate};

use crate::axis::VisibleAxis;
use crate::curve::{Curve, y_to_magnitude};
use crate::mapping::{UniformAxis, resample};
use crate::response::ResponseEstimator;
use crate::rfft::Rfft;

// ============ Synthesizer ============

/// Owns the RFFT engine and both channel kernels
#[derive(Debug, Clone)]
pub struct FirSynthesizer {
    rfft: Rfft,
    kernels: [Vec<f32>; 2],
    /// Kernel being designed, full precision
    work: Vec<f64>,
    /// Target magnitude per FFT bin
    target: Vec<f64>,
}

impl FirSynthesizer {
    pub fn new(filter_length: usize, sample_rate: u32) -> GfeResult<Self> {
        validate_filter_length(filter_length)?;
        Ok(Self {
            rfft: Rfft::new(filter_length, sample_rate)?,
            kernels: [vec![0.0; filter_length], vec![0.0; filter_length]],
            work: vec![0.0; filter_length],
            target: vec![0.0; filter_length / 2 + 1],
        })
    }

    #[inline]
    pub fn filter_length(&self) -> usize {
        self.rfft.size()
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.rfft.sample_rate()
    }

    /// Committed kernel of `channel`
    #[inline]
    pub fn kernel(&self, channel: Channel) -> &[f32] {
        &self.kernels[channel.index()]
    }

    /// Design the kernel of `channel` from `curve`
    ///
    /// In normalized mode the first design is measured through `estimator`
    /// and the whole spectrum is scaled so the measured peak lands on 0 dB.
    pub fn synthesize(
        &mut self,
        channel: Channel,
        curve: &Curve,
        axis: &VisibleAxis,
        normalized: bool,
        estimator: &mut ResponseEstimator,
    ) {
        let bins = UniformAxis::fft_bins(self.rfft.size(), self.rfft.sample_rate());
        let target = &mut self.target;
        resample(axis, |i| curve[i] as f64, &bins, |i, y| {
            target[i] = y_to_magnitude(y);
        });

        self.design(1.0);

        if normalized {
            let peak = estimator.measure_kernel(&mut self.rfft, &self.work);
            if peak > 0.0 {
                log::trace!("normalizing {channel:?} kernel, measured peak {peak:.4}");
                self.design(1.0 / peak);
            }
        }

        for (committed, &sample) in self.kernels[channel.index()].iter_mut().zip(&self.work) {
            *committed = sample as f32;
        }
    }

    /// Build `work` from `target` scaled by `gain`
    fn design(&mut self, gain: f64) {
        let n = self.rfft.size();
        let half = n / 2;
        let delay = (half - 1) as f64 / 2.0;
        let target = &self.target;
        let trans = self.rfft.trans_mut();

        trans[0] = (target[1] * gain).min(1.0);
        trans[half] = 0.0;
        for i in 1..half {
            let magnitude = target[i] * gain;
            let k = 2.0 * PI * delay * i as f64 / n as f64;
            trans[i] = magnitude * k.cos();
            trans[n - i] = -magnitude * k.sin();
        }

        self.rfft.inverse(&mut self.work);
    }

    /// Measure the committed kernel of `channel`; returns the spectrum peak
    pub fn measure(&mut self, channel: Channel, estimator: &mut ResponseEstimator) -> f64 {
        estimator.measure_kernel(&mut self.rfft, &self.kernels[channel.index()])
    }

    /// Overwrite the kernel of `destination` with the one of `source`
    pub fn copy_kernel(&mut self, source: Channel, destination: Channel) {
        if source == destination {
            return;
        }
        let [left, right] = &mut self.kernels;
        match source {
            Channel::Left => right.copy_from_slice(left),
            Channel::Right => left.copy_from_slice(right),
        }
    }

    /// Returns `true` when the length actually changed; kernels are zeroed
    pub fn change_filter_length(&mut self, filter_length: usize) -> GfeResult<bool> {
        validate_filter_length(filter_length)?;
        if filter_length == self.rfft.size() {
            return Ok(false);
        }
        self.rfft = Rfft::new(filter_length, self.rfft.sample_rate())?;
        for kernel in &mut self.kernels {
            kernel.clear();
            kernel.resize(filter_length, 0.0);
        }
        self.work.resize(filter_length, 0.0);
        self.target.resize(filter_length / 2 + 1, 0.0);
        Ok(true)
    }

    /// Returns `true` when the rate actually changed
    pub fn change_sample_rate(&mut self, sample_rate: u32) -> GfeResult<bool> {
        validate_sample_rate(sample_rate)?;
        if sample_rate == self.rfft.sample_rate() {
            return Ok(false);
        }
        self.rfft.change_sample_rate(sample_rate)?;
        Ok(true)
    }
}
