//! Actual-response estimation
//!
//! Measures what a synthesized filter really does, in curve space, so the
//! editor can draw it next to the target curve.

use gfe_core::{AnalysisWindow, MINUS_INFINITY_Y, VISIBLE_BIN_COUNT};

use crate::FrequencyResponse;
use crate::axis::VisibleAxis;
use crate::curve::{Curve, magnitude_to_y};
use crate::mapping::{FrequencyAxis, UniformAxis, resample};
use crate::rfft::Rfft;
use crate::window::WindowTable;

/// Scratch state for measuring kernels
#[derive(Debug, Clone)]
pub struct ResponseEstimator {
    window: WindowTable,
    windowed: Vec<f64>,
    magnitudes: Vec<f64>,
}

impl ResponseEstimator {
    pub fn new(window: AnalysisWindow) -> Self {
        Self {
            window: WindowTable::new(window, 0),
            windowed: Vec::new(),
            magnitudes: Vec::new(),
        }
    }

    #[inline]
    pub fn window(&self) -> AnalysisWindow {
        self.window.window()
    }

    pub fn set_window(&mut self, window: AnalysisWindow) {
        let length = self.window.len();
        self.window.prepare(window, length);
    }

    /// Magnitudes of bins `0..=N/2` from the last measurement
    #[inline]
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    /// Window samples `0..=N/2` of `kernel`, transform them and keep the
    /// magnitude spectrum; returns its peak
    pub fn measure_kernel<T>(&mut self, rfft: &mut Rfft, kernel: &[T]) -> f64
    where
        T: Copy + Into<f64>,
    {
        let n = rfft.size();
        // N/2 + 1 points, so the window is periodic in N/2
        let span = n / 2 + 1;
        self.window.prepare(self.window.window(), span);

        self.windowed.clear();
        self.windowed.extend(
            kernel[..span]
                .iter()
                .zip(self.window.coefficients())
                .map(|(&sample, &w)| Into::<f64>::into(sample) * w),
        );
        self.windowed.resize(n, 0.0);

        rfft.forward(&self.windowed);
        self.magnitudes.clear();
        self.magnitudes.extend_from_slice(rfft.calculate_spectrum());

        self.magnitudes.iter().copied().fold(0.0, f64::max)
    }

    /// Map the last measurement onto the visible axis
    ///
    /// Visible frequencies above Nyquist cannot be realized and read as silence.
    pub fn kernel_curve(&self, axis: &VisibleAxis, sample_rate: u32, out: &mut Curve) {
        if self.magnitudes.len() < 2 {
            out.fill(MINUS_INFINITY_Y);
            return;
        }
        let n = (self.magnitudes.len() - 1) * 2;
        let bins = UniformAxis::fft_bins(n, sample_rate);
        let nyquist = sample_rate as f64 / 2.0;

        resample(
            &bins,
            |i| self.magnitudes[i],
            axis,
            |i, magnitude| {
                out[i] = if axis.frequency(i) > nyquist {
                    MINUS_INFINITY_Y
                } else {
                    magnitude_to_y(magnitude)
                };
            },
        );
    }

    /// Evaluate a cascade at every visible frequency
    ///
    /// Stages report NaN where they cannot be evaluated; those bins repeat
    /// the last good magnitude.
    pub fn chain_curve<S: FrequencyResponse>(
        stages: &[S],
        axis: &VisibleAxis,
        sample_rate: u32,
        out: &mut Curve,
    ) {
        let sample_rate = sample_rate as f64;
        let mut last_good = 1.0;
        for i in 0..VISIBLE_BIN_COUNT {
            let freq = axis.frequency(i);
            let mut magnitude: f64 = stages
                .iter()
                .map(|stage| stage.magnitude_at(freq, sample_rate))
                .product();
            if magnitude.is_nan() {
                magnitude = last_good;
            } else {
                last_good = magnitude;
            }
            out[i] = magnitude_to_y(magnitude);
        }
    }
}

impl Default for ResponseEstimator {
    fn default() -> Self {
        Self::new(AnalysisWindow::default())
    }
}
