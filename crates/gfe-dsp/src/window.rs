//! Analysis windows for response measurement
//!
//! Windows are symmetric over their length. The estimator asks for
//! `N/2 + 1` points, which makes them periodic over the `N/2` kernel taps.

use std::f64::consts::PI;

use gfe_core::AnalysisWindow;

/// Coefficient `index` of a symmetric `window` spanning `length` samples
pub fn coefficient(window: AnalysisWindow, index: usize, length: usize) -> f64 {
    if length < 2 {
        return 1.0;
    }
    let phase = 2.0 * PI * index as f64 / (length - 1) as f64;
    match window {
        AnalysisWindow::Rectangular => 1.0,
        AnalysisWindow::Hann => 0.5 - 0.5 * phase.cos(),
        AnalysisWindow::Hamming => 0.54 - 0.46 * phase.cos(),
        AnalysisWindow::Blackman => 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos(),
    }
}

/// Precomputed window, rebuilt only when shape or length change
#[derive(Debug, Clone)]
pub struct WindowTable {
    window: AnalysisWindow,
    coefficients: Vec<f64>,
}

impl WindowTable {
    pub fn new(window: AnalysisWindow, length: usize) -> Self {
        Self {
            window,
            coefficients: (0..length).map(|i| coefficient(window, i, length)).collect(),
        }
    }

    #[inline]
    pub fn window(&self) -> AnalysisWindow {
        self.window
    }

    #[inline]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Make sure the table matches `window` and `length`
    pub fn prepare(&mut self, window: AnalysisWindow, length: usize) {
        if self.window != window || self.coefficients.len() != length {
            *self = Self::new(window, length);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_windows_are_symmetric() {
        for window in [
            AnalysisWindow::Rectangular,
            AnalysisWindow::Hann,
            AnalysisWindow::Hamming,
            AnalysisWindow::Blackman,
        ] {
            let table = WindowTable::new(window, 33);
            let c = table.coefficients();
            for i in 0..c.len() {
                assert_abs_diff_eq!(c[i], c[c.len() - 1 - i], epsilon = 1e-12);
            }
            assert_abs_diff_eq!(c[16], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_blackman_edges_vanish() {
        let table = WindowTable::new(AnalysisWindow::Blackman, 64);
        assert_abs_diff_eq!(table.coefficients()[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(table.coefficients()[63], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_prepare_rebuilds_on_change() {
        let mut table = WindowTable::new(AnalysisWindow::Hann, 16);
        table.prepare(AnalysisWindow::Hann, 32);
        assert_eq!(table.len(), 32);
        table.prepare(AnalysisWindow::Rectangular, 32);
        assert!(table.coefficients().iter().all(|&c| c == 1.0));
    }
}
