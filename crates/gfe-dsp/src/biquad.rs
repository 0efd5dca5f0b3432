//! Biquad coefficient design (Audio EQ Cookbook)
//!
//! Coefficients are kept un-normalized, `a0` included, because hosts take
//! them verbatim as feedforward `[b0, b1, b2]` and feedback `[a0, a1, a2]`
//! arrays.

use std::f64::consts::PI;

use crate::FrequencyResponse;

/// Biquad coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a0: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::identity()
    }
}

impl BiquadCoeffs {
    /// Pass-through
    pub fn identity() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a0: 1.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    /// Calculate peaking EQ filter coefficients
    /// gain_db: gain in decibels
    pub fn peaking(freq: f64, q: f64, gain_db: f64, sample_rate: f64) -> Self {
        let a = 10.0_f64.powf(gain_db / 40.0);
        let omega = 2.0 * PI * freq / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        Self {
            b0: 1.0 + alpha * a,
            b1: -2.0 * cos_omega,
            b2: 1.0 - alpha * a,
            a0: 1.0 + alpha / a,
            a1: -2.0 * cos_omega,
            a2: 1.0 - alpha / a,
        }
    }

    /// Calculate low shelf filter coefficients from a shelf slope
    ///
    /// `slope = 1` is the steepest monotonic shelf; larger values overshoot.
    /// The square root goes negative once `|gain_db|` grows past what the
    /// slope allows (about 22.9 dB for `slope = 2`), which yields NaN.
    pub fn low_shelf_with_slope(freq: f64, slope: f64, gain_db: f64, sample_rate: f64) -> Self {
        let a = 10.0_f64.powf(gain_db / 40.0);
        let omega = 2.0 * PI * freq / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / 2.0 * ((a + 1.0 / a) * (1.0 / slope - 1.0) + 2.0).sqrt();
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        Self {
            b0: a * ((a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha),
            b1: 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega),
            b2: a * ((a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha),
            a0: (a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha,
            a1: -2.0 * ((a - 1.0) + (a + 1.0) * cos_omega),
            a2: (a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha,
        }
    }

    #[inline]
    pub fn feedforward(&self) -> [f64; 3] {
        [self.b0, self.b1, self.b2]
    }

    #[inline]
    pub fn feedback(&self) -> [f64; 3] {
        [self.a0, self.a1, self.a2]
    }

    /// Same filter with `a0 = 1`
    pub fn normalized(&self) -> Self {
        Self {
            b0: self.b0 / self.a0,
            b1: self.b1 / self.a0,
            b2: self.b2 / self.a0,
            a0: 1.0,
            a1: self.a1 / self.a0,
            a2: self.a2 / self.a0,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.b0, self.b1, self.b2, self.a0, self.a1, self.a2]
            .iter()
            .all(|c| c.is_finite())
    }
}

impl FrequencyResponse for BiquadCoeffs {
    /// Evaluates H(z) = (b0 + b1*z^-1 + b2*z^-2) / (a0 + a1*z^-1 + a2*z^-2)
    /// at z = e^(jω) where ω = 2πf/fs
    fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * freq / sample_rate;
        let cos_w = omega.cos();
        let sin_w = omega.sin();
        let cos_2w = (2.0 * omega).cos();
        let sin_2w = (2.0 * omega).sin();

        let num_real = self.b0 + self.b1 * cos_w + self.b2 * cos_2w;
        let num_imag = -self.b1 * sin_w - self.b2 * sin_2w;

        let den_real = self.a0 + self.a1 * cos_w + self.a2 * cos_2w;
        let den_imag = -self.a1 * sin_w - self.a2 * sin_2w;

        let num_mag_sq = num_real * num_real + num_imag * num_imag;
        let den_mag_sq = den_real * den_real + den_imag * den_imag;

        (num_mag_sq / den_mag_sq).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE_RATE: f64 = 48000.0;

    fn db(magnitude: f64) -> f64 {
        20.0 * magnitude.log10()
    }

    #[test]
    fn test_identity_is_flat() {
        let coeffs = BiquadCoeffs::identity();
        for freq in [20.0, 1000.0, 20000.0] {
            assert_relative_eq!(coeffs.magnitude_at(freq, SAMPLE_RATE), 1.0);
        }
    }

    #[test]
    fn test_peaking_gain_at_center() {
        let coeffs = BiquadCoeffs::peaking(1000.0, 1.41, 6.0, SAMPLE_RATE);
        assert_relative_eq!(db(coeffs.magnitude_at(1000.0, SAMPLE_RATE)), 6.0, epsilon = 1e-9);
        assert!(db(coeffs.magnitude_at(20.0, SAMPLE_RATE)).abs() < 0.1);
        assert!(db(coeffs.magnitude_at(20000.0, SAMPLE_RATE)).abs() < 0.1);
    }

    #[test]
    fn test_low_shelf_plateaus() {
        let coeffs = BiquadCoeffs::low_shelf_with_slope(500.0, 2.0, 12.0, SAMPLE_RATE);
        assert_relative_eq!(db(coeffs.magnitude_at(1.0, SAMPLE_RATE)), 12.0, epsilon = 0.01);
        assert!(db(coeffs.magnitude_at(20000.0, SAMPLE_RATE)).abs() < 0.05);
        // Half the gain at the corner
        assert_relative_eq!(db(coeffs.magnitude_at(500.0, SAMPLE_RATE)), 6.0, epsilon = 0.01);
    }

    #[test]
    fn test_low_shelf_slope_limit() {
        assert!(BiquadCoeffs::low_shelf_with_slope(500.0, 2.0, 22.0, SAMPLE_RATE).is_finite());
        assert!(!BiquadCoeffs::low_shelf_with_slope(500.0, 2.0, 24.0, SAMPLE_RATE).is_finite());
    }

    #[test]
    fn test_normalized_keeps_response() {
        let coeffs = BiquadCoeffs::low_shelf_with_slope(300.0, 2.0, -9.0, SAMPLE_RATE);
        let normalized = coeffs.normalized();
        assert_relative_eq!(normalized.a0, 1.0);
        for freq in [50.0, 300.0, 5000.0] {
            assert_relative_eq!(
                coeffs.magnitude_at(freq, SAMPLE_RATE),
                normalized.magnitude_at(freq, SAMPLE_RATE),
                epsilon = 1e-12
            );
        }
    }
}
