//! Split-radix real FFT
//!
//! In-place real-input FFT working on a packed buffer of `N` values:
//!
//! ```text
//! trans[0]        Re(X[0])          (DC, purely real)
//! trans[k]        Re(X[k])          1 <= k < N/2
//! trans[N/2]      Re(X[N/2])        (Nyquist, purely real)
//! trans[N - k]    Im(X[k])          1 <= k < N/2
//! ```
//!
//! The forward transform uses the `e^{-j}` convention and is unscaled; the
//! inverse applies `1/N` while permuting into the output.

use std::f64::consts::{PI, SQRT_2};

use gfe_core::{GfeError, GfeResult};

const SQRT1_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Smallest transform the butterflies support
pub const MIN_FFT_SIZE: usize = 8;

/// Real FFT engine owning its working buffer
#[derive(Debug, Clone)]
pub struct Rfft {
    size: usize,
    sample_rate: u32,
    bandwidth: f64,
    trans: Vec<f64>,
    spectrum: Vec<f64>,
}

impl Rfft {
    pub fn new(size: usize, sample_rate: u32) -> GfeResult<Self> {
        if size < MIN_FFT_SIZE || !size.is_power_of_two() {
            return Err(GfeError::InvalidFftSize(size));
        }
        if sample_rate == 0 {
            return Err(GfeError::InvalidSampleRate(sample_rate));
        }
        Ok(Self {
            size,
            sample_rate,
            bandwidth: sample_rate as f64 / size as f64,
            trans: vec![0.0; size],
            spectrum: vec![0.0; size / 2 + 1],
        })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Width of one bin in Hz
    #[inline]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn change_sample_rate(&mut self, sample_rate: u32) -> GfeResult<()> {
        if sample_rate == 0 {
            return Err(GfeError::InvalidSampleRate(sample_rate));
        }
        self.sample_rate = sample_rate;
        self.bandwidth = sample_rate as f64 / self.size as f64;
        Ok(())
    }

    /// Packed spectrum produced by the last [`forward`](Self::forward)
    #[inline]
    pub fn trans(&self) -> &[f64] {
        &self.trans
    }

    /// Packed spectrum to be consumed by [`inverse`](Self::inverse)
    #[inline]
    pub fn trans_mut(&mut self) -> &mut [f64] {
        &mut self.trans
    }

    /// Forward transform of `input` (length `N`) into the packed buffer
    pub fn forward(&mut self, input: &[f64]) -> &[f64] {
        debug_assert_eq!(input.len(), self.size);
        let n = self.size;
        reverse_bin_permute(&mut self.trans, input, 1.0);
        let x = &mut self.trans;

        radix2_pass(x);

        let mut n2 = 2;
        let mut nn = n >> 1;
        loop {
            nn >>= 1;
            if nn == 0 {
                break;
            }
            n2 <<= 1;
            let n4 = n2 >> 2;
            let n8 = n2 >> 3;

            let mut ix = 0;
            let mut id = n2 << 1;
            while ix < n {
                let mut i0 = ix;
                while i0 < n {
                    let (mut i1, mut i2, mut i3, mut i4) = (i0, i0 + n4, i0 + 2 * n4, i0 + 3 * n4);

                    let t1 = x[i3] + x[i4];
                    x[i4] -= x[i3];
                    x[i3] = x[i1] - t1;
                    x[i1] += t1;

                    if n4 != 1 {
                        i1 += n8;
                        i2 += n8;
                        i3 += n8;
                        i4 += n8;

                        let t1 = (x[i3] + x[i4]) * -SQRT1_2;
                        let t2 = (x[i3] - x[i4]) * SQRT1_2;
                        let a = x[i2];
                        x[i4] = t1 + a;
                        x[i3] = t1 - a;
                        x[i2] = x[i1] - t2;
                        x[i1] += t2;
                    }
                    i0 += id;
                }
                ix = (id << 1) - n2;
                id <<= 2;
            }

            let e = 2.0 * PI / n2 as f64;
            for j in 1..n8 {
                let (ss1, cc1, ss3, cc3) = twiddles(j as f64 * e);

                let mut ix = 0;
                let mut id = n2 << 1;
                while ix < n {
                    let mut i0 = ix;
                    while i0 < n {
                        let i1 = i0 + j;
                        let i2 = i1 + n4;
                        let i3 = i2 + n4;
                        let i4 = i3 + n4;
                        let i5 = i0 + n4 - j;
                        let i6 = i5 + n4;
                        let i7 = i6 + n4;
                        let i8 = i7 + n4;

                        let mut t2 = x[i7] * cc1 - x[i3] * ss1;
                        let mut t1 = x[i7] * ss1 + x[i3] * cc1;
                        let mut t4 = x[i8] * cc3 - x[i4] * ss3;
                        let mut t3 = x[i8] * ss3 + x[i4] * cc3;

                        let a = t2 - t4;
                        t2 += t4;
                        t4 = a;

                        x[i8] = t2 + x[i6];
                        x[i3] = t2 - x[i6];

                        let a = t3 - t1;
                        t1 += t3;
                        t3 = a;

                        x[i4] = t3 + x[i2];
                        x[i7] = t3 - x[i2];

                        x[i6] = x[i1] - t1;
                        x[i1] += t1;

                        x[i2] = t4 + x[i5];
                        x[i5] -= t4;

                        i0 += id;
                    }
                    ix = (id << 1) - n2;
                    id <<= 2;
                }
            }
        }

        &self.trans
    }

    /// Inverse transform of the packed buffer into `output`, scaled by `1/N`
    ///
    /// The packed buffer is used as scratch and holds garbage afterwards.
    pub fn inverse(&mut self, output: &mut [f64]) {
        debug_assert_eq!(output.len(), self.size);
        let n = self.size;
        let x = &mut self.trans;

        let mut n2 = n << 1;
        let mut nn = n >> 1;
        loop {
            nn >>= 1;
            if nn == 0 {
                break;
            }
            let mut id = n2;
            n2 >>= 1;
            let n4 = n2 >> 2;
            let n8 = n4 >> 1;

            let mut ix = 0;
            while ix < n {
                let mut i0 = ix;
                while i0 < n {
                    let (mut i1, mut i2, mut i3, mut i4) = (i0, i0 + n4, i0 + 2 * n4, i0 + 3 * n4);

                    let t1 = x[i1] - x[i3];
                    x[i1] += x[i3];
                    x[i2] += x[i2];
                    x[i4] += x[i4];
                    x[i3] = t1 - x[i4];
                    x[i4] += t1;

                    if n4 != 1 {
                        i1 += n8;
                        i2 += n8;
                        i3 += n8;
                        i4 += n8;

                        let t1 = (x[i1] - x[i2]) * SQRT_2;
                        x[i1] += x[i2];
                        let t2 = (x[i4] + x[i3]) * -SQRT_2;
                        x[i2] = x[i4] - x[i3];
                        x[i3] = t2 + t1;
                        x[i4] = t2 - t1;
                    }
                    i0 += id;
                }
                ix = (id << 1) - n2;
                id <<= 2;
            }

            let e = 2.0 * PI / n2 as f64;
            for j in 1..n8 {
                let (ss1, cc1, ss3, cc3) = twiddles(j as f64 * e);

                let mut ix = 0;
                let mut id = n2 << 1;
                while ix < n {
                    let mut i0 = ix;
                    while i0 < n {
                        let i1 = i0 + j;
                        let i2 = i1 + n4;
                        let i3 = i2 + n4;
                        let i4 = i3 + n4;
                        let i5 = i0 + n4 - j;
                        let i6 = i5 + n4;
                        let i7 = i6 + n4;
                        let i8 = i7 + n4;

                        let mut t1 = x[i1] - x[i6];
                        x[i1] += x[i6];
                        let mut t2 = x[i5] - x[i2];
                        x[i5] += x[i2];
                        let t3 = x[i8] + x[i3];
                        x[i6] = x[i8] - x[i3];
                        let mut t4 = x[i4] + x[i7];
                        x[i2] = x[i4] - x[i7];

                        let a = t1 - t4;
                        t1 += t4;
                        t4 = t2 - t3;
                        t2 += t3;

                        x[i7] = a * ss1 - t4 * cc1;
                        x[i3] = a * cc1 + t4 * ss1;
                        x[i4] = t1 * cc3 - t2 * ss3;
                        x[i8] = t1 * ss3 + t2 * cc3;

                        i0 += id;
                    }
                    ix = (id << 1) - n2;
                    id <<= 2;
                }
            }
        }

        radix2_pass(x);

        reverse_bin_permute(output, &self.trans, 1.0 / n as f64);
    }

    /// Magnitudes of bins `0..=N/2` from the packed buffer
    pub fn calculate_spectrum(&mut self) -> &[f64] {
        let n = self.size;
        let half = n / 2;
        let x = &self.trans;

        self.spectrum[0] = x[0].abs();
        for i in 1..half {
            let re = x[i];
            let im = x[n - i];
            self.spectrum[i] = (re * re + im * im).sqrt();
        }
        self.spectrum[half] = x[half].abs();

        &self.spectrum
    }

    /// Spectrum computed by the last [`calculate_spectrum`](Self::calculate_spectrum)
    #[inline]
    pub fn spectrum(&self) -> &[f64] {
        &self.spectrum
    }
}

// ============================================================================
// Butterfly helpers
// ============================================================================

/// Length-two butterflies over the L-shaped index pattern
fn radix2_pass(x: &mut [f64]) {
    let n = x.len();
    let mut ix = 0;
    let mut id = 4;
    while ix < n {
        let mut i0 = ix;
        while i0 < n {
            let a = x[i0] - x[i0 + 1];
            x[i0] += x[i0 + 1];
            x[i0 + 1] = a;
            i0 += id;
        }
        ix = (id - 1) << 1;
        id <<= 2;
    }
}

/// `(sin a, cos a, sin 3a, cos 3a)` via the triple-angle identities
#[inline]
fn twiddles(a: f64) -> (f64, f64, f64, f64) {
    let ss1 = a.sin();
    let cc1 = a.cos();
    let cc3 = 4.0 * cc1 * (cc1 * cc1 - 0.75);
    let ss3 = 4.0 * ss1 * (0.75 - ss1 * ss1);
    (ss1, cc1, ss3, cc3)
}

/// Bit-reversal permutation of `src` into `dest`, multiplying by `scale`
fn reverse_bin_permute(dest: &mut [f64], src: &[f64], scale: f64) {
    let n = src.len();
    let half = n >> 1;
    let nm1 = n - 1;
    let mut i = 1;
    let mut r = 0;

    dest[0] = src[0] * scale;
    loop {
        r += half;
        dest[i] = src[r] * scale;
        dest[r] = src[i] * scale;
        i += 1;

        let mut h = half << 1;
        loop {
            h >>= 1;
            if h == 0 {
                break;
            }
            r ^= h;
            if r & h != 0 {
                break;
            }
        }

        if r >= i {
            dest[i] = src[r] * scale;
            dest[r] = src[i] * scale;
            dest[nm1 - i] = src[nm1 - r] * scale;
            dest[nm1 - r] = src[nm1 - i] * scale;
        }
        i += 1;

        if i >= half {
            break;
        }
    }
    dest[nm1] = src[nm1] * scale;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn naive_dft(input: &[f64], k: usize) -> (f64, f64) {
        let n = input.len();
        input.iter().enumerate().fold((0.0, 0.0), |(re, im), (m, &v)| {
            let phase = -2.0 * PI * (k * m) as f64 / n as f64;
            (re + v * phase.cos(), im + v * phase.sin())
        })
    }

    #[test]
    fn test_rejects_bad_sizes() {
        assert_eq!(Rfft::new(4, 44100).unwrap_err(), GfeError::InvalidFftSize(4));
        assert_eq!(Rfft::new(100, 44100).unwrap_err(), GfeError::InvalidFftSize(100));
        assert_eq!(Rfft::new(64, 0).unwrap_err(), GfeError::InvalidSampleRate(0));
    }

    #[test]
    fn test_forward_matches_dft() {
        for n in [8, 16, 32, 64] {
            let mut fft = Rfft::new(n, 48000).unwrap();
            let input: Vec<f64> = (0..n).map(|i| ((i * 7 + 3) % 11) as f64 - 5.0).collect();
            let trans = fft.forward(&input).to_vec();

            for k in 0..=n / 2 {
                let (re, im) = naive_dft(&input, k);
                assert_abs_diff_eq!(trans[k], re, epsilon = 1e-9);
                if k != 0 && k != n / 2 {
                    assert_abs_diff_eq!(trans[n - k], im, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_impulse_is_flat() {
        let n = 256;
        let mut fft = Rfft::new(n, 48000).unwrap();
        let mut input = vec![0.0; n];
        input[0] = 1.0;
        fft.forward(&input);
        for &m in fft.calculate_spectrum() {
            assert_abs_diff_eq!(m, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_inverse_roundtrip() {
        let n = 1024;
        let mut fft = Rfft::new(n, 44100).unwrap();
        let input: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin() + 0.25).collect();
        fft.forward(&input);
        let mut output = vec![0.0; n];
        fft.inverse(&mut output);
        for (a, b) in input.iter().zip(&output) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_spectrum_of_cosine() {
        let n = 64;
        let mut fft = Rfft::new(n, 64).unwrap();
        let input: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 4.0 * i as f64 / n as f64).cos())
            .collect();
        fft.forward(&input);
        let spectrum = fft.calculate_spectrum();
        assert_eq!(spectrum.len(), n / 2 + 1);
        assert_abs_diff_eq!(spectrum[4], n as f64 / 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(spectrum[5], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bandwidth_follows_sample_rate() {
        let mut fft = Rfft::new(1024, 44100).unwrap();
        assert_abs_diff_eq!(fft.bandwidth(), 44100.0 / 1024.0);
        fft.change_sample_rate(48000).unwrap();
        assert_abs_diff_eq!(fft.bandwidth(), 48000.0 / 1024.0);
    }
}
