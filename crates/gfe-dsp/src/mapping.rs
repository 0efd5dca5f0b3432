//! Resampling between frequency axes
//!
//! The editor moves values between two very different grids: the 500
//! visible bins (dense in the bass, sparse in the treble) and the uniform
//! FFT bins (sparse in the bass at short lengths, dense in the treble).
//! A single routine handles both directions. Each destination point owns
//! the cell between the midpoints to its neighbours; when that cell holds
//! several source points they are averaged, otherwise the source is
//! linearly interpolated at the destination frequency.

/// A monotonically increasing set of frequencies
pub trait FrequencyAxis {
    fn len(&self) -> usize;

    fn frequency(&self, index: usize) -> f64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Evenly spaced frequencies starting at 0 Hz (FFT bins)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformAxis {
    spacing: f64,
    len: usize,
}

impl UniformAxis {
    pub fn new(spacing: f64, len: usize) -> Self {
        Self { spacing, len }
    }

    /// Bins `0..=fft_size/2` of an FFT at `sample_rate`
    pub fn fft_bins(fft_size: usize, sample_rate: u32) -> Self {
        Self::new(sample_rate as f64 / fft_size as f64, fft_size / 2 + 1)
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }
}

impl FrequencyAxis for UniformAxis {
    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn frequency(&self, index: usize) -> f64 {
        self.spacing * index as f64
    }
}

/// Cell owned by destination point `index`
fn cell<A: FrequencyAxis + ?Sized>(axis: &A, index: usize) -> (f64, f64) {
    let f = axis.frequency(index);
    let len = axis.len();
    if len < 2 {
        return (f, f);
    }
    let low = if index > 0 {
        (axis.frequency(index - 1) + f) / 2.0
    } else {
        f - (axis.frequency(1) - f) / 2.0
    };
    let high = if index + 1 < len {
        (f + axis.frequency(index + 1)) / 2.0
    } else {
        f + (f - axis.frequency(index - 1)) / 2.0
    };
    (low, high)
}

/// Resample values living on `source` onto `destination`
///
/// `read(i)` yields the value at source point `i`; `write(j, v)` receives the
/// value for destination point `j`, for every `j` in order. Outside the
/// source range the nearest edge value is used.
pub fn resample<S, D, R, W>(source: &S, mut read: R, destination: &D, mut write: W)
where
    S: FrequencyAxis + ?Sized,
    D: FrequencyAxis + ?Sized,
    R: FnMut(usize) -> f64,
    W: FnMut(usize, f64),
{
    let source_len = source.len();
    if source_len == 0 {
        return;
    }
    let first = source.frequency(0);
    let last = source.frequency(source_len - 1);

    let mut start = 0;
    let mut segment = 0;

    for index in 0..destination.len() {
        let f = destination.frequency(index);
        let (low, high) = cell(destination, index);

        while start < source_len && source.frequency(start) < low {
            start += 1;
        }
        let mut end = start;
        while end < source_len && source.frequency(end) < high {
            end += 1;
        }

        let value = if end - start >= 2 {
            (start..end).map(&mut read).sum::<f64>() / (end - start) as f64
        } else if f <= first {
            read(0)
        } else if f >= last {
            read(source_len - 1)
        } else {
            while segment + 2 < source_len && source.frequency(segment + 1) <= f {
                segment += 1;
            }
            let f0 = source.frequency(segment);
            let f1 = source.frequency(segment + 1);
            let v0 = read(segment);
            let v1 = read(segment + 1);
            v0 + (v1 - v0) * (f - f0) / (f1 - f0)
        };

        write(index, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    struct Table(Vec<f64>);

    impl FrequencyAxis for Table {
        fn len(&self) -> usize {
            self.0.len()
        }

        fn frequency(&self, index: usize) -> f64 {
            self.0[index]
        }
    }

    #[test]
    fn test_constant_is_preserved() {
        let source = UniformAxis::new(10.0, 100);
        let destination = Table(vec![1.0, 3.0, 50.0, 51.0, 500.0, 2000.0]);
        let mut out = vec![0.0; destination.len()];
        resample(&source, |_| 7.5, &destination, |i, v| out[i] = v);
        for v in out {
            assert_abs_diff_eq!(v, 7.5);
        }
    }

    #[test]
    fn test_sparse_source_interpolates() {
        let source = Table(vec![0.0, 100.0, 200.0]);
        let values = [0.0, 10.0, 30.0];
        let destination = Table(vec![50.0, 150.0, 175.0]);
        let mut out = vec![0.0; 3];
        resample(&source, |i| values[i], &destination, |i, v| out[i] = v);
        assert_abs_diff_eq!(out[0], 5.0);
        assert_abs_diff_eq!(out[1], 20.0);
        assert_abs_diff_eq!(out[2], 25.0);
    }

    #[test]
    fn test_dense_source_averages() {
        let source = UniformAxis::new(1.0, 100);
        let destination = Table(vec![10.0, 20.0, 30.0]);
        let mut out = vec![0.0; 3];
        resample(&source, |i| i as f64, &destination, |i, v| out[i] = v);
        // Cell of 20 Hz is [15, 25): mean of 15..=24
        assert_abs_diff_eq!(out[1], 19.5);
    }

    #[test]
    fn test_flat_extrapolation() {
        let source = Table(vec![100.0, 200.0]);
        let values = [1.0, 2.0];
        let destination = Table(vec![0.0, 10.0, 20.0, 30.0, 300.0, 310.0, 320.0]);
        let mut out = vec![0.0; destination.len()];
        resample(&source, |i| values[i], &destination, |i, v| out[i] = v);
        assert_eq!(out, vec![1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_every_destination_written_once() {
        let source = UniformAxis::fft_bins(64, 48000);
        let destination = UniformAxis::new(37.0, 300);
        let mut hits = vec![0; destination.len()];
        resample(&source, |_| 0.0, &destination, |i, _| hits[i] += 1);
        assert!(hits.iter().all(|&h| h == 1));
    }

    #[test]
    fn test_fft_bins_axis() {
        let axis = UniformAxis::fft_bins(2048, 44100);
        assert_eq!(axis.len(), 1025);
        assert_abs_diff_eq!(axis.frequency(1024), 22050.0);
    }
}
