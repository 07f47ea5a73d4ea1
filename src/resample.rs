//! FFT resampling, as `mne.filter.resample(..., method='fft')` does it.
//!
//! Per channel:
//!   1. Pad both ends with an odd reflection about the edge samples so the
//!      padded length is the next power of two (at least `min(n/8, 100)`
//!      samples per side).
//!   2. Full FFT of the padded signal; keep the half spectrum.
//!   3. Downsampling doubles the new Nyquist bin, upsampling halves the old
//!      one (even lengths only).
//!   4. Scale every bin by `new_len / old_len`.
//!   5. Inverse FFT at the new padded length (truncating or zero-extending
//!      the half spectrum, restoring Hermitian symmetry).
//!   6. Strip the resampled padding.
use ndarray::{Array2, ArrayView1, Axis};
use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{EcogError, Result};

/// Left/right padding that brings `n` up to the next power of two.
///
/// ```text
/// min_add = min(n / 8, 100) * 2
/// total   = 2^ceil(log2(n + min_add)) - n
/// ```
pub fn auto_npad(n: usize) -> (usize, usize) {
    let min_add = (n / 8).min(100) * 2;
    let total = (n + min_add).next_power_of_two() - n;
    (total / 2, total - total / 2)
}

/// Output length for `n` input samples: `round(n · dst / src)`.
pub fn resampled_len(n: usize, src_sfreq: f64, dst_sfreq: f64) -> usize {
    (n as f64 * dst_sfreq / src_sfreq).round() as usize
}

/// Resample every channel of `data` (`[C, T]`) from `src_sfreq` to `dst_sfreq`.
pub fn resample(data: &Array2<f64>, src_sfreq: f64, dst_sfreq: f64) -> Result<Array2<f64>> {
    if !(src_sfreq > 0.0) || !(dst_sfreq > 0.0) {
        return Err(EcogError::config(
            "sampling rate",
            format!("cannot resample {src_sfreq} Hz → {dst_sfreq} Hz"),
        ));
    }
    if (src_sfreq - dst_sfreq).abs() < 1e-9 {
        return Ok(data.clone());
    }
    let ratio = dst_sfreq / src_sfreq;
    let n_in = data.ncols();
    let (npad_l, npad_r) = auto_npad(n_in);
    let mut out = Array2::<f64>::zeros((data.nrows(), resampled_len(n_in, src_sfreq, dst_sfreq)));
    for (row, mut dst) in data.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
        let y = resample_1d(row, ratio, npad_l, npad_r);
        dst.assign(&ArrayView1::from(&y));
    }
    Ok(out)
}

/// Resample one signal by `ratio` (`dst / src`) with explicit padding.
pub fn resample_1d(x: ArrayView1<f64>, ratio: f64, npad_l: usize, npad_r: usize) -> Vec<f64> {
    let n_in = x.len();
    if n_in == 0 {
        return Vec::new();
    }
    let final_len = (ratio * n_in as f64).round() as usize;

    let x_ext = reflect_pad(x, npad_l, npad_r);
    let old_len = x_ext.len();
    let new_len = (ratio * old_len as f64).round() as usize;
    if new_len == 0 {
        return vec![0.0; final_len];
    }
    let shorter = new_len < old_len;
    let use_len = if shorter { new_len } else { old_len };

    let mut planner: FftPlanner<f64> = FftPlanner::new();
    let mut buf: Vec<Complex<f64>> = x_ext.iter().map(|&v| Complex { re: v, im: 0.0 }).collect();
    planner.plan_fft_forward(old_len).process(&mut buf);
    buf.truncate(old_len / 2 + 1);

    if use_len % 2 == 0 {
        let nyq = use_len / 2;
        if let Some(bin) = buf.get_mut(nyq) {
            *bin *= if shorter { 2.0 } else { 0.5 };
        }
    }
    let scale = new_len as f64 / old_len as f64;

    let half = new_len / 2 + 1;
    let mut spec = vec![Complex::<f64>::default(); new_len];
    let n_copy = buf.len().min(half);
    for (dst, src) in spec[..n_copy].iter_mut().zip(&buf[..n_copy]) {
        *dst = src * scale;
    }
    for i in 1..half {
        let j = new_len - i;
        if j >= half {
            spec[j] = spec[i].conj();
        }
    }
    planner.plan_fft_inverse(new_len).process(&mut spec);
    let inv_scale = 1.0 / new_len as f64;

    let strip_l = (ratio * npad_l.min(n_in - 1) as f64).round() as usize;
    let mut y: Vec<f64> = spec
        .iter()
        .skip(strip_l)
        .take(final_len)
        .map(|c| c.re * inv_scale)
        .collect();
    y.resize(final_len, 0.0);
    y
}

/// Odd reflection about the edge samples, limited to `n - 1` per side.
fn reflect_pad(x: ArrayView1<f64>, n_l: usize, n_r: usize) -> Vec<f64> {
    let n = x.len();
    let pad_l = n_l.min(n - 1);
    let pad_r = n_r.min(n - 1);
    let (first, last) = (x[0], x[n - 1]);
    let mut out = Vec::with_capacity(pad_l + n + pad_r);
    out.extend((1..=pad_l).rev().map(|i| 2.0 * first - x[i]));
    out.extend(x.iter().copied());
    out.extend((1..=pad_r).map(|i| 2.0 * last - x[n - 1 - i]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn same_rate_is_passthrough() {
        let data = Array2::from_shape_fn((2, 512), |(_, t)| t as f64 / 512.0);
        let out = resample(&data, 256.0, 256.0).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn output_length_rounds() {
        let data = Array2::zeros((1, 30000));
        let out = resample(&data, 3000.0, 400.0).unwrap();
        assert_eq!(out.ncols(), 4000);
    }

    #[test]
    fn dc_is_preserved() {
        let data = Array2::from_elem((1, 1024), 3.5);
        let out = resample(&data, 512.0, 256.0).unwrap();
        for &v in out.iter() {
            approx::assert_abs_diff_eq!(v, 3.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn low_frequency_sine_survives_downsampling() {
        let (fs, fd, f0) = (1000.0, 250.0, 10.0);
        let data = Array2::from_shape_fn((1, 2000), |(_, t)| {
            (2.0 * std::f64::consts::PI * f0 * t as f64 / fs).sin()
        });
        let out = resample(&data, fs, fd).unwrap();
        // Interior samples follow the same sine at the new rate.
        for t in 50..450 {
            let expected = (2.0 * std::f64::consts::PI * f0 * t as f64 / fd).sin();
            approx::assert_abs_diff_eq!(out[[0, t]], expected, epsilon = 1e-2);
        }
    }

    #[test]
    fn auto_npad_reaches_power_of_two() {
        assert_eq!(auto_npad(15360), (512, 512));
        assert_eq!(auto_npad(30720), (1024, 1024));
        let (l, r) = auto_npad(30000);
        assert_eq!(30000 + l + r, 32768);
    }

    #[test]
    fn invalid_rates_rejected() {
        let data = Array2::zeros((1, 8));
        assert!(resample(&data, 0.0, 100.0).is_err());
        assert!(resample(&data, 100.0, -1.0).is_err());
    }
}
