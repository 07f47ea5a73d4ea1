//! Frequency-domain filter design.
//!
//! Every filter here is a real-valued gain per FFT bin, laid out like
//! `numpy.fft.fftfreq(n, 1/sfreq)`: bin `k` holds frequency `k·sfreq/n` for
//! `k < ⌈n/2⌉` and `(k − n)·sfreq/n` after that.
//!
//! - [`gaussian_kernel`]: band-pass centred on `center` Hz with standard
//!   deviation `sigma` Hz, unit gain at the centre.
//! - [`analytic_mask`]: one-sided spectrum weights turning a real signal's
//!   FFT into its analytic signal (Hilbert transform).
//! - [`notch_mask`]: zero gain within `±half_width` Hz of a line frequency
//!   and each of its harmonics below Nyquist.

/// Signed frequency of every bin for an `n`-point FFT at `sfreq` Hz.
pub fn fftfreq(n: usize, sfreq: f64) -> Vec<f64> {
    let df = sfreq / n as f64;
    let n_pos = n.div_ceil(2);
    (0..n)
        .map(|k| if k < n_pos { k as f64 * df } else { (k as f64 - n as f64) * df })
        .collect()
}

/// Gaussian band-pass gain `exp(−(|f| − center)² / 2σ²)`.
pub fn gaussian_kernel(n: usize, sfreq: f64, center: f64, sigma: f64) -> Vec<f64> {
    let two_var = 2.0 * sigma * sigma;
    fftfreq(n, sfreq)
        .into_iter()
        .map(|f| {
            let d = f.abs() - center;
            (-(d * d) / two_var).exp()
        })
        .collect()
}

/// Hilbert weights: DC (and Nyquist for even `n`) × 1, positive bins × 2,
/// negative bins × 0.
pub fn analytic_mask(n: usize) -> Vec<f64> {
    let mut h = vec![0.0; n];
    if n == 0 {
        return h;
    }
    h[0] = 1.0;
    if n % 2 == 0 {
        h[n / 2] = 1.0;
        h[1..n / 2].fill(2.0);
    } else {
        h[1..n.div_ceil(2)].fill(2.0);
    }
    h
}

/// Line-noise notch at `line_hz` and its harmonics below Nyquist.
///
/// The stop band is at least one bin wide so the nearest bin to every
/// harmonic is always removed, even for short records.
pub fn notch_mask(n: usize, sfreq: f64, line_hz: f64, half_width: f64) -> Vec<f64> {
    if n == 0 || !(line_hz > 0.0) {
        return vec![1.0; n];
    }
    let nyquist = sfreq / 2.0;
    let df = sfreq / n as f64;
    let hw = half_width.max(df / 2.0);
    let harmonics: Vec<f64> = (1..)
        .map(|h| h as f64 * line_hz)
        .take_while(|&f| f < nyquist)
        .collect();
    fftfreq(n, sfreq)
        .into_iter()
        .map(|f| {
            let f = f.abs();
            if harmonics.iter().any(|&h| (f - h).abs() <= hw) { 0.0 } else { 1.0 }
        })
        .collect()
}
