//! Applying spectral gains to real signals.
//!
//! Signals are transformed once with a full complex FFT; any number of gain
//! vectors can then be applied to the same spectrum, which is how a filter
//! bank avoids re-transforming each channel per band.
use std::sync::Arc;

use ndarray::{Array2, Axis};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Forward/inverse FFT pair for one signal length.
pub struct SpectralFilter {
    n: usize,
    fwd: Arc<dyn Fft<f64>>,
    inv: Arc<dyn Fft<f64>>,
}

impl SpectralFilter {
    pub fn new(n: usize) -> Self {
        let mut planner: FftPlanner<f64> = FftPlanner::new();
        Self { n, fwd: planner.plan_fft_forward(n), inv: planner.plan_fft_inverse(n) }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Complex spectrum of a real signal of length `n`.
    pub fn spectrum<'a, I>(&self, x: I) -> Vec<Complex<f64>>
    where
        I: IntoIterator<Item = &'a f64>,
    {
        let mut buf: Vec<Complex<f64>> =
            x.into_iter().map(|&v| Complex { re: v, im: 0.0 }).collect();
        debug_assert_eq!(buf.len(), self.n);
        self.fwd.process(&mut buf);
        buf
    }

    /// Inverse transform of `spectrum · gain`, normalised by `1/n`.
    pub fn filtered(&self, spectrum: &[Complex<f64>], gain: &[f64]) -> Vec<Complex<f64>> {
        let inv_scale = 1.0 / self.n as f64;
        let mut buf: Vec<Complex<f64>> = spectrum
            .iter()
            .zip(gain)
            .map(|(&s, &g)| s * (g * inv_scale))
            .collect();
        self.inv.process(&mut buf);
        buf
    }

    /// Real part of [`filtered`](Self::filtered).
    pub fn filtered_real(&self, spectrum: &[Complex<f64>], gain: &[f64]) -> Vec<f64> {
        self.filtered(spectrum, gain).into_iter().map(|c| c.re).collect()
    }

    /// Magnitude of [`filtered`](Self::filtered); with an analytic gain this
    /// is the band envelope.
    pub fn filtered_abs(&self, spectrum: &[Complex<f64>], gain: &[f64]) -> Vec<f64> {
        self.filtered(spectrum, gain).into_iter().map(|c| c.norm()).collect()
    }
}

/// Apply a real, symmetric gain to every channel of `data` (`[C, T]`).
pub fn apply_gain(data: &Array2<f64>, gain: &[f64]) -> Array2<f64> {
    let n_t = data.ncols();
    let filter = SpectralFilter::new(n_t);
    let mut out = Array2::<f64>::zeros(data.dim());
    for (row, mut dst) in data.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
        let spec = filter.spectrum(row.iter());
        let y = filter.filtered_real(&spec, gain);
        dst.assign(&ndarray::ArrayView1::from(&y));
    }
    out
}
