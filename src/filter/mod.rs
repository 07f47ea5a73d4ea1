//! Frequency-domain filtering.
//!
//! - [`design`]: per-bin gains (Gaussian band-pass, Hilbert analytic mask,
//!   line-noise notch).
//! - [`apply`]: FFT → gain → inverse FFT for one signal or a `[C, T]` block.

pub mod apply;
pub mod design;

pub use apply::{apply_gain, SpectralFilter};
pub use design::{analytic_mask, fftfreq, gaussian_kernel, notch_mask};

use ndarray::Array2;

/// Half-width of the stop band around each line-noise harmonic, in Hz.
pub const NOTCH_HALF_WIDTH_HZ: f64 = 1.0;

/// Remove `line_hz` and its harmonics from every channel of `data`.
pub fn notch(data: &Array2<f64>, sfreq: f64, line_hz: f64) -> Array2<f64> {
    let gain = notch_mask(data.ncols(), sfreq, line_hz, NOTCH_HALF_WIDTH_HZ);
    apply_gain(data, &gain)
}
