//! Filter-bank decomposition and composite band estimation.
//!
//! [`decompose`] runs every channel through every band of a [`BandSpec`]:
//! the channel is transformed once, then for each band the spectrum is
//! multiplied by the Hilbert analytic mask and a Gaussian kernel centred on
//! the band, inverse-transformed, and its magnitude taken. The result is a
//! non-negative envelope per (channel, band), same length as the input.
//!
//! [`composite`] averages a masked subset of those envelopes sample by
//! sample, which is how the high-gamma trace is built.
use log::debug;
use ndarray::{s, Array2, Array3, ArrayView1, Axis};

use crate::bands::BandSpec;
use crate::error::{EcogError, Result};
use crate::filter::{analytic_mask, gaussian_kernel, SpectralFilter};

/// Band envelopes, `[C, B, T]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BandPower {
    pub data: Array3<f64>,
    pub fs: f64,
    pub bands: BandSpec,
}

impl BandPower {
    pub fn n_channels(&self) -> usize {
        self.data.dim().0
    }

    pub fn n_bands(&self) -> usize {
        self.data.dim().1
    }

    pub fn n_samples(&self) -> usize {
        self.data.dim().2
    }

    /// Envelope of one channel in one band.
    pub fn trace(&self, channel: usize, band: usize) -> Result<ArrayView1<'_, f64>> {
        let n_channels = self.n_channels();
        if channel >= n_channels {
            return Err(EcogError::ChannelIndex { channel, n_channels });
        }
        if band >= self.n_bands() {
            return Err(EcogError::config(
                "band",
                format!("index {band} outside {} bands", self.n_bands()),
            ));
        }
        Ok(self.data.slice(s![channel, band, ..]))
    }

    /// Flatten to `[C · B, T]`, row `c · B + b` holding channel `c`, band `b`.
    pub fn to_rows(&self) -> Array2<f64> {
        let (c, b, t) = self.data.dim();
        Array2::from_shape_fn((c * b, t), |(r, k)| self.data[[r / b, r % b, k]])
    }
}

/// Decompose every channel of `channels` (`[C, T]`) into the bands of `bands`.
///
/// All bands are validated against `fs` before any channel is touched, so
/// the call either produces every trace or none.
pub fn decompose(channels: &Array2<f64>, fs: f64, bands: &BandSpec) -> Result<BandPower> {
    bands.validate(fs)?;
    let (n_ch, n_t) = channels.dim();
    if n_t == 0 {
        return Err(EcogError::InsufficientData("cannot decompose an empty recording".into()));
    }
    debug!("decomposing {n_ch} ch × {n_t} samples into {} bands @ {fs} Hz", bands.len());

    let analytic = analytic_mask(n_t);
    let gains: Vec<Vec<f64>> = bands
        .iter()
        .map(|b| {
            gaussian_kernel(n_t, fs, b.center_hz, b.sigma_hz)
                .into_iter()
                .zip(&analytic)
                .map(|(k, h)| k * h)
                .collect()
        })
        .collect();

    let filter = SpectralFilter::new(n_t);
    let mut out = Array3::<f64>::zeros((n_ch, bands.len(), n_t));
    for (row, mut dst) in channels.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
        let spec = filter.spectrum(row.iter());
        for (gain, mut band_row) in gains.iter().zip(dst.axis_iter_mut(Axis(0))) {
            let env = filter.filtered_abs(&spec, gain);
            band_row.assign(&ArrayView1::from(&env));
        }
    }

    Ok(BandPower { data: out, fs, bands: bands.clone() })
}

/// Per-sample mean of the bands selected by `mask`, one trace per channel.
pub fn composite(power: &BandPower, mask: &[bool]) -> Result<Array2<f64>> {
    if mask.len() != power.n_bands() {
        return Err(EcogError::config(
            "band selection",
            format!("mask has {} entries but {} bands were decomposed", mask.len(), power.n_bands()),
        ));
    }
    let selected: Vec<usize> = mask.iter().enumerate().filter(|(_, &m)| m).map(|(i, _)| i).collect();
    if selected.is_empty() {
        return Err(EcogError::config("band selection", "no band selected"));
    }

    let mut sum = Array2::<f64>::zeros((power.n_channels(), power.n_samples()));
    for &b in &selected {
        sum += &power.data.slice(s![.., b, ..]);
    }
    Ok(sum / selected.len() as f64)
}
