//! Power spectral density of one channel over a time window.
//!
//! Matches `scipy.signal.periodogram(x, fs, nfft=fs/bin_hz)` with its
//! defaults: boxcar window, constant detrend, one-sided, density scaling
//! (`V²/Hz`).
//!
//! ```text
//! nfft   = round(fs / bin_hz)
//! x      = window[..min(len, nfft)] − mean          (zero-padded to nfft)
//! P[k]   = |FFT(x)[k]|² / (fs · N)                   N = samples used
//! P[k]  *= 2   for 0 < k < nfft/2 (and k = nfft/2 when nfft is odd)
//! f[k]   = k · fs / nfft                             k = 0..=nfft/2
//! ```
//!
//! A requested window that does not fit inside the series falls back to the
//! whole series; [`Periodogram::clamped`] and [`Periodogram::n_samples`]
//! report what was actually used.
use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use ndarray::ArrayView1;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{EcogError, Result};
use crate::store::ChannelStore;

/// Largest FFT length a single estimate may request (0.1 Hz bins up to ~1.6 MHz).
pub const MAX_NFFT: usize = 1 << 24;

#[derive(Debug, Clone, PartialEq)]
pub struct Periodogram {
    /// Bin frequencies in Hz.
    pub freqs: Vec<f64>,
    /// Power density per bin in units²/Hz.
    pub power: Vec<f64>,
    /// Samples the estimate was computed from.
    pub n_samples: usize,
    /// The requested window did not fit and the full series was used.
    pub clamped: bool,
}

impl Periodogram {
    /// Frequency of the strongest bin, ignoring DC.
    pub fn peak_frequency(&self) -> Option<f64> {
        self.power
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| self.freqs[k])
    }
}

/// Periodogram of `series[start..end]` at `bin_hz` resolution.
pub fn periodogram(
    series: ArrayView1<f64>,
    fs: f64,
    bin_hz: f64,
    window: (usize, usize),
) -> Result<Periodogram> {
    if !(fs > 0.0) {
        return Err(EcogError::config("sampling rate", format!("must be positive, got {fs}")));
    }
    if !(bin_hz > 0.0) {
        return Err(EcogError::config("bin_hz", format!("must be positive, got {bin_hz}")));
    }
    let points = (fs / bin_hz).round();
    if !(points >= 2.0) {
        return Err(EcogError::config(
            "bin_hz",
            format!("{bin_hz} Hz bins leave fewer than two FFT points at {fs} Hz"),
        ));
    }
    if points > MAX_NFFT as f64 {
        return Err(EcogError::config(
            "bin_hz",
            format!("{bin_hz} Hz bins need {points} FFT points at {fs} Hz (max {MAX_NFFT})"),
        ));
    }
    let nfft = points as usize;
    if series.is_empty() {
        return Err(EcogError::InsufficientData("empty series".into()));
    }

    let (start, end) = window;
    let clamped = start >= end || end > series.len();
    let segment = if clamped {
        warn!(
            "periodogram window {start}..{end} outside {} samples; using the full series",
            series.len()
        );
        series
    } else {
        series.slice_move(ndarray::s![start..end])
    };

    let n = segment.len().min(nfft);
    let mean = segment.iter().take(n).sum::<f64>() / n as f64;
    let mut buf: Vec<Complex<f64>> = segment
        .iter()
        .take(n)
        .map(|&v| Complex { re: v - mean, im: 0.0 })
        .chain(std::iter::repeat(Complex::default()))
        .take(nfft)
        .collect();
    let mut planner: FftPlanner<f64> = FftPlanner::new();
    planner.plan_fft_forward(nfft).process(&mut buf);

    let n_bins = nfft / 2 + 1;
    let scale = 1.0 / (fs * n as f64);
    let last_doubled = if nfft % 2 == 0 { n_bins - 1 } else { n_bins };
    let power: Vec<f64> = buf[..n_bins]
        .iter()
        .enumerate()
        .map(|(k, c)| {
            let p = c.norm_sqr() * scale;
            if k > 0 && k < last_doubled { 2.0 * p } else { p }
        })
        .collect();
    let freqs = (0..n_bins).map(|k| k as f64 * fs / nfft as f64).collect();

    Ok(Periodogram { freqs, power, n_samples: segment.len(), clamped })
}

/// Per-channel periodogram memo for one analysis session.
///
/// Keyed by channel only: once a channel is computed, later requests return
/// that result whatever window or bin size they ask for. Call
/// [`invalidate`](Self::invalidate) to start over.
#[derive(Debug, Default)]
pub struct PeriodogramCache {
    entries: HashMap<usize, Arc<Periodogram>>,
}

impl PeriodogramCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: usize) -> Option<Arc<Periodogram>> {
        self.entries.get(&channel).cloned()
    }

    /// Cached periodogram of `channel`, computing it from `interface` on a miss.
    pub fn get_or_compute<S: ChannelStore + ?Sized>(
        &mut self,
        store: &S,
        interface: &str,
        channel: usize,
        bin_hz: f64,
        window: (usize, usize),
    ) -> Result<Arc<Periodogram>> {
        if let Some(hit) = self.entries.get(&channel) {
            return Ok(Arc::clone(hit));
        }
        let iface = store.interface(interface)?;
        let n_channels = iface.data.nrows();
        if channel >= n_channels {
            return Err(EcogError::ChannelIndex { channel, n_channels });
        }
        debug!("periodogram: channel {channel} of `{interface}`");
        let p = Arc::new(periodogram(iface.data.row(channel), iface.fs, bin_hz, window)?);
        self.entries.insert(channel, Arc::clone(&p));
        Ok(p)
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
