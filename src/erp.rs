//! Event-related averages with standard error.
//!
//! For one channel and one set of trial events:
//!
//! 1. Cut `2·half` samples around every event ([`event_epochs`]); samples
//!    outside the recording are missing.
//! 2. Per time offset, average the trials that cover it and take
//!    `sem = std / √count` (population std over the same trials).
//! 3. Remove DC: subtract the mean of the mean trace from the mean trace.
//!
//! [`ErpCache`] memoises results per `(channel, alignment)` for a session.
//! The epoch width is shared by every entry, so changing it clears the whole
//! cache.
use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use ndarray::{Array1, ArrayView1, Axis};

use crate::epoch::{event_epochs, half_width_samples};
use crate::error::{EcogError, Result};
use crate::stats::{nan_mean, nan_mean_std};
use crate::store::{Alignment, ChannelStore};

/// Trial events of one alignment kind.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSet {
    pub alignment: Alignment,
    /// Event times in seconds.
    pub times: Vec<f64>,
}

impl TrialSet {
    pub fn from_store<S: ChannelStore + ?Sized>(store: &S, alignment: Alignment) -> Self {
        Self { alignment, times: store.trial_times(alignment).to_vec() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Erp {
    /// DC-removed trial mean.
    pub mean: Array1<f64>,
    /// Standard error of the mean per offset.
    pub sem: Array1<f64>,
    /// Seconds from the start of the epoch; the event sits at `half / fs`.
    pub time: Array1<f64>,
    /// Trials covering each offset.
    pub counts: Vec<usize>,
    /// The DC level removed from `mean`.
    pub dc: f64,
}

impl Erp {
    /// Largest `|mean|`, the symmetric y-range a single plot needs.
    pub fn abs_max(&self) -> f64 {
        self.mean.iter().filter(|v| !v.is_nan()).fold(0.0_f64, |m, v| m.max(v.abs()))
    }
}

/// ERP of `series` around `trials` with epochs `width_s` seconds wide.
pub fn erp(series: ArrayView1<f64>, fs: f64, trials: &TrialSet, width_s: f64) -> Result<Erp> {
    if trials.times.is_empty() {
        return Err(EcogError::InsufficientData(format!("no {} trials", trials.alignment)));
    }
    if !(fs > 0.0) {
        return Err(EcogError::config("sampling rate", format!("must be positive, got {fs}")));
    }
    let half = half_width_samples(width_s, fs);
    if half == 0 {
        return Err(EcogError::config(
            "epoch width",
            format!("{width_s} s at {fs} Hz gives an empty epoch"),
        ));
    }

    let epochs = event_epochs(series, fs, &trials.times, half)?;
    let n_t = epochs.ncols();
    let mut mean = Array1::<f64>::zeros(n_t);
    let mut sem = Array1::<f64>::zeros(n_t);
    let mut counts = Vec::with_capacity(n_t);
    for (k, col) in epochs.axis_iter(Axis(1)).enumerate() {
        let (n, m, s) = nan_mean_std(col.iter().copied());
        mean[k] = m;
        sem[k] = if n > 0 { s / (n as f64).sqrt() } else { f64::NAN };
        counts.push(n);
    }
    if counts.iter().all(|&n| n == 0) {
        return Err(EcogError::InsufficientData(format!(
            "every {} epoch lies outside the {}-sample recording",
            trials.alignment,
            series.len()
        )));
    }

    let dc = nan_mean(mean.iter().copied());
    mean -= dc;
    let time = Array1::from_shape_fn(n_t, |k| k as f64 / fs);
    Ok(Erp { mean, sem, time, counts, dc })
}

/// Per-`(channel, alignment)` ERP memo sharing one epoch width.
#[derive(Debug)]
pub struct ErpCache {
    width_s: f64,
    entries: HashMap<(usize, Alignment), Arc<Erp>>,
}

impl ErpCache {
    pub fn new(width_s: f64) -> Self {
        Self { width_s, entries: HashMap::new() }
    }

    pub fn epoch_width(&self) -> f64 {
        self.width_s
    }

    /// Change the epoch width. Any change clears every cached entry.
    /// Returns whether the cache was cleared.
    pub fn set_epoch_width(&mut self, width_s: f64) -> bool {
        if width_s == self.width_s {
            return false;
        }
        self.width_s = width_s;
        self.invalidate();
        true
    }

    pub fn get(&self, channel: usize, alignment: Alignment) -> Option<Arc<Erp>> {
        self.entries.get(&(channel, alignment)).cloned()
    }

    /// Cached ERP, computed from `interface` and the store's trial times on a miss.
    pub fn get_or_compute<S: ChannelStore + ?Sized>(
        &mut self,
        store: &S,
        interface: &str,
        channel: usize,
        alignment: Alignment,
    ) -> Result<Arc<Erp>> {
        if let Some(hit) = self.entries.get(&(channel, alignment)) {
            return Ok(Arc::clone(hit));
        }
        let iface = store.interface(interface)?;
        let n_channels = iface.data.nrows();
        if channel >= n_channels {
            return Err(EcogError::ChannelIndex { channel, n_channels });
        }
        debug!("erp: channel {channel} of `{interface}`, {alignment}, {} s epochs", self.width_s);
        let trials = TrialSet::from_store(store, alignment);
        let result = Arc::new(erp(iface.data.row(channel), iface.fs, &trials, self.width_s)?);
        self.entries.insert((channel, alignment), Arc::clone(&result));
        Ok(result)
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

/// Shared y-axis limits for a grid of ERP plots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLimits {
    /// `(min, max)` over every mean trace, always spanning zero.
    pub global_max: (f64, f64),
    /// `±` the largest per-channel standard deviation of the mean trace.
    pub global_std: (f64, f64),
}

pub fn scale_limits<'a, I>(erps: I) -> ScaleLimits
where
    I: IntoIterator<Item = &'a Erp>,
{
    let (mut lo, mut hi, mut sd) = (0.0_f64, 0.0_f64, 0.0_f64);
    for e in erps {
        for &v in e.mean.iter().filter(|v| !v.is_nan()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        let (_, _, s) = nan_mean_std(e.mean.iter().copied());
        if !s.is_nan() {
            sd = sd.max(s);
        }
    }
    ScaleLimits { global_max: (lo, hi), global_std: (-sd, sd) }
}
