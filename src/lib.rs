//! # ecogproc: ECoG signal processing in pure Rust
//!
//! `ecogproc` turns raw multichannel cortical recordings into the derived
//! signals a neuroscientist inspects: a cleaned, downsampled signal, narrow
//! band amplitude envelopes, a composite high-gamma trace, power spectra and
//! trial-averaged event-related potentials.
//!
//! ## Pipeline overview
//!
//! ```text
//! {subject}_B{block}.safetensors
//!   │
//!   ├─ io::load_store()           raw [C, T] + trials + electrode metadata
//!   ├─ reference                  CAR over contiguous channel groups (16)
//!   ├─ filter::notch              line noise + harmonics removed (60 Hz)
//!   ├─ resample                   FFT resampler → 400 Hz
//!   │     └─→ "preprocessed"      comment "CAR:16,Notch:60,Downsample:400"
//!   ├─ decompose                  Gaussian band kernels × Hilbert → |envelope|
//!   │     └─→ "decomposition"     [C·B, T]
//!   ├─ decompose::composite       mean of the selected high-gamma bands
//!   │     └─→ "high_gamma"        [C, T]
//!   ├─ periodogram (cached)       one-sided PSD of one channel
//!   └─ erp (cached)               trial mean ± sem around onsets / offsets
//! ```
//!
//! ## Quick start
//!
//! ```
//! use ecogproc::{preprocess, PreprocessConfig};
//! use ndarray::Array2;
//!
//! // 16 channels, 2 s at 3 kHz
//! let raw = Array2::from_shape_fn((16, 6000), |(c, t)| ((c + t) as f64 * 0.01).sin());
//! let out = preprocess(&raw, 3000.0, &PreprocessConfig::default()).unwrap();
//! assert_eq!(out.fs, 400.0);
//! assert_eq!(out.data.dim(), (16, 800));
//! assert_eq!(out.provenance.provenance(), "CAR:16,Notch:60,Downsample:400");
//! ```
//!
//! Long-running transforms are dispatched through [`job`], which reads one
//! interface of a [`ChannelStore`], computes, and writes exactly one output
//! interface back only when the whole computation succeeded.

pub mod bands;
pub mod config;
pub mod decompose;
pub mod epoch;
pub mod erp;
pub mod error;
pub mod filter;
pub mod grid;
pub mod io;
pub mod job;
pub mod periodogram;
pub mod reference;
pub mod resample;
pub mod stats;
pub mod store;

use std::collections::BTreeSet;

use log::{debug, info};
use ndarray::Array2;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use bands::{chang_lab, high_gamma_reference, Band, BandSpec, CompositeBandSelection};
pub use config::PreprocessConfig;
pub use decompose::{composite, decompose, BandPower};
pub use erp::{erp, scale_limits, Erp, ErpCache, ScaleLimits, TrialSet};
pub use error::{EcogError, Result};
pub use grid::{rotate, GridRotation};
pub use io::{block_path, load_store, save_store};
pub use job::{processing_data, run_job, spawn_job, Job, JobHandle, JobOutput, JobRequest};
pub use periodogram::{periodogram, Periodogram, PeriodogramCache};
pub use reference::common_average_reference;
pub use resample::resample;
pub use store::{Alignment, ChannelStore, Interface, MemoryStore};

/// Output of [`preprocess`].
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    /// `[C, T']`.
    pub data: Array2<f64>,
    /// Sampling rate of `data`.
    pub fs: f64,
    /// Settings that produced `data`; its [`provenance`](PreprocessConfig::provenance)
    /// string is stored with the output interface.
    pub provenance: PreprocessConfig,
}

/// Run **CAR → notch → downsample** on a raw `[C, T]` recording.
///
/// Disabled stages are skipped. With every stage disabled the output equals
/// the input and `fs` is unchanged.
///
/// # Errors
///
/// The configuration is validated against `raw` and `fs` before any sample is
/// touched: a CAR group of zero or larger than the channel count, a notch at
/// or above Nyquist, or a target rate that is non-positive or not below `fs`
/// all fail with [`EcogError::Configuration`].
pub fn preprocess(raw: &Array2<f64>, fs: f64, cfg: &PreprocessConfig) -> Result<Preprocessed> {
    preprocess_excluding(raw, fs, cfg, &BTreeSet::new())
}

/// [`preprocess`] with `bad` channels kept out of the CAR group means.
pub fn preprocess_excluding(
    raw: &Array2<f64>,
    fs: f64,
    cfg: &PreprocessConfig,
    bad: &BTreeSet<usize>,
) -> Result<Preprocessed> {
    let (n_ch, n_t) = raw.dim();
    cfg.validate(n_ch, fs)?;
    info!("preprocessing {n_ch} ch × {n_t} samples @ {fs} Hz ({})", cfg.provenance());

    let mut data = raw.clone();

    // 1. Common average reference.
    if let Some(group) = cfg.car {
        reference::common_average_reference_inplace(&mut data, group, bad);
        debug!("CAR over groups of {group}, {} bad channels excluded", bad.len());
    }

    // 2. Line-noise notch.
    if let Some(line) = cfg.notch {
        data = filter::notch(&data, fs, line);
        debug!("notch at {line} Hz and harmonics");
    }

    // 3. Downsample.
    let mut out_fs = fs;
    if let Some(target) = cfg.downsample {
        data = resample::resample(&data, fs, target)?;
        out_fs = target;
        debug!("resampled {fs} → {target} Hz, {} samples", data.ncols());
    }

    Ok(Preprocessed { data, fs: out_fs, provenance: *cfg })
}
