//! Channel store: the container every stage reads from and writes to.
//!
//! A store holds named *interfaces*, each a `[C, T]` block of samples at
//! one sampling rate plus a free-form provenance comment, together with
//! per-recording metadata (electrode locations, trial times, bad channels).
//!
//! [`ChannelStore`] is the read/write contract the pipeline relies on;
//! [`MemoryStore`] is the in-process implementation that
//! [`io`](crate::io) loads from and saves to disk.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::PreprocessConfig;
use crate::error::{EcogError, Result};

/// Interface written by raw acquisition.
pub const RAW: &str = "raw";
/// Interface written by the preprocessing job.
pub const PREPROCESSED: &str = "preprocessed";
/// Interface written by the decomposition job (`C · B` rows, channel-major).
pub const DECOMPOSITION: &str = "decomposition";
/// Interface written by the high-gamma job.
pub const HIGH_GAMMA: &str = "high_gamma";

/// Which trial boundary epochs are aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Onset,
    Offset,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Alignment::Onset => "onset",
            Alignment::Offset => "offset",
        })
    }
}

impl FromStr for Alignment {
    type Err = EcogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "onset" | "start_time" => Ok(Alignment::Onset),
            "offset" | "stop_time" => Ok(Alignment::Offset),
            other => Err(EcogError::config("alignment", format!("unknown alignment {other:?}"))),
        }
    }
}

/// One named block of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    /// `[C, T]`.
    pub data: Array2<f64>,
    /// Sampling rate in Hz.
    pub fs: f64,
    /// Provenance comment, e.g. the preprocessing settings.
    pub comment: String,
}

/// Read/write contract of the channel container.
pub trait ChannelStore {
    fn has_interface(&self, name: &str) -> bool;

    /// Borrow a whole interface.
    fn interface(&self, name: &str) -> Result<&Interface>;

    /// Sampling rate of an interface.
    fn sampling_rate(&self, name: &str) -> Result<f64> {
        Ok(self.interface(name)?.fs)
    }

    /// Copy of one channel of an interface.
    fn series(&self, name: &str, channel: usize) -> Result<Array1<f64>> {
        let iface = self.interface(name)?;
        let n_channels = iface.data.nrows();
        if channel >= n_channels {
            return Err(EcogError::ChannelIndex { channel, n_channels });
        }
        Ok(iface.data.row(channel).to_owned())
    }

    /// Number of recording electrodes.
    fn n_channels(&self) -> usize;

    /// Anatomical label of an electrode.
    fn electrode_location(&self, channel: usize) -> Result<&str>;

    /// Trial event times in seconds for the given boundary.
    fn trial_times(&self, alignment: Alignment) -> &[f64];

    fn bad_channels(&self) -> &BTreeSet<usize>;

    /// Insert (or replace) an interface. Implementations must make the new
    /// interface visible completely or not at all.
    fn put_interface(&mut self, name: &str, data: Array2<f64>, fs: f64, comment: String) -> Result<()>;
}

/// Settings of an existing `preprocessed` interface, if there is one.
///
/// Front ends call this before submitting a preprocessing job to offer
/// re-use instead of recomputation.
pub fn existing_preprocess<S: ChannelStore + ?Sized>(store: &S) -> Option<PreprocessConfig> {
    let iface = store.interface(PREPROCESSED).ok()?;
    PreprocessConfig::from_provenance(&iface.comment).ok()
}

/// In-memory [`ChannelStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    pub interfaces: BTreeMap<String, Interface>,
    pub locations: Vec<String>,
    pub onsets: Vec<f64>,
    pub offsets: Vec<f64>,
    pub bad: BTreeSet<usize>,
}

impl MemoryStore {
    /// Store holding a single `raw` interface; locations default to `"unknown"`.
    pub fn with_raw(data: Array2<f64>, fs: f64) -> Self {
        let n_ch = data.nrows();
        let mut interfaces = BTreeMap::new();
        interfaces.insert(RAW.to_string(), Interface { data, fs, comment: String::new() });
        Self { interfaces, locations: vec!["unknown".to_string(); n_ch], ..Self::default() }
    }

    pub fn set_trials(&mut self, onsets: Vec<f64>, offsets: Vec<f64>) {
        self.onsets = onsets;
        self.offsets = offsets;
    }
}

impl ChannelStore for MemoryStore {
    fn has_interface(&self, name: &str) -> bool {
        self.interfaces.contains_key(name)
    }

    fn interface(&self, name: &str) -> Result<&Interface> {
        self.interfaces
            .get(name)
            .ok_or_else(|| EcogError::Store(format!("no `{name}` interface in store")))
    }

    fn n_channels(&self) -> usize {
        self.locations.len().max(
            self.interfaces.get(RAW).map_or(0, |iface| iface.data.nrows()),
        )
    }

    fn electrode_location(&self, channel: usize) -> Result<&str> {
        self.locations
            .get(channel)
            .map(String::as_str)
            .ok_or(EcogError::ChannelIndex { channel, n_channels: self.locations.len() })
    }

    fn trial_times(&self, alignment: Alignment) -> &[f64] {
        match alignment {
            Alignment::Onset => &self.onsets,
            Alignment::Offset => &self.offsets,
        }
    }

    fn bad_channels(&self) -> &BTreeSet<usize> {
        &self.bad
    }

    fn put_interface(&mut self, name: &str, data: Array2<f64>, fs: f64, comment: String) -> Result<()> {
        if !(fs > 0.0) {
            return Err(EcogError::Store(format!("refusing `{name}` with sampling rate {fs}")));
        }
        self.interfaces.insert(name.to_string(), Interface { data, fs, comment });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_checks_channel_range() {
        let store = MemoryStore::with_raw(Array2::zeros((4, 10)), 100.0);
        assert_eq!(store.series(RAW, 3).unwrap().len(), 10);
        assert!(matches!(
            store.series(RAW, 4),
            Err(EcogError::ChannelIndex { channel: 4, n_channels: 4 })
        ));
        assert!(matches!(store.series("nope", 0), Err(EcogError::Store(_))));
    }

    #[test]
    fn existing_preprocess_reads_provenance() {
        let mut store = MemoryStore::with_raw(Array2::zeros((2, 10)), 100.0);
        assert_eq!(existing_preprocess(&store), None);
        let cfg = PreprocessConfig { car: Some(2), notch: None, downsample: Some(50.0) };
        store.put_interface(PREPROCESSED, Array2::zeros((2, 5)), 50.0, cfg.provenance()).unwrap();
        assert_eq!(existing_preprocess(&store), Some(cfg));
    }

    #[test]
    fn alignment_parses_both_spellings() {
        assert_eq!("onset".parse::<Alignment>().unwrap(), Alignment::Onset);
        assert_eq!("stop_time".parse::<Alignment>().unwrap(), Alignment::Offset);
        assert!("middle".parse::<Alignment>().is_err());
    }
}
