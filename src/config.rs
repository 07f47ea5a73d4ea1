//! Preprocessing configuration.
//!
//! [`PreprocessConfig`] holds the three optional preprocessing stages. Each
//! field set to `None` disables its stage, so an all-`None` config is the
//! identity transform.
//!
//! The same three fields are written as a provenance string next to every
//! preprocessed interface, letting a front end detect "already preprocessed
//! with these settings" and offer re-use:
//!
//! ```
//! use ecogproc::PreprocessConfig;
//!
//! let cfg = PreprocessConfig::default();
//! assert_eq!(cfg.provenance(), "CAR:16,Notch:60,Downsample:400");
//! assert_eq!(PreprocessConfig::from_provenance(&cfg.provenance()).unwrap(), cfg);
//! ```
use serde::{Deserialize, Serialize};

use crate::error::{EcogError, Result};

/// Configuration for [`preprocess`](crate::preprocess).
///
/// JSON field names follow the configuration surface used by front ends:
///
/// ```
/// use ecogproc::PreprocessConfig;
///
/// let cfg: PreprocessConfig =
///     serde_json::from_str(r#"{"CAR": 16, "Notch": null, "Downsample": 400}"#).unwrap();
/// assert_eq!(cfg.car, Some(16));
/// assert_eq!(cfg.notch, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Common-average-reference group size in channels.
    ///
    /// Channels are split into contiguous groups of this many channels (the
    /// last group may be short) and each group's mean is subtracted.
    ///
    /// Default: `Some(16)`.
    #[serde(rename = "CAR", default)]
    pub car: Option<usize>,

    /// Line-noise frequency in Hz. The fundamental and every harmonic below
    /// Nyquist are removed.
    ///
    /// Default: `Some(60.0)`.
    #[serde(rename = "Notch", default)]
    pub notch: Option<f64>,

    /// Target sampling rate in Hz. Must be below the source rate.
    ///
    /// Default: `Some(400.0)`.
    #[serde(rename = "Downsample", default)]
    pub downsample: Option<f64>,
}

impl Default for PreprocessConfig {
    /// CAR over 16-channel groups · 60 Hz notch · 400 Hz output.
    fn default() -> Self {
        Self { car: Some(16), notch: Some(60.0), downsample: Some(400.0) }
    }
}

impl PreprocessConfig {
    /// Every stage disabled.
    pub fn none() -> Self {
        Self { car: None, notch: None, downsample: None }
    }

    /// Check every parameter against the recording before any computation.
    pub fn validate(&self, n_channels: usize, fs: f64) -> Result<()> {
        if !(fs > 0.0) {
            return Err(EcogError::config("sampling rate", format!("must be positive, got {fs}")));
        }
        if let Some(g) = self.car {
            if g == 0 || g > n_channels {
                return Err(EcogError::config(
                    "CAR",
                    format!("group size {g} must be in 1..={n_channels}"),
                ));
            }
        }
        if let Some(f) = self.notch {
            if !(f > 0.0) {
                return Err(EcogError::config("Notch", format!("must be positive, got {f}")));
            }
            if f >= fs / 2.0 {
                return Err(EcogError::config(
                    "Notch",
                    format!("{f} Hz is not below Nyquist ({} Hz)", fs / 2.0),
                ));
            }
        }
        if let Some(r) = self.downsample {
            if !(r > 0.0) {
                return Err(EcogError::config("Downsample", format!("must be positive, got {r}")));
            }
            if r >= fs {
                return Err(EcogError::config(
                    "Downsample",
                    format!("target rate {r} Hz must be below source rate {fs} Hz"),
                ));
            }
        }
        Ok(())
    }

    /// Provenance string: `CAR:<g>,Notch:<f>,Downsample:<r>`, `None` for
    /// disabled stages.
    pub fn provenance(&self) -> String {
        fn field<T: std::fmt::Display>(v: Option<T>) -> String {
            v.map_or_else(|| "None".to_string(), |v| v.to_string())
        }
        format!(
            "CAR:{},Notch:{},Downsample:{}",
            field(self.car),
            field(self.notch),
            field(self.downsample)
        )
    }

    /// Parse a string written by [`provenance`](Self::provenance).
    pub fn from_provenance(s: &str) -> Result<Self> {
        let bad = |reason: String| EcogError::config("provenance", reason);
        let mut cfg = Self::none();
        let mut seen = 0;
        for part in s.split(',') {
            let (key, value) = part
                .split_once(':')
                .ok_or_else(|| bad(format!("expected `key:value`, got {part:?}")))?;
            let value = value.trim();
            let missing = value == "None" || value == "No";
            match key.trim() {
                "CAR" => {
                    cfg.car = if missing {
                        None
                    } else {
                        Some(value.parse().map_err(|_| bad(format!("CAR {value:?}")))?)
                    }
                }
                "Notch" => {
                    cfg.notch = if missing {
                        None
                    } else {
                        Some(value.parse().map_err(|_| bad(format!("Notch {value:?}")))?)
                    }
                }
                "Downsample" => {
                    cfg.downsample = if missing {
                        None
                    } else {
                        Some(value.parse().map_err(|_| bad(format!("Downsample {value:?}")))?)
                    }
                }
                other => return Err(bad(format!("unknown field {other:?}"))),
            }
            seen += 1;
        }
        if seen != 3 {
            return Err(bad(format!("expected 3 fields, got {seen}")));
        }
        Ok(cfg)
    }
}
