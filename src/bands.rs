//! Filter-bank tables.
//!
//! A [`BandSpec`] is an ordered list of `(center_hz, sigma_hz)` Gaussian
//! bands. Order is significant: it fixes the band axis of every
//! decomposition.
//!
//! The canonical table ([`chang_lab`]) has 40 log-spaced bands between
//! ~4 Hz and ~194 Hz, seven per octave:
//!
//! ```text
//! center[k] = 4.0749286538265 · 2^(k/7)        k = 0..40
//! sigma[k]  = 0.39 · √center[k] · √2
//! ```
//!
//! High gamma is the upper sub-table starting at index 29 (~72 Hz).
use serde::{Deserialize, Serialize};

use crate::error::{EcogError, Result};

const CHANG_LAB_MIN_HZ: f64 = 4.0749286538265;
const CHANG_LAB_BANDS_PER_OCTAVE: f64 = 7.0;
const CHANG_LAB_N_BANDS: usize = 40;

/// First index of the high-gamma sub-table within [`chang_lab`].
pub const HIGH_GAMMA_FIRST_BAND: usize = 29;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub center_hz: f64,
    pub sigma_hz: f64,
}

/// Ordered filter bank. Serialises as a 2×K table `[[centers…], [sigmas…]]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BandSpec {
    bands: Vec<Band>,
}

impl BandSpec {
    pub fn new(bands: Vec<Band>) -> Self {
        Self { bands }
    }

    /// Build from parallel center / sigma rows.
    pub fn from_table(centers: &[f64], sigmas: &[f64]) -> Result<Self> {
        if centers.len() != sigmas.len() {
            return Err(EcogError::config(
                "bands",
                format!("{} centers but {} sigmas", centers.len(), sigmas.len()),
            ));
        }
        Ok(Self {
            bands: centers
                .iter()
                .zip(sigmas)
                .map(|(&center_hz, &sigma_hz)| Band { center_hz, sigma_hz })
                .collect(),
        })
    }

    /// `[centers, sigmas]`.
    pub fn to_table(&self) -> [Vec<f64>; 2] {
        [
            self.bands.iter().map(|b| b.center_hz).collect(),
            self.bands.iter().map(|b| b.sigma_hz).collect(),
        ]
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Band> {
        self.bands.iter()
    }

    /// Check every band for a decomposition at sampling rate `fs`.
    ///
    /// Fails on an empty spec, a non-positive center or sigma, or a center
    /// above Nyquist, naming the offending band.
    pub fn validate(&self, fs: f64) -> Result<()> {
        if self.bands.is_empty() {
            return Err(EcogError::config("bands", "at least one band is required"));
        }
        let nyquist = fs / 2.0;
        for (i, b) in self.bands.iter().enumerate() {
            if !(b.center_hz > 0.0) || !(b.sigma_hz > 0.0) {
                return Err(EcogError::config(
                    format!("band {i}"),
                    format!(
                        "center {} Hz and sigma {} Hz must both be positive",
                        b.center_hz, b.sigma_hz
                    ),
                ));
            }
            if b.center_hz > nyquist {
                return Err(EcogError::config(
                    format!("band {i}"),
                    format!("center {} Hz exceeds Nyquist ({nyquist} Hz)", b.center_hz),
                ));
            }
        }
        Ok(())
    }
}

impl Serialize for BandSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_table().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BandSpec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let [centers, sigmas] = <[Vec<f64>; 2]>::deserialize(deserializer)?;
        BandSpec::from_table(&centers, &sigmas).map_err(serde::de::Error::custom)
    }
}

impl FromIterator<Band> for BandSpec {
    fn from_iter<I: IntoIterator<Item = Band>>(iter: I) -> Self {
        Self { bands: iter.into_iter().collect() }
    }
}

/// The canonical 40-band table.
pub fn chang_lab() -> BandSpec {
    (0..CHANG_LAB_N_BANDS)
        .map(|k| {
            let center_hz = CHANG_LAB_MIN_HZ * 2f64.powf(k as f64 / CHANG_LAB_BANDS_PER_OCTAVE);
            let sigma_hz = 0.39 * center_hz.sqrt() * std::f64::consts::SQRT_2;
            Band { center_hz, sigma_hz }
        })
        .collect()
}

/// The high-gamma reference sub-table (`chang_lab()[29..]`).
pub fn high_gamma_reference() -> BandSpec {
    chang_lab().bands[HIGH_GAMMA_FIRST_BAND..].iter().copied().collect()
}

/// Boolean mask over a reference [`BandSpec`] choosing which bands are
/// averaged into a composite trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeBandSelection {
    pub reference: BandSpec,
    pub mask: Vec<bool>,
}

impl Default for CompositeBandSelection {
    /// Every high-gamma band selected.
    fn default() -> Self {
        let reference = high_gamma_reference();
        let mask = vec![true; reference.len()];
        Self { reference, mask }
    }
}

impl CompositeBandSelection {
    pub fn new(reference: BandSpec, mask: Vec<bool>) -> Result<Self> {
        let sel = Self { reference, mask };
        sel.validate()?;
        Ok(sel)
    }

    /// Select from the high-gamma reference table by index.
    pub fn high_gamma(indices: &[usize]) -> Result<Self> {
        let reference = high_gamma_reference();
        let mut mask = vec![false; reference.len()];
        for &i in indices {
            *mask.get_mut(i).ok_or_else(|| {
                EcogError::config(
                    "band selection",
                    format!("index {i} outside the {}-band reference", reference.len()),
                )
            })? = true;
        }
        Self::new(reference, mask)
    }

    pub fn n_selected(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn validate(&self) -> Result<()> {
        if self.mask.len() != self.reference.len() {
            return Err(EcogError::config(
                "band selection",
                format!(
                    "mask has {} entries but the reference has {} bands",
                    self.mask.len(),
                    self.reference.len()
                ),
            ));
        }
        if self.n_selected() == 0 {
            return Err(EcogError::config("band selection", "no band selected"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chang_lab_has_forty_bands_up_to_194_hz() {
        let spec = chang_lab();
        assert_eq!(spec.len(), 40);
        approx::assert_abs_diff_eq!(spec.bands()[0].center_hz, 4.0749286538265, epsilon = 1e-12);
        let top = spec.bands()[39].center_hz;
        assert!(top > 190.0 && top < 200.0, "top band {top}");
        // Seven bands per octave.
        approx::assert_abs_diff_eq!(
            spec.bands()[7].center_hz / spec.bands()[0].center_hz,
            2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn high_gamma_starts_near_70_hz() {
        let hg = high_gamma_reference();
        assert_eq!(hg.len(), 11);
        let first = hg.bands()[0].center_hz;
        assert!(first > 70.0 && first < 75.0, "first hg band {first}");
    }

    #[test]
    fn validate_names_band_above_nyquist() {
        let spec = BandSpec::from_table(&[10.0, 250.0], &[2.0, 5.0]).unwrap();
        match spec.validate(400.0) {
            Err(EcogError::Configuration { parameter, .. }) => assert_eq!(parameter, "band 1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_non_positive_center_or_sigma() {
        for (centers, sigmas, bad) in [
            ([10.0, 0.0], [1.0, 1.0], "band 1"),
            ([-5.0, 20.0], [1.0, 1.0], "band 0"),
            ([10.0, 20.0], [1.0, 0.0], "band 1"),
            ([10.0, 20.0], [-1.0, 1.0], "band 0"),
            ([10.0, 20.0], [1.0, f64::NAN], "band 1"),
        ] {
            let spec = BandSpec::from_table(&centers, &sigmas).unwrap();
            match spec.validate(400.0) {
                Err(EcogError::Configuration { parameter, .. }) => assert_eq!(parameter, bad),
                other => panic!("{centers:?} / {sigmas:?}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn table_json_round_trip() {
        let spec: BandSpec = serde_json::from_str("[[10.0, 20.0], [1.0, 2.0]]").unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.bands()[1], Band { center_hz: 20.0, sigma_hz: 2.0 });
        assert_eq!(serde_json::to_string(&spec).unwrap(), "[[10.0,20.0],[1.0,2.0]]");
    }

    #[test]
    fn selection_needs_a_band() {
        let reference = high_gamma_reference();
        let n = reference.len();
        assert!(CompositeBandSelection::new(reference.clone(), vec![false; n]).is_err());
        assert!(CompositeBandSelection::new(reference, vec![true; n - 1]).is_err());
        assert!(CompositeBandSelection::high_gamma(&[20]).is_err());
        assert_eq!(CompositeBandSelection::high_gamma(&[0, 3]).unwrap().n_selected(), 2);
    }
}
