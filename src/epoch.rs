//! Event-locked epoching.
//!
//! Cuts a fixed-width window around every event of a continuous series:
//!
//! ```text
//! half  = round(width_s · fs / 2)
//! idx   = round(t · fs)
//! epoch = series[idx − half .. idx + half]        (2·half samples)
//! ```
//!
//! Samples that fall before the start or past the end of the series are
//! `NaN` so averaging can skip them.
use ndarray::{Array2, ArrayView1};

use crate::error::{EcogError, Result};

/// Longest epoch, in samples, a single event may span.
pub const MAX_EPOCH_SAMPLES: usize = 1 << 26;

/// Samples on each side of the event for an epoch `width_s` seconds wide.
pub fn half_width_samples(width_s: f64, fs: f64) -> usize {
    let half = (width_s * fs / 2.0).round();
    if half > 0.0 { half as usize } else { 0 }
}

/// `[n_events, 2·half]` epochs of `series`, `NaN` where out of range.
///
/// Fails when `2·half` exceeds [`MAX_EPOCH_SAMPLES`].
pub fn event_epochs(
    series: ArrayView1<f64>,
    fs: f64,
    events: &[f64],
    half: usize,
) -> Result<Array2<f64>> {
    let width = half
        .checked_mul(2)
        .filter(|&w| w <= MAX_EPOCH_SAMPLES)
        .ok_or_else(|| {
            EcogError::config(
                "epoch width",
                format!("{half} samples per side exceeds {MAX_EPOCH_SAMPLES} per epoch"),
            )
        })?;
    let half = half as i64;
    let n = series.len() as i64;
    let starts: Vec<i64> = events
        .iter()
        .map(|&t| ((t * fs).round() as i64).saturating_sub(half))
        .collect();
    Ok(Array2::from_shape_fn((events.len(), width), |(tr, k)| {
        let i = starts[tr].saturating_add(k as i64);
        if (0..n).contains(&i) { series[i as usize] } else { f64::NAN }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn width_rounds_to_even_sample_count() {
        assert_eq!(half_width_samples(2.0, 400.0), 400);
        assert_eq!(half_width_samples(0.01, 150.0), 1); // 0.75 → 1
        assert_eq!(half_width_samples(0.0, 400.0), 0);
    }

    #[test]
    fn epochs_are_centered_on_events() {
        let x = Array1::from_shape_fn(100, |i| i as f64);
        let ep = event_epochs(x.view(), 10.0, &[5.0], 3).unwrap();
        // event at sample 50 → samples 47..53
        assert_eq!(ep.row(0).to_vec(), vec![47.0, 48.0, 49.0, 50.0, 51.0, 52.0]);
    }

    #[test]
    fn overflow_is_nan() {
        let x = Array1::from_shape_fn(10, |i| i as f64);
        let ep = event_epochs(x.view(), 1.0, &[1.0, 9.0], 2).unwrap();
        assert!(ep[[0, 0]].is_nan());
        assert_eq!(ep[[0, 1]], 0.0);
        assert_eq!(ep[[1, 2]], 9.0);
        assert!(ep[[1, 3]].is_nan());
    }

    #[test]
    fn oversized_or_far_epochs_do_not_overflow() {
        let x = Array1::from_shape_fn(10, |i| i as f64);
        assert_eq!(half_width_samples(1e300, 400.0), usize::MAX);
        assert!(matches!(
            event_epochs(x.view(), 1.0, &[1.0], usize::MAX),
            Err(EcogError::Configuration { .. })
        ));
        assert!(event_epochs(x.view(), 1.0, &[1.0], MAX_EPOCH_SAMPLES / 2 + 1).is_err());
        let ep = event_epochs(x.view(), 1.0, &[-1e300, 1e300], 2).unwrap();
        assert!(ep.iter().all(|v| v.is_nan()));
    }
}
