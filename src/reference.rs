//! Common average reference over contiguous channel groups.
//!
//! Channels are split into groups of `group_size` consecutive rows (the last
//! group may be short). Within a group, the across-channel mean at each time
//! point is subtracted from every channel:
//!
//! `data[c, t] -= nanmean(data[g0..g1, t])`   for `c` in `g0..g1`
//!
//! Channels listed in `exclude` (bad electrodes) are referenced like every
//! other channel but do not contribute to their group's mean. `NaN` samples
//! are skipped the same way and stay `NaN`.
use std::collections::BTreeSet;

use ndarray::{s, Array2, Axis};

use crate::stats::nan_mean_axis0;

pub fn common_average_reference(
    data: &Array2<f64>,
    group_size: usize,
    exclude: &BTreeSet<usize>,
) -> Array2<f64> {
    let mut out = data.clone();
    common_average_reference_inplace(&mut out, group_size, exclude);
    out
}

pub fn common_average_reference_inplace(
    data: &mut Array2<f64>,
    group_size: usize,
    exclude: &BTreeSet<usize>,
) {
    let n_ch = data.nrows();
    if group_size == 0 {
        return;
    }
    let mut start = 0;
    while start < n_ch {
        let stop = (start + group_size).min(n_ch);
        let good: Vec<usize> = (start..stop).filter(|c| !exclude.contains(c)).collect();
        if !good.is_empty() {
            let means = nan_mean_axis0(data.select(Axis(0), &good).view());
            for mut row in data.slice_mut(s![start..stop, ..]).rows_mut() {
                row -= &means;
            }
        }
        start = stop;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Axis};

    #[test]
    fn group_sums_are_zero_after_reference() {
        let data = Array2::from_shape_fn((8, 512), |(c, t)| ((c * 7 + t * 3) as f64).sin());
        let out = common_average_reference(&data, 4, &BTreeSet::new());
        for g in 0..2 {
            let sums = out.slice(s![g * 4..g * 4 + 4, ..]).sum_axis(Axis(0));
            for &v in sums.iter() {
                approx::assert_abs_diff_eq!(v, 0.0, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn groups_do_not_leak_into_each_other() {
        // Group 0 constant 2, group 1 constant 10: both go to zero independently.
        let data = Array2::from_shape_fn((6, 10), |(c, _)| if c < 4 { 2.0 } else { 10.0 });
        let out = common_average_reference(&data, 4, &BTreeSet::new());
        for &v in out.iter() {
            approx::assert_abs_diff_eq!(v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn short_last_group_uses_its_own_mean() {
        // 5 channels, groups of 4 → last group is channel 4 alone → zeroed.
        let data = Array2::from_shape_fn((5, 3), |(c, t)| (c * 3 + t) as f64);
        let out = common_average_reference(&data, 4, &BTreeSet::new());
        for t in 0..3 {
            approx::assert_abs_diff_eq!(out[[4, t]], 0.0, epsilon = 1e-12);
            // channel 0 minus mean of channels 0..4 at t: 0+t - (4.5+t) = -4.5
            approx::assert_abs_diff_eq!(out[[0, t]], -4.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn nan_samples_excluded_from_mean() {
        let mut data = Array2::from_shape_fn((3, 4), |(c, _)| (c + 1) as f64);
        data.row_mut(2).fill(f64::NAN);
        let out = common_average_reference(&data, 3, &BTreeSet::new());
        // mean of channels 0 and 1 = 1.5
        approx::assert_abs_diff_eq!(out[[0, 0]], -0.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(out[[1, 0]], 0.5, epsilon = 1e-12);
        assert!(out[[2, 0]].is_nan());
    }

    #[test]
    fn bad_channel_is_referenced_but_not_averaged() {
        let data = Array2::from_shape_fn((3, 4), |(c, _)| [1.0, 2.0, 100.0][c]);
        let bad: BTreeSet<usize> = [2].into();
        let out = common_average_reference(&data, 3, &bad);
        approx::assert_abs_diff_eq!(out[[0, 0]], -0.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(out[[2, 0]], 98.5, epsilon = 1e-12);
    }
}
