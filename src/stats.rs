//! NaN-aware summary statistics.
//!
//! Missing samples (bad channels, epoch overflow past the recording) are
//! represented as `NaN` and skipped by everything here, the way
//! `numpy.nanmean` / `numpy.nanstd` (`ddof = 0`) treat them.
use ndarray::{Array1, ArrayView2, Axis};

/// Count, mean and population standard deviation of the non-NaN values.
///
/// Returns `(0, NaN, NaN)` when every value is missing.
pub fn nan_mean_std<I>(values: I) -> (usize, f64, f64)
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: Clone,
{
    let it = values.into_iter().filter(|v| !v.is_nan());
    let (n, sum) = it.clone().fold((0usize, 0.0_f64), |(n, s), v| (n + 1, s + v));
    if n == 0 {
        return (0, f64::NAN, f64::NAN);
    }
    let mean = sum / n as f64;
    let var = it.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    (n, mean, var.sqrt())
}

/// Mean of the non-NaN values, or `NaN` if there are none.
pub fn nan_mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (n, sum) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0usize, 0.0_f64), |(n, s), v| (n + 1, s + v));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// Column-wise NaN-aware mean of a `[rows, T]` view → `[T]`.
pub fn nan_mean_axis0(data: ArrayView2<f64>) -> Array1<f64> {
    data.axis_iter(Axis(1))
        .map(|col| nan_mean(col.iter().copied()))
        .collect()
}
