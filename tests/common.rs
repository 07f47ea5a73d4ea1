/// Shared synthetic-signal helpers.
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::path::PathBuf;

#[allow(unused)]
/// `[n_ch, n_t]` of `amp · sin(2π f t)` at `fs`, identical on every channel.
pub fn sines(n_ch: usize, n_t: usize, fs: f64, freq: f64, amp: f64) -> Array2<f64> {
    Array2::from_shape_fn((n_ch, n_t), |(_, t)| amp * (2.0 * PI * freq * t as f64 / fs).sin())
}

#[allow(unused)]
/// Uniform noise in `[-amp, amp)`, reproducible per `seed`.
pub fn noise(n_ch: usize, n_t: usize, amp: f64, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((n_ch, n_t), |_| rng.gen_range(-amp..amp))
}

#[allow(unused)]
/// Power of `x` at `freq` from a plain DFT projection.
pub fn tone_power(x: &Array1<f64>, fs: f64, freq: f64) -> f64 {
    let (mut re, mut im) = (0.0, 0.0);
    for (t, &v) in x.iter().enumerate() {
        let ph = 2.0 * PI * freq * t as f64 / fs;
        re += v * ph.cos();
        im += v * ph.sin();
    }
    (re * re + im * im) / (x.len() as f64).powi(2)
}

#[allow(unused)]
/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ecogproc-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
