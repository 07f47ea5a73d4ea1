//! Channel-grid index algebra.
//!
//! An electrode grid is described by a display order: a permutation of
//! `0..N` (`N` a perfect square) read as a row-major `√N × √N` matrix.
//! Entry `order[i]` is the channel shown in cell `i`. Rotating or
//! transposing the grid is a matrix operation on that reading, flattened
//! back row-major.
//!
//! ```
//! use ecogproc::grid::{rotate, GridRotation};
//!
//! // 0 1      2 0
//! // 2 3  →   3 1
//! assert_eq!(rotate(&[0, 1, 2, 3], GridRotation::Clockwise).unwrap(), vec![2, 0, 3, 1]);
//! ```
use std::collections::BTreeSet;

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{EcogError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridRotation {
    /// 90° clockwise.
    Clockwise,
    /// 90° counter-clockwise.
    CounterClockwise,
    Transpose,
}

/// Side length of a square grid of `n` cells.
pub fn grid_side(n: usize) -> Result<usize> {
    let side = (n as f64).sqrt().round() as usize;
    if side * side != n {
        return Err(EcogError::config("grid order", format!("length {n} is not a perfect square")));
    }
    Ok(side)
}

/// Identity order `0..n` for an `n`-channel grid.
pub fn identity_order(n: usize) -> Result<Vec<usize>> {
    grid_side(n)?;
    Ok((0..n).collect())
}

/// Rotate or transpose a square display order.
pub fn rotate(order: &[usize], rotation: GridRotation) -> Result<Vec<usize>> {
    let side = grid_side(order.len())?;
    let grid = Array2::from_shape_fn((side, side), |(r, c)| order[r * side + c]);
    let out = match rotation {
        // out[i][j] = grid[side-1-j][i]
        GridRotation::Clockwise => grid.slice(s![..;-1, ..]).reversed_axes().to_owned(),
        // out[i][j] = grid[j][side-1-i]
        GridRotation::CounterClockwise => grid.slice(s![.., ..;-1]).reversed_axes().to_owned(),
        GridRotation::Transpose => grid.reversed_axes(),
    };
    Ok(out.iter().copied().collect())
}

/// `(row, col)` of display cell `index` in a grid `n_cols` wide.
pub fn grid_cell(index: usize, n_cols: usize) -> (usize, usize) {
    (index / n_cols, index % n_cols)
}

/// Channels of `order` whose electrode location is not among `chosen`,
/// in display order. Front ends draw these dimmed.
pub fn dimmed_channels<S: AsRef<str>>(
    order: &[usize],
    locations: &[S],
    chosen: &BTreeSet<String>,
) -> Result<Vec<usize>> {
    order
        .iter()
        .filter_map(|&ch| match locations.get(ch) {
            Some(loc) if chosen.contains(loc.as_ref()) => None,
            Some(_) => Some(Ok(ch)),
            None => Some(Err(EcogError::ChannelIndex { channel: ch, n_channels: locations.len() })),
        })
        .collect()
}
