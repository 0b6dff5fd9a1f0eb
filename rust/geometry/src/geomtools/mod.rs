// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batched geometric predicates
//!
//! Most functions take two batches of primitives and a [`Mode`]:
//!
//! - [`Mode::All`] evaluates every combination and returns an
//!   `(n1, n2)` [`Grid`]
//! - [`Mode::Pair`] evaluates matching items and returns an `(n, 1)` grid;
//!   a batch of length 1 is broadcast against the other one
//!
//! Degenerate input (parallel lines, zero normals, collapsed triangles)
//! produces NaN or infinite values rather than errors.

use std::ops::Index;

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::error::{Error, Result};

pub mod bary;
pub mod circles;
pub mod lines;
pub mod measures;
pub mod projection;
pub mod vectors;

pub use bary::*;
pub use circles::*;
pub use lines::*;
pub use measures::*;
pub use projection::*;
pub use vectors::*;

/// Grid size above which evaluation is spread over the rayon pool
const PARALLEL_THRESHOLD: usize = 16_384;

/// How two batches are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Every item of the first batch with every item of the second
    #[default]
    All,
    /// Items with the same index, length-1 batches broadcast
    Pair,
}

/// Unit for returned angles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    /// Convert an angle in radians to this unit
    #[inline]
    pub fn from_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Degrees => angle.to_degrees(),
            AngleUnit::Radians => angle,
        }
    }
}

/// Infinite line `point + t * dir`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub point: Point3<f64>,
    /// Direction vector, not necessarily of unit length
    pub dir: Vector3<f64>,
}

impl Line {
    pub fn new(point: Point3<f64>, dir: Vector3<f64>) -> Self {
        Self { point, dir }
    }

    /// Line through `a` (at t=0) and `b` (at t=1)
    pub fn through(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self { point: a, dir: b - a }
    }

    /// Point at parameter `t`
    #[inline]
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.point + self.dir * t
    }
}

/// Row-major 2D result of a batched evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> Grid<T> {
    pub(crate) fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(rows * cols, data.len());
        Self { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        if i < self.rows && j < self.cols {
            self.data.get(i * self.cols + j)
        } else {
            None
        }
    }

    /// Row `i` as a slice
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// All values in row-major order
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// `(row, col, value)` for every cell
    pub fn indexed(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let cols = self.cols.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(k, v)| (k / cols, k % cols, v))
    }

    /// Apply `f` to every cell
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.data[i * self.cols + j]
    }
}

/// Length of a pairwise evaluation of batches of length `na` and `nb`
pub(crate) fn pair_len(na: usize, nb: usize) -> Result<usize> {
    match (na, nb) {
        (a, b) if a == b => Ok(a),
        (1, b) => Ok(b),
        (a, 1) => Ok(a),
        (a, b) => Err(Error::ShapeMismatch(format!(
            "cannot pair batches of length {} and {}",
            a, b
        ))),
    }
}

/// Common length of several pairwise batches, broadcasting length 1
pub(crate) fn pair_len_many(lens: &[usize]) -> Result<usize> {
    lens.iter().try_fold(1, |n, &len| pair_len(n, len))
}

/// Index into a batch that may be broadcast
#[inline]
pub(crate) fn bcast(len: usize, k: usize) -> usize {
    if len == 1 {
        0
    } else {
        k
    }
}

/// Evaluate `f(i, j)` over the index combinations selected by `mode`
pub(crate) fn grid_map<T, F>(mode: Mode, na: usize, nb: usize, f: F) -> Result<Grid<T>>
where
    T: Send,
    F: Fn(usize, usize) -> T + Sync + Send,
{
    match mode {
        Mode::All => {
            let n = na * nb;
            let data: Vec<T> = if n >= PARALLEL_THRESHOLD {
                (0..n).into_par_iter().map(|k| f(k / nb, k % nb)).collect()
            } else {
                (0..n).map(|k| f(k / nb, k % nb)).collect()
            };
            Ok(Grid::from_vec(na, nb, data))
        }
        Mode::Pair => {
            let n = pair_len(na, nb)?;
            let data: Vec<T> = (0..n).map(|k| f(bcast(na, k), bcast(nb, k))).collect();
            Ok(Grid::from_vec(n, 1, data))
        }
    }
}
