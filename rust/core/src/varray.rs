// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Variable width integer tables
//!
//! A [`Varray`] stores rows of differing length in two flat buffers: `data`
//! holds all rows back to back and `ind` holds the `nrows + 1` row offsets.
//! Row `i` is `data[ind[i]..ind[i + 1]]`, so row access is O(1) and the whole
//! table costs two allocations regardless of the number of rows.
//!
//! Tables are typically element connectivity lists (nodes per element) or
//! their inverse (elements per node).

use std::collections::BTreeMap;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::inverse::{inverse_index, IndexTable};

/// Value used for absent entries in padded 2D tables
pub const PAD: i64 = -1;

/// Row selection for [`Varray::select`]
#[derive(Debug, Clone, Copy)]
pub enum RowSelector<'a> {
    /// Explicit row numbers, any order, repeats allowed
    Indices(&'a [usize]),
    /// One flag per row
    Mask(&'a [bool]),
}

/// Selection of entries in the flattened `data` buffer
#[derive(Debug, Clone, Copy)]
pub enum FlatSelector<'a> {
    /// Every entry
    All,
    /// Explicit flat positions
    Positions(&'a [usize]),
    /// One flag per entry of `data`
    Mask(&'a [bool]),
}

/// Variable width 2D table of non-negative integers
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Varray {
    data: Vec<usize>,
    ind: Vec<usize>,
    width: usize,
}

impl Default for Varray {
    fn default() -> Self {
        Self::new()
    }
}

impl Varray {
    /// Create an empty table with no rows
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            ind: vec![0],
            width: 0,
        }
    }

    /// Build from offsets already known to be valid
    pub(crate) fn from_parts(data: Vec<usize>, ind: Vec<usize>) -> Self {
        let width = ind.windows(2).map(|w| w[1] - w[0]).max().unwrap_or(0);
        Self { data, ind, width }
    }

    /// Create a table from a list of rows
    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = usize>,
    {
        let mut data = Vec::new();
        let mut ind = vec![0];
        for row in rows {
            data.extend(row);
            ind.push(data.len());
        }
        Self::from_parts(data, ind)
    }

    /// Create a table from a rectangular padded table.
    ///
    /// Negative entries mark absent values and are dropped, wherever they
    /// occur in the row.
    pub fn from_padded(rows: &[Vec<i64>]) -> Result<Self> {
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
            return Err(Error::InvalidData(format!(
                "padded table is not rectangular: row {} has {} columns, expected {}",
                i,
                row.len(),
                ncols
            )));
        }
        Ok(Self::from_rows(rows.iter().map(|row| {
            row.iter().filter(|&&v| v >= 0).map(|&v| v as usize)
        })))
    }

    /// Create a table from a flat data buffer and row offsets.
    ///
    /// `ind` holds the start offset of every row and may include the final
    /// `data.len()`; it is appended when missing. Offsets must start at 0 and
    /// be non-decreasing.
    pub fn from_flat(data: Vec<usize>, mut ind: Vec<usize>) -> Result<Self> {
        match ind.first() {
            None if data.is_empty() => return Ok(Self::new()),
            None => {
                return Err(Error::InvalidData(
                    "row offsets are empty but data is not".to_string(),
                ))
            }
            Some(&first) if first != 0 => {
                return Err(Error::InvalidData(format!(
                    "first row offset must be 0, got {}",
                    first
                )))
            }
            Some(_) => {}
        }
        if let Some(pos) = ind.windows(2).position(|w| w[1] < w[0]) {
            return Err(Error::InvalidData(format!(
                "row offsets decrease at position {}: {} > {}",
                pos + 1,
                ind[pos],
                ind[pos + 1]
            )));
        }
        let last = ind[ind.len() - 1];
        if last > data.len() {
            return Err(Error::InvalidData(format!(
                "row offset {} exceeds data length {}",
                last,
                data.len()
            )));
        }
        if last < data.len() {
            ind.push(data.len());
        }
        Ok(Self::from_parts(data, ind))
    }

    /// Decode a buffer where every row is preceded by its length
    pub fn from_length_prefixed(buf: &[usize]) -> Result<Self> {
        let mut data = Vec::with_capacity(buf.len());
        let mut ind = vec![0];
        let mut pos = 0;
        while pos < buf.len() {
            let len = buf[pos];
            let start = pos + 1;
            let end = start
                .checked_add(len)
                .filter(|&end| end <= buf.len())
                .ok_or_else(|| {
                    Error::InvalidData(format!(
                        "row length {} at position {} overruns buffer of length {}",
                        len,
                        pos,
                        buf.len()
                    ))
                })?;
            data.extend_from_slice(&buf[start..end]);
            ind.push(data.len());
            pos = end;
        }
        Ok(Self::from_parts(data, ind))
    }

    /// Number of rows
    #[inline]
    pub fn nrows(&self) -> usize {
        self.ind.len() - 1
    }

    /// Length of the longest row
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of entries
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// `(nrows, width)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.width)
    }

    /// Check whether the table has no rows
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nrows() == 0
    }

    /// Flat data buffer
    #[inline]
    pub fn data(&self) -> &[usize] {
        &self.data
    }

    /// Row offsets, `nrows + 1` entries
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.ind
    }

    /// Length of every row
    pub fn lengths(&self) -> Vec<usize> {
        self.ind.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Length of row `i`
    ///
    /// # Panics
    ///
    /// Panics if `i >= nrows`.
    #[inline]
    pub fn length(&self, i: usize) -> usize {
        self.ind[i + 1] - self.ind[i]
    }

    fn resolve_row(&self, i: isize) -> Option<usize> {
        let n = self.nrows() as isize;
        let i = if i < 0 { i + n } else { i };
        (0..n).contains(&i).then_some(i as usize)
    }

    /// Row `i`, counting from the end when negative
    pub fn get(&self, i: isize) -> Option<&[usize]> {
        self.resolve_row(i)
            .map(|i| &self.data[self.ind[i]..self.ind[i + 1]])
    }

    /// Row `i`, counting from the end when negative
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range, like slice indexing.
    pub fn row(&self, i: isize) -> &[usize] {
        match self.get(i) {
            Some(row) => row,
            None => panic!("row index {} out of range for {} rows", i, self.nrows()),
        }
    }

    /// Column `j` of every row, [`PAD`] where a row is too short.
    ///
    /// A negative `j` counts from the end of each row.
    pub fn col(&self, j: isize) -> Vec<i64> {
        self.iter()
            .map(|row| {
                let k = if j < 0 { j + row.len() as isize } else { j };
                usize::try_from(k)
                    .ok()
                    .and_then(|k| row.get(k))
                    .map_or(PAD, |&v| v as i64)
            })
            .collect()
    }

    /// Rows in the given order
    pub fn take(&self, rows: &[usize]) -> Result<Self> {
        let nrows = self.nrows();
        if let Some(&row) = rows.iter().find(|&&r| r >= nrows) {
            return Err(Error::RowOutOfBounds { row, nrows });
        }
        Ok(Self::from_rows(rows.iter().map(|&i| self[i].iter().copied())))
    }

    /// Select rows by index list or boolean mask
    pub fn select(&self, selector: RowSelector<'_>) -> Result<Self> {
        match selector {
            RowSelector::Indices(rows) => self.take(rows),
            RowSelector::Mask(mask) => {
                if mask.len() != self.nrows() {
                    return Err(Error::InvalidSelector {
                        expected: self.nrows(),
                        got: mask.len(),
                    });
                }
                Ok(Self::from_rows(
                    self.iter()
                        .zip(mask)
                        .filter(|(_, &keep)| keep)
                        .map(|(row, _)| row.iter().copied()),
                ))
            }
        }
    }

    /// Iterate over the rows
    pub fn iter(&self) -> Rows<'_> {
        Rows {
            varray: self,
            front: 0,
            back: self.nrows(),
        }
    }

    /// Flat positions in `data` of the selected entries
    pub fn index(&self, selector: FlatSelector<'_>) -> Result<Vec<usize>> {
        let size = self.size();
        match selector {
            FlatSelector::All => Ok((0..size).collect()),
            FlatSelector::Positions(pos) => match pos.iter().find(|&&p| p >= size) {
                Some(&p) => Err(Error::InvalidData(format!(
                    "flat position {} out of range for {} entries",
                    p, size
                ))),
                None => Ok(pos.to_vec()),
            },
            FlatSelector::Mask(mask) => {
                if mask.len() != size {
                    return Err(Error::InvalidSelector {
                        expected: size,
                        got: mask.len(),
                    });
                }
                Ok(mask
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &keep)| keep.then_some(i))
                    .collect())
            }
        }
    }

    /// Row containing flat position `pos`
    #[inline]
    fn row_of(&self, pos: usize) -> usize {
        // last row whose start is <= pos; empty rows share a start with the next
        self.ind.partition_point(|&start| start <= pos) - 1
    }

    /// Row number of each selected entry
    pub fn rowindex(&self, selector: FlatSelector<'_>) -> Result<Vec<usize>> {
        Ok(self
            .index(selector)?
            .into_iter()
            .map(|p| self.row_of(p))
            .collect())
    }

    /// Column number of each selected entry
    pub fn colindex(&self, selector: FlatSelector<'_>) -> Result<Vec<usize>> {
        Ok(self
            .index(selector)?
            .into_iter()
            .map(|p| p - self.ind[self.row_of(p)])
            .collect())
    }

    /// `(row, column)` of each selected entry
    pub fn where_(&self, selector: FlatSelector<'_>) -> Result<Vec<(usize, usize)>> {
        Ok(self
            .index(selector)?
            .into_iter()
            .map(|p| {
                let r = self.row_of(p);
                (r, p - self.ind[r])
            })
            .collect())
    }

    /// Flat position of entry `(i, j)`
    pub fn index1d(&self, i: usize, j: usize) -> Result<usize> {
        if i >= self.nrows() || j >= self.length(i) {
            return Err(Error::IndexOutOfBounds { row: i, col: j });
        }
        Ok(self.ind[i] + j)
    }

    /// Copy with every row sorted ascending
    pub fn sorted(&self) -> Self {
        let mut out = self.clone();
        out.sort();
        out
    }

    /// Sort every row ascending, in place
    pub fn sort(&mut self) {
        for w in self.ind.windows(2) {
            self.data[w[0]..w[1]].sort_unstable();
        }
    }

    /// Padded 2D table of shape `(nrows, width)`.
    ///
    /// Rows are right aligned: short rows are filled with [`PAD`] on the left.
    pub fn to_array(&self) -> Vec<Vec<i64>> {
        self.iter()
            .map(|row| {
                let mut out = vec![PAD; self.width - row.len()];
                out.extend(row.iter().map(|&v| v as i64));
                out
            })
            .collect()
    }

    /// Sorted distinct row lengths and the rows having each length
    pub fn same_length(&self) -> (Vec<usize>, Vec<Vec<usize>>) {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, len) in self.lengths().into_iter().enumerate() {
            groups.entry(len).or_default().push(i);
        }
        groups.into_iter().unzip()
    }

    /// One dense block per distinct row length, in ascending length order
    pub fn split(&self) -> Vec<Vec<Vec<usize>>> {
        let (_, groups) = self.same_length();
        groups
            .into_iter()
            .map(|rows| rows.into_iter().map(|i| self[i].to_vec()).collect())
            .collect()
    }

    /// Rows as nested vectors
    pub fn to_list(&self) -> Vec<Vec<usize>> {
        self.iter().map(<[usize]>::to_vec).collect()
    }

    /// Inverse index: for every value, the rows containing it
    pub fn inverse(&self) -> Self {
        inverse_index(IndexTable::Varray(self), true)
    }

    /// Equality up to the order of entries within each row
    pub fn row_set_eq(&self, other: &Self) -> bool {
        self.nrows() == other.nrows() && self.sorted() == other.sorted()
    }
}

impl Index<usize> for Varray {
    type Output = [usize];

    #[inline]
    fn index(&self, i: usize) -> &[usize] {
        &self.data[self.ind[i]..self.ind[i + 1]]
    }
}

impl<R: IntoIterator<Item = usize>> FromIterator<R> for Varray {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self::from_rows(iter)
    }
}

impl From<Vec<Vec<usize>>> for Varray {
    fn from(rows: Vec<Vec<usize>>) -> Self {
        Self::from_rows(rows)
    }
}

impl<'a> IntoIterator for &'a Varray {
    type Item = &'a [usize];
    type IntoIter = Rows<'a>;

    fn into_iter(self) -> Rows<'a> {
        self.iter()
    }
}

impl fmt::Display for Varray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Varray ({},{})", self.nrows(), self.width)?;
        for row in self {
            write!(f, "  [")?;
            for (k, v) in row.iter().enumerate() {
                if k > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", v)?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

/// Row iterator over a [`Varray`]
///
/// Each call to [`Varray::iter`] starts a fresh traversal.
#[derive(Debug, Clone)]
pub struct Rows<'a> {
    varray: &'a Varray,
    front: usize,
    back: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = &'a [usize];

    fn next(&mut self) -> Option<&'a [usize]> {
        if self.front >= self.back {
            return None;
        }
        let row = &self.varray[self.front];
        self.front += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<'a> DoubleEndedIterator for Rows<'a> {
    fn next_back(&mut self) -> Option<&'a [usize]> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(&self.varray[self.back])
    }
}

impl ExactSizeIterator for Rows<'_> {}

impl FusedIterator for Rows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Varray {
        Varray::from_rows(vec![vec![0], vec![1, 2], vec![0, 2, 4], vec![0, 2]])
    }

    #[test]
    fn test_shape_and_padding() {
        let va = sample();
        assert_eq!(va.nrows(), 4);
        assert_eq!(va.width(), 3);
        assert_eq!(va.size(), 8);
        assert_eq!(va.shape(), (4, 3));
        assert_eq!(
            va.to_array(),
            vec![
                vec![-1, -1, 0],
                vec![-1, 1, 2],
                vec![0, 2, 4],
                vec![-1, 0, 2],
            ]
        );
    }

    #[test]
    fn test_constructors_agree() {
        let va = sample();
        let flat = Varray::from_flat(vec![0, 1, 2, 0, 2, 4, 0, 2], vec![0, 1, 3, 6]).unwrap();
        let flat_full =
            Varray::from_flat(vec![0, 1, 2, 0, 2, 4, 0, 2], vec![0, 1, 3, 6, 8]).unwrap();
        let prefixed =
            Varray::from_length_prefixed(&[1, 0, 2, 1, 2, 3, 0, 2, 4, 2, 0, 2]).unwrap();
        let padded = Varray::from_padded(&va.to_array()).unwrap();
        assert_eq!(flat, va);
        assert_eq!(flat_full, va);
        assert_eq!(prefixed, va);
        assert_eq!(padded, va);
        assert_eq!(va.clone(), va);
    }

    #[test]
    fn test_from_flat_rejects_bad_offsets() {
        assert!(Varray::from_flat(vec![1, 2], vec![1, 2]).is_err());
        assert!(Varray::from_flat(vec![1, 2, 3], vec![0, 2, 1]).is_err());
        assert!(Varray::from_flat(vec![1, 2], vec![0, 3]).is_err());
        assert!(Varray::from_flat(vec![1], vec![]).is_err());
        assert!(Varray::from_flat(vec![], vec![]).unwrap().is_empty());
    }

    #[test]
    fn test_length_prefixed_overrun() {
        let err = Varray::from_length_prefixed(&[2, 0, 1, 3, 5]).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_padded_not_rectangular() {
        let rows = vec![vec![0, 1], vec![2]];
        assert!(Varray::from_padded(&rows).is_err());
    }

    #[test]
    fn test_padded_drops_negatives_anywhere() {
        let va = Varray::from_padded(&[vec![3, -1, 4], vec![-1, -1, -1]]).unwrap();
        assert_eq!(va.to_list(), vec![vec![3, 4], vec![]]);
        assert_eq!(va.width(), 2);
    }

    #[test]
    fn test_rows_and_cols() {
        let va = sample();
        assert_eq!(va.row(2), &[0, 2, 4]);
        assert_eq!(va.row(-1), &[0, 2]);
        assert_eq!(va.get(4), None);
        assert_eq!(va.get(-5), None);
        assert_eq!(va.col(0), vec![0, 1, 0, 0]);
        assert_eq!(va.col(2), vec![-1, -1, 4, -1]);
        assert_eq!(va.col(-1), vec![0, 2, 4, 2]);
        assert_eq!(va.col(-3), vec![-1, -1, 0, -1]);
        for (i, row) in va.iter().enumerate() {
            assert_eq!(row.len(), va.length(i));
        }
    }

    #[test]
    fn test_select() {
        let va = sample();
        let picked = va.select(RowSelector::Indices(&[3, 1, 1])).unwrap();
        assert_eq!(picked.to_list(), vec![vec![0, 2], vec![1, 2], vec![1, 2]]);
        let masked = va
            .select(RowSelector::Mask(&[true, false, true, false]))
            .unwrap();
        assert_eq!(masked.to_list(), vec![vec![0], vec![0, 2, 4]]);
        assert!(va.select(RowSelector::Mask(&[true])).is_err());
        assert_eq!(
            va.take(&[7]).unwrap_err(),
            Error::RowOutOfBounds { row: 7, nrows: 4 }
        );
    }

    #[test]
    fn test_flat_positions() {
        let va = sample();
        let mask: Vec<bool> = va.data().iter().map(|&v| v == 2).collect();
        let sel = FlatSelector::Mask(&mask);
        assert_eq!(va.index(sel).unwrap(), vec![2, 4, 7]);
        assert_eq!(va.rowindex(sel).unwrap(), vec![1, 2, 3]);
        assert_eq!(va.colindex(sel).unwrap(), vec![1, 1, 1]);
        assert_eq!(va.where_(sel).unwrap(), vec![(1, 1), (2, 1), (3, 1)]);
        assert_eq!(va.index1d(2, 2).unwrap(), 5);
        assert!(va.index1d(0, 1).is_err());
        assert!(va.index1d(4, 0).is_err());
    }

    #[test]
    fn test_rowindex_with_empty_rows() {
        let va = Varray::from_rows(vec![vec![], vec![5], vec![], vec![6, 7]]);
        assert_eq!(va.rowindex(FlatSelector::All).unwrap(), vec![1, 3, 3]);
        assert_eq!(va.colindex(FlatSelector::All).unwrap(), vec![0, 0, 1]);
    }

    #[test]
    fn test_sort() {
        let mut va = Varray::from_rows(vec![vec![3, 1, 2], vec![], vec![9, 0]]);
        let sorted = va.sorted();
        va.sort();
        assert_eq!(va, sorted);
        assert_eq!(va.to_list(), vec![vec![1, 2, 3], vec![], vec![0, 9]]);
        assert_eq!(va.sorted(), va);
    }

    #[test]
    fn test_same_length_and_split() {
        let va = sample();
        let (lens, groups) = va.same_length();
        assert_eq!(lens, vec![1, 2, 3]);
        assert_eq!(groups, vec![vec![0], vec![1, 3], vec![2]]);
        let blocks = va.split();
        assert_eq!(blocks[1], vec![vec![1, 2], vec![0, 2]]);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let va = sample();
        let first: Vec<_> = va.iter().collect();
        let second: Vec<_> = va.iter().collect();
        assert_eq!(first, second);
        assert_eq!(va.iter().len(), 4);
        assert_eq!(va.iter().next_back(), Some(&[0usize, 2][..]));
    }

    #[test]
    fn test_display() {
        let va = Varray::from_rows(vec![vec![0], vec![1, 2]]);
        assert_eq!(va.to_string(), "Varray (2,2)\n  [0]\n  [1 2]\n");
    }

    #[test]
    fn test_empty() {
        let va = Varray::new();
        assert_eq!(va.shape(), (0, 0));
        assert!(va.to_array().is_empty());
        assert_eq!(va, Varray::default());
    }
}
