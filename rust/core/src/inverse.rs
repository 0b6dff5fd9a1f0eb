// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inverse index of a connectivity table
//!
//! Turns a row → values table (element → nodes) into a value → rows table
//! (node → elements). Values that never occur below the maximum get an empty
//! row; repeated values within a row are kept as repeated entries.

use crate::varray::Varray;

/// Input accepted by [`inverse_index`]
#[derive(Debug, Clone, Copy)]
pub enum IndexTable<'a> {
    /// A variable width table
    Varray(&'a Varray),
    /// A rectangular table where negative entries are ignored
    Padded(&'a [Vec<i64>]),
}

impl<'a> From<&'a Varray> for IndexTable<'a> {
    fn from(va: &'a Varray) -> Self {
        IndexTable::Varray(va)
    }
}

impl<'a> From<&'a [Vec<i64>]> for IndexTable<'a> {
    fn from(rows: &'a [Vec<i64>]) -> Self {
        IndexTable::Padded(rows)
    }
}

impl<'a> From<&'a Vec<Vec<i64>>> for IndexTable<'a> {
    fn from(rows: &'a Vec<Vec<i64>>) -> Self {
        IndexTable::Padded(rows.as_slice())
    }
}

/// `(value, row)` pairs in row-major order, negatives skipped
fn value_row_pairs(table: IndexTable<'_>) -> Vec<(usize, usize)> {
    match table {
        IndexTable::Varray(va) => va
            .iter()
            .enumerate()
            .flat_map(|(r, row)| row.iter().map(move |&v| (v, r)))
            .collect(),
        IndexTable::Padded(rows) => rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .filter(|&&v| v >= 0)
                    .map(move |&v| (v as usize, r))
            })
            .collect(),
    }
}

/// Build the inverse index of `table`.
///
/// Row `v` of the result lists the rows of `table` that contain value `v`.
/// With `sort` the rows of the result are ascending; otherwise their order
/// is unspecified.
pub fn inverse_index<'a>(table: impl Into<IndexTable<'a>>, sort: bool) -> Varray {
    let mut pairs = value_row_pairs(table.into());
    if pairs.is_empty() {
        return Varray::new();
    }

    // pairs are generated in row order, so a stable sort by value leaves
    // every block ascending
    if sort {
        pairs.sort_by_key(|&(v, _)| v);
    } else {
        pairs.sort_unstable_by_key(|&(v, _)| v);
    }

    let max = pairs[pairs.len() - 1].0;
    let mut ind: Vec<usize> = (0..=max)
        .map(|v| pairs.partition_point(|&(value, _)| value < v))
        .collect();
    let data: Vec<usize> = pairs.iter().map(|&(_, r)| r).collect();
    ind.push(data.len());

    tracing::debug!(
        entries = data.len(),
        values = max + 1,
        "Built inverse index"
    );

    Varray::from_parts(data, ind)
}

/// Inverse index as a padded table, see [`Varray::to_array`]
pub fn inverse_index_expanded<'a>(table: impl Into<IndexTable<'a>>, sort: bool) -> Vec<Vec<i64>> {
    inverse_index(table, sort).to_array()
}
