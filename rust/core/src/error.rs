// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for table operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or indexing a [`Varray`](crate::Varray)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid table data: {0}")]
    InvalidData(String),

    #[error("Row {row} out of bounds for table with {nrows} rows")]
    RowOutOfBounds { row: usize, nrows: usize },

    #[error("Index ({row}, {col}) out of bounds")]
    IndexOutOfBounds { row: usize, col: usize },

    #[error("Selector has length {got}, expected {expected}")]
    InvalidSelector { expected: usize, got: usize },
}
