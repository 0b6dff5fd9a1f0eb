// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Formex-Lite Core
//!
//! Compact variable width integer tables for element connectivity.
//!
//! ## Overview
//!
//! - **Varray**: rows of differing length stored as one flat buffer plus
//!   row offsets, with row/column/flat-position queries
//! - **Inverse index**: element → node tables turned into node → element
//!   tables by a sort and binary search over `(value, row)` pairs
//!
//! ## Quick Start
//!
//! ```rust
//! use formex_lite_core::Varray;
//!
//! let elems = Varray::from_rows(vec![vec![0, 1], vec![2, 0], vec![1, 2], vec![4]]);
//! assert_eq!(elems.shape(), (4, 2));
//!
//! let nodes = elems.inverse();
//! assert_eq!(nodes.row(0), &[0, 1]);
//! assert!(nodes.row(3).is_empty());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for tables

pub mod error;
pub mod inverse;
pub mod varray;

pub use error::{Error, Result};
pub use inverse::{inverse_index, inverse_index_expanded, IndexTable};
pub use varray::{FlatSelector, RowSelector, Rows, Varray, PAD};
