// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unsupported plexity {0}: operation needs plex-2 or plex-3 elements")]
    UnsupportedPlexity(usize),

    #[error("Plex-2 elements can only be cut by a single plane, got {0}")]
    MultiplePlanes(usize),

    #[error("No cutting planes given")]
    NoPlanes,

    #[error("Plexity mismatch: expected {expected}, got {got}")]
    PlexityMismatch { expected: usize, got: usize },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Connectivity table error: {0}")]
    CoreError(#[from] formex_lite_core::Error),
}
