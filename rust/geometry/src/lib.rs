// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Formex-Lite Geometry
//!
//! Batched geometric predicates and plane clipping for collections of
//! 3D elements, using nalgebra for the vector math.
//!
//! ## Overview
//!
//! - **Formex**: elements of equal plexity stored as flat points, with
//!   optional property numbers
//! - **Clipping**: cut segments and triangles by planes into a positive
//!   and a negative part
//! - **geomtools**: intersections, projections, distances, barycentric
//!   coordinates, circles and measures over batches of primitives
//! - **Mesh**: fused nodes plus a connectivity [`Varray`]
//!
//! ## Quick Start
//!
//! ```rust
//! use formex_lite_geometry::{CutOptions, Formex, Plane, Point3, Vector3};
//!
//! let f = Formex::from_segments(&[[Point3::origin(), Point3::new(2.0, 0.0, 0.0)]]);
//! let plane = Plane::new(Point3::new(1.0, 0.0, 0.0), Vector3::x());
//! let (pos, neg) = f.cut_with_plane(&[plane], &CutOptions::default())?.into_parts();
//! assert_eq!(pos.unwrap().coords()[0], Point3::new(1.0, 0.0, 0.0));
//! assert_eq!(neg.unwrap().nelems(), 1);
//! # Ok::<(), formex_lite_geometry::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization of planes, Formices and meshes

pub mod clip;
pub mod coords;
pub mod error;
pub mod formex;
pub mod geomtools;
pub mod mesh;
pub mod plane;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

pub use clip::{cut_with_plane, Cut, CutOptions, NewProps, Side, DEFAULT_ATOL_FACTOR};
pub use coords::CoordsExt;
pub use error::{Error, Result};
pub use formex::{ElementProps, Formex, Nodes, Segment, Triangle};
pub use formex_lite_core::Varray;
pub use geomtools::{AngleUnit, Grid, Line, Mode};
pub use mesh::{FuseOptions, Mesh};
pub use plane::Plane;
