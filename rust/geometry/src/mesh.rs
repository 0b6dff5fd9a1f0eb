// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures
//!
//! A [`Mesh`] holds unique nodes and a connectivity table pointing into
//! them. It is obtained from a [`Formex`] by fusing coincident points.

use formex_lite_core::{inverse_index, Varray};
use nalgebra::Point3;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::formex::{ElementProps, Formex};

/// Tolerances for merging points in [`Formex::fuse`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuseOptions {
    /// Tolerance relative to the bounding box diagonal
    pub rtol: f64,
    /// Absolute tolerance, overrides `rtol` when set
    pub atol: Option<f64>,
}

impl Default for FuseOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: None,
        }
    }
}

/// Nodes plus element connectivity
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
    coords: Vec<Point3<f64>>,
    elems: Varray,
    props: ElementProps,
}

impl Mesh {
    /// Create a mesh, checking that all node numbers exist
    pub fn new(coords: Vec<Point3<f64>>, elems: Varray, props: ElementProps) -> Result<Self> {
        if let Some(&bad) = elems.data().iter().find(|&&n| n >= coords.len()) {
            return Err(Error::InvalidInput(format!(
                "node {} out of range for {} nodes",
                bad,
                coords.len()
            )));
        }
        if let Some(p) = props.as_slice() {
            if p.len() != elems.nrows() {
                return Err(Error::ShapeMismatch(format!(
                    "{} properties for {} elements",
                    p.len(),
                    elems.nrows()
                )));
            }
        }
        Ok(Self {
            coords,
            elems,
            props,
        })
    }

    #[inline]
    pub fn coords(&self) -> &[Point3<f64>] {
        &self.coords
    }

    #[inline]
    pub fn elems(&self) -> &Varray {
        &self.elems
    }

    #[inline]
    pub fn props(&self) -> &ElementProps {
        &self.props
    }

    #[inline]
    pub fn nelems(&self) -> usize {
        self.elems.nrows()
    }

    #[inline]
    pub fn ncoords(&self) -> usize {
        self.coords.len()
    }

    /// Largest number of nodes in an element
    #[inline]
    pub fn nplex(&self) -> usize {
        self.elems.width()
    }

    /// Elements connected to every node, ascending
    pub fn node_elements(&self) -> Varray {
        inverse_index(&self.elems, true)
    }

    /// Expand back to a Formex. All elements need the same plexity.
    pub fn to_formex(&self) -> Result<Formex> {
        let nplex = self.nplex();
        if let Some(i) = (0..self.nelems()).find(|&i| self.elems.length(i) != nplex) {
            return Err(Error::PlexityMismatch {
                expected: nplex,
                got: self.elems.length(i),
            });
        }
        if self.nelems() == 0 {
            return Ok(Formex::empty(nplex.max(1)));
        }
        let coords = self.elems.data().iter().map(|&n| self.coords[n]).collect();
        Ok(Formex::from_parts(coords, nplex, self.props.clone()))
    }
}

type CellKey = (i64, i64, i64);

impl Formex {
    /// Merge points closer than the tolerance into single nodes.
    ///
    /// Points are merged when every coordinate differs by at most `atol`.
    /// Nodes are numbered in order of first appearance; elements keep their
    /// order and properties.
    pub fn fuse(&self, options: &FuseOptions) -> Mesh {
        let atol = options.atol.unwrap_or(options.rtol * self.dsize());
        let quantize = |p: &Point3<f64>| -> CellKey {
            if atol > 0.0 {
                (
                    (p.x / atol).floor() as i64,
                    (p.y / atol).floor() as i64,
                    (p.z / atol).floor() as i64,
                )
            } else {
                (p.x.to_bits() as i64, p.y.to_bits() as i64, p.z.to_bits() as i64)
            }
        };

        let mut cells: FxHashMap<CellKey, SmallVec<[usize; 2]>> = FxHashMap::default();
        let mut nodes: Vec<Point3<f64>> = Vec::new();
        let mut index = Vec::with_capacity(self.coords().len());
        for p in self.coords() {
            let (cx, cy, cz) = quantize(p);
            let span = if atol > 0.0 { 1 } else { 0 };
            let mut found = None;
            'search: for dx in -span..=span {
                for dy in -span..=span {
                    for dz in -span..=span {
                        // keys saturate for coordinates far beyond atol
                        let key = (
                            cx.saturating_add(dx),
                            cy.saturating_add(dy),
                            cz.saturating_add(dz),
                        );
                        let Some(cell) = cells.get(&key) else {
                            continue;
                        };
                        if let Some(&n) = cell.iter().find(|&&n| (nodes[n] - *p).amax() <= atol) {
                            found = Some(n);
                            break 'search;
                        }
                    }
                }
            }
            let n = match found {
                Some(n) => n,
                None => {
                    nodes.push(*p);
                    cells.entry((cx, cy, cz)).or_default().push(nodes.len() - 1);
                    nodes.len() - 1
                }
            };
            index.push(n);
        }

        debug!(
            points = self.coords().len(),
            nodes = nodes.len(),
            atol,
            "Fused points"
        );
        let elems = Varray::from_rows(index.chunks(self.nplex().max(1)).map(|c| c.to_vec()));
        Mesh {
            coords: nodes,
            elems,
            props: self.props().clone(),
        }
    }

    /// Fuse with default tolerances
    pub fn to_mesh(&self) -> Mesh {
        self.fuse(&FuseOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    fn two_triangles() -> Formex {
        Formex::from_triangles(&[
            [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)],
            [p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0 + 1e-9, 0.0)],
        ])
    }

    #[test]
    fn test_fuse_shared_nodes() {
        let mesh = two_triangles().to_mesh();
        assert_eq!(mesh.ncoords(), 4);
        assert_eq!(mesh.nelems(), 2);
        assert_eq!(mesh.nplex(), 3);
        assert_eq!(mesh.elems().to_list(), vec![vec![0, 1, 2], vec![1, 3, 2]]);
    }

    #[test]
    fn test_fuse_with_zero_tolerance() {
        let mesh = two_triangles().fuse(&FuseOptions {
            rtol: 0.0,
            atol: Some(0.0),
        });
        assert_eq!(mesh.ncoords(), 5);
    }

    #[test]
    fn test_fuse_far_from_origin_with_tiny_tolerance() {
        let f = Formex::from_segments(&[
            [p(1e7, 0.0, 0.0), p(1e7, 1.0, 0.0)],
            [p(1e7, 1.0, 0.0), p(-1e7, 2.0, 0.0)],
        ]);
        let mesh = f.fuse(&FuseOptions {
            rtol: 0.0,
            atol: Some(1e-12),
        });
        assert_eq!(mesh.ncoords(), 3);
        assert_eq!(mesh.elems().to_list(), vec![vec![0, 1], vec![1, 2]]);
    }

    #[test]
    fn test_fuse_non_finite_points() {
        let f = Formex::from_segments(&[
            [p(f64::INFINITY, 0.0, 0.0), p(0.0, 0.0, 0.0)],
            [p(0.0, 0.0, 0.0), p(f64::NAN, 1.0, 0.0)],
        ]);
        let mesh = f.fuse(&FuseOptions {
            rtol: 0.0,
            atol: Some(1e-3),
        });
        assert_eq!(mesh.nelems(), 2);
        assert_eq!(mesh.elems().row(0)[1], mesh.elems().row(1)[0]);
        assert_eq!(mesh.ncoords(), 3);
    }

    #[test]
    fn test_node_elements() {
        let mesh = two_triangles().to_mesh();
        let inv = mesh.node_elements();
        assert_eq!(inv.to_list(), vec![vec![0], vec![0, 1], vec![0, 1], vec![1]]);
    }

    #[test]
    fn test_round_trip_to_formex() {
        let f = two_triangles().with_props(vec![4, 2]).unwrap();
        let g = f.to_mesh().to_formex().unwrap();
        assert_eq!(g.nelems(), 2);
        assert_eq!(g.props(), f.props());
        assert_eq!(g.element(1)[2], p(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_mixed_plexity_to_formex_fails() {
        let coords = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)];
        let elems = Varray::from_rows(vec![vec![0, 1, 2], vec![0, 1]]);
        let mesh = Mesh::new(coords.clone(), elems, ElementProps::Untagged).unwrap();
        assert!(matches!(
            mesh.to_formex(),
            Err(Error::PlexityMismatch { expected: 3, got: 2 })
        ));
        let bad = Varray::from_rows(vec![vec![0, 5]]);
        assert!(Mesh::new(coords, bad, ElementProps::Untagged).is_err());
    }
}
