// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Formex: a batch of elements with the same number of points
//!
//! A Formex stores `nelems * nplex` points in element order, plus an
//! optional property number per element. There is no connectivity: points
//! shared by neighbouring elements are stored once per element.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::coords::CoordsExt;
use crate::error::{Error, Result};
use crate::geomtools::level_volumes;
use crate::plane::Plane;

/// A plex-2 element
pub type Segment = [Point3<f64>; 2];

/// A plex-3 element
pub type Triangle = [Point3<f64>; 3];

/// Per-element property numbers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementProps {
    #[default]
    Untagged,
    Tagged(Vec<i32>),
}

impl ElementProps {
    #[inline]
    pub fn is_tagged(&self) -> bool {
        matches!(self, ElementProps::Tagged(_))
    }

    /// Property of element `i`, `None` if untagged
    #[inline]
    pub fn get(&self, i: usize) -> Option<i32> {
        match self {
            ElementProps::Untagged => None,
            ElementProps::Tagged(p) => p.get(i).copied(),
        }
    }

    pub fn as_slice(&self) -> Option<&[i32]> {
        match self {
            ElementProps::Untagged => None,
            ElementProps::Tagged(p) => Some(p),
        }
    }

    fn select(&self, idx: &[usize]) -> Self {
        match self {
            ElementProps::Untagged => ElementProps::Untagged,
            ElementProps::Tagged(p) => ElementProps::Tagged(idx.iter().map(|&i| p[i]).collect()),
        }
    }

    /// Properties of a concatenation of batches with `(props, nelems)`.
    ///
    /// If any batch is tagged, the untagged ones are filled with 0.
    pub(crate) fn merge<'a>(parts: impl IntoIterator<Item = (&'a ElementProps, usize)>) -> Self {
        let mut tagged = false;
        let mut merged = Vec::new();
        for (props, n) in parts {
            match props {
                ElementProps::Tagged(p) => {
                    tagged = true;
                    merged.extend_from_slice(p);
                }
                ElementProps::Untagged => merged.resize(merged.len() + n, 0),
            }
        }
        if tagged {
            ElementProps::Tagged(merged)
        } else {
            ElementProps::Untagged
        }
    }
}

/// Which element points take part in [`Formex::test`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Nodes {
    /// Every point has to pass
    #[default]
    All,
    /// At least one point has to pass
    Any,
    /// No point may pass
    None,
    /// Every listed point has to pass
    Subset(Vec<usize>),
}

/// Batch of elements of plexity `nplex`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Formex {
    coords: Vec<Point3<f64>>,
    nplex: usize,
    props: ElementProps,
}

impl Formex {
    /// Create a Formex from `nplex` consecutive points per element
    pub fn new(coords: Vec<Point3<f64>>, nplex: usize) -> Result<Self> {
        if nplex == 0 {
            return Err(Error::UnsupportedPlexity(0));
        }
        if coords.len() % nplex != 0 {
            return Err(Error::ShapeMismatch(format!(
                "{} points do not form plex-{} elements",
                coords.len(),
                nplex
            )));
        }
        Ok(Self {
            coords,
            nplex,
            props: ElementProps::Untagged,
        })
    }

    /// Formex without elements
    pub fn empty(nplex: usize) -> Self {
        Self {
            coords: Vec::new(),
            nplex,
            props: ElementProps::Untagged,
        }
    }

    pub fn from_elements<const N: usize>(elems: &[[Point3<f64>; N]]) -> Self {
        Self {
            coords: elems.iter().flatten().copied().collect(),
            nplex: N,
            props: ElementProps::Untagged,
        }
    }

    pub fn from_segments(segments: &[Segment]) -> Self {
        Self::from_elements(segments)
    }

    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        Self::from_elements(triangles)
    }

    /// Attach one property number per element
    pub fn with_props(mut self, props: Vec<i32>) -> Result<Self> {
        if props.len() != self.nelems() {
            return Err(Error::ShapeMismatch(format!(
                "{} properties for {} elements",
                props.len(),
                self.nelems()
            )));
        }
        self.props = ElementProps::Tagged(props);
        Ok(self)
    }

    /// Assemble from parts already known to be consistent
    pub(crate) fn from_parts(coords: Vec<Point3<f64>>, nplex: usize, props: ElementProps) -> Self {
        debug_assert!(nplex > 0 && coords.len() % nplex == 0);
        debug_assert!(props
            .as_slice()
            .map_or(true, |p| p.len() * nplex == coords.len()));
        Self {
            coords,
            nplex,
            props,
        }
    }

    /// Give every element the same property number
    pub fn set_prop(&mut self, prop: i32) {
        self.props = ElementProps::Tagged(vec![prop; self.nelems()]);
    }

    /// Drop the property numbers
    pub fn clear_props(&mut self) {
        self.props = ElementProps::Untagged;
    }

    #[inline]
    pub fn nelems(&self) -> usize {
        self.coords.len() / self.nplex.max(1)
    }

    #[inline]
    pub fn nplex(&self) -> usize {
        self.nplex
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// All points, element by element
    #[inline]
    pub fn coords(&self) -> &[Point3<f64>] {
        &self.coords
    }

    /// Points of element `i`
    #[inline]
    pub fn element(&self, i: usize) -> &[Point3<f64>] {
        &self.coords[i * self.nplex..(i + 1) * self.nplex]
    }

    pub fn elements(&self) -> impl ExactSizeIterator<Item = &[Point3<f64>]> + '_ {
        self.coords.chunks_exact(self.nplex.max(1))
    }

    #[inline]
    pub fn props(&self) -> &ElementProps {
        &self.props
    }

    #[inline]
    pub fn prop(&self, i: usize) -> Option<i32> {
        self.props.get(i)
    }

    /// Highest property number, `None` if untagged or empty
    pub fn max_prop(&self) -> Option<i32> {
        self.props.as_slice()?.iter().copied().max()
    }

    /// Sorted unique property numbers, `None` if untagged
    pub fn prop_set(&self) -> Option<Vec<i32>> {
        let mut set = self.props.as_slice()?.to_vec();
        set.sort_unstable();
        set.dedup();
        Some(set)
    }

    /// Concatenate Formices of the same plexity.
    ///
    /// Properties follow the merge rule of [`ElementProps`].
    pub fn concatenate(parts: &[Formex]) -> Result<Formex> {
        let Some(first) = parts.first() else {
            return Err(Error::InvalidInput("nothing to concatenate".into()));
        };
        if let Some(bad) = parts.iter().find(|f| f.nplex != first.nplex) {
            return Err(Error::PlexityMismatch {
                expected: first.nplex,
                got: bad.nplex,
            });
        }
        let coords = parts.iter().flat_map(|f| f.coords.iter().copied()).collect();
        let props = ElementProps::merge(parts.iter().map(|f| (&f.props, f.nelems())));
        Ok(Formex {
            coords,
            nplex: first.nplex,
            props,
        })
    }

    /// Append the elements of `other`
    pub fn append(&mut self, other: &Formex) -> Result<()> {
        if other.nplex != self.nplex {
            return Err(Error::PlexityMismatch {
                expected: self.nplex,
                got: other.nplex,
            });
        }
        let n = self.nelems();
        self.props = ElementProps::merge([(&self.props, n), (&other.props, other.nelems())]);
        self.coords.extend_from_slice(&other.coords);
        Ok(())
    }

    /// Elements with the given indices, in that order
    pub fn select(&self, idx: &[usize]) -> Formex {
        let mut coords = Vec::with_capacity(idx.len() * self.nplex);
        for &i in idx {
            coords.extend_from_slice(self.element(i));
        }
        Formex {
            coords,
            nplex: self.nplex,
            props: self.props.select(idx),
        }
    }

    /// Elements whose flag is set
    pub fn clip(&self, mask: &[bool]) -> Formex {
        self.select(&mask_indices(mask, true))
    }

    /// Elements whose flag is not set
    pub fn cclip(&self, mask: &[bool]) -> Formex {
        self.select(&mask_indices(mask, false))
    }

    /// Keep only the listed points of every element.
    ///
    /// The result has plexity `idx.len()`; points may repeat.
    pub fn select_nodes(&self, idx: &[usize]) -> Result<Formex> {
        if let Some(&bad) = idx.iter().find(|&&j| j >= self.nplex) {
            return Err(Error::InvalidInput(format!(
                "node {} out of range for plex-{} elements",
                bad, self.nplex
            )));
        }
        if idx.is_empty() {
            return Err(Error::UnsupportedPlexity(0));
        }
        let coords = self
            .elements()
            .flat_map(|x| idx.iter().map(move |&j| x[j]))
            .collect();
        Ok(Formex {
            coords,
            nplex: idx.len(),
            props: self.props.clone(),
        })
    }

    /// Flag the elements whose points lie at the positive side of `plane`,
    /// within `atol`, combined over `nodes`.
    pub fn test(&self, nodes: &Nodes, plane: &Plane, atol: f64) -> Vec<bool> {
        let all: Vec<usize>;
        let subset: &[usize] = match nodes {
            Nodes::Subset(idx) => idx,
            _ => {
                all = (0..self.nplex).collect();
                &all
            }
        };
        self.elements()
            .map(|x| {
                let mut pass = subset.iter().map(|&j| plane.is_front(&x[j], atol));
                match nodes {
                    Nodes::Any => pass.any(|t| t),
                    Nodes::None => !pass.any(|t| t),
                    Nodes::All | Nodes::Subset(_) => pass.all(|t| t),
                }
            })
            .collect()
    }

    /// Bounding box of all points
    pub fn bbox(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        self.coords.bbox()
    }

    /// Diagonal of the bounding box
    pub fn dsize(&self) -> f64 {
        self.coords.dsize()
    }

    /// Mean point of every element
    pub fn centroids(&self) -> Vec<Point3<f64>> {
        self.elements().filter_map(|x| x.centroid()).collect()
    }

    /// Signed distance of every point from `plane`, element by element
    pub fn distances_from_plane(&self, plane: &Plane) -> Vec<f64> {
        self.coords.distances_from_plane(plane)
    }

    fn measure(&self, nplex: usize) -> Result<Vec<f64>> {
        if self.nplex != nplex {
            return Err(Error::PlexityMismatch {
                expected: nplex,
                got: self.nplex,
            });
        }
        level_volumes(&self.coords, nplex)
    }

    /// Lengths of plex-2 elements
    pub fn lengths(&self) -> Result<Vec<f64>> {
        self.measure(2)
    }

    /// Areas of plex-3 elements
    pub fn areas(&self) -> Result<Vec<f64>> {
        self.measure(3)
    }

    /// Signed volumes of plex-4 elements
    pub fn volumes(&self) -> Result<Vec<f64>> {
        self.measure(4)
    }

    pub(crate) fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.coords.chunks_exact(2).map(|x| [x[0], x[1]])
    }

    pub(crate) fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.coords.chunks_exact(3).map(|x| [x[0], x[1], x[2]])
    }
}

fn mask_indices(mask: &[bool], value: bool) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter(|(_, m)| **m == value)
        .map(|(i, _)| i)
        .collect()
}
