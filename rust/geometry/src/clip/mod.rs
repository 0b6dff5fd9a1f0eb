// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plane clipping of segment and triangle batches
//!
//! A Formex is split by one or more planes into the part at the positive
//! side (the half space the normals point into) and the part at the
//! negative side. Elements within `atol` of a plane are treated as lying
//! in it: their near vertices are projected onto the plane and they are
//! not cut.

use std::convert::Infallible;
use std::str::FromStr;

use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::formex::{ElementProps, Formex};
use crate::plane::Plane;

mod section;
mod segments;
mod triangles;

pub use segments::cut_segments;
pub use triangles::{cut_elements, cut_triangles};

/// Default `atol` as a fraction of the Formex bounding box diagonal
pub const DEFAULT_ATOL_FACTOR: f64 = 1e-5;

/// Which part of a cut to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    Positive,
    Negative,
    #[default]
    Both,
}

impl Side {
    #[inline]
    pub fn wants_positive(self) -> bool {
        !matches!(self, Side::Negative)
    }

    #[inline]
    pub fn wants_negative(self) -> bool {
        !matches!(self, Side::Positive)
    }
}

impl FromStr for Side {
    type Err = Infallible;

    /// `"+"`/`"pos..."` and `"-"`/`"neg..."` select one side, anything
    /// else selects both.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(if s == "+" || s.starts_with("pos") {
            Side::Positive
        } else if s == "-" || s.starts_with("neg") {
            Side::Negative
        } else {
            Side::Both
        })
    }
}

/// Property numbers stamped on the elements produced by a cut.
///
/// For segments:
/// - 0: untouched elements at the positive side
/// - 1: untouched elements at the negative side
/// - 2: positive part of a cut segment
/// - 3: negative part of a cut segment
///
/// For triangles:
/// - 0: no vertex in the plane, triangle at the isolated vertex
/// - 1, 2: no vertex in the plane, the two triangles of the remaining
///   quadrilateral
/// - 3: one vertex in the plane, the others at the same side
/// - 4: one vertex in the plane, the others at opposite sides
/// - 5: two vertices in the plane
/// - 6: three vertices in the plane
///
/// A `None` slot keeps the property of the parent element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NewProps([Option<i32>; 7]);

impl NewProps {
    pub fn new(slots: [Option<i32>; 7]) -> Self {
        Self(slots)
    }

    /// Slot `i` stamps property `i`
    pub fn sequential() -> Self {
        Self([Some(0), Some(1), Some(2), Some(3), Some(4), Some(5), Some(6)])
    }

    #[inline]
    pub fn slot(&self, i: usize) -> Option<i32> {
        self.0.get(i).copied().flatten()
    }
}

impl From<[i32; 4]> for NewProps {
    fn from(p: [i32; 4]) -> Self {
        Self([Some(p[0]), Some(p[1]), Some(p[2]), Some(p[3]), None, None, None])
    }
}

impl From<[i32; 7]> for NewProps {
    fn from(p: [i32; 7]) -> Self {
        Self(p.map(Some))
    }
}

impl From<[Option<i32>; 7]> for NewProps {
    fn from(p: [Option<i32>; 7]) -> Self {
        Self(p)
    }
}

/// Options for [`Formex::cut_with_plane`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CutOptions {
    pub side: Side,
    /// Distance below which a vertex counts as lying in a plane.
    /// `None` uses [`DEFAULT_ATOL_FACTOR`] times the bounding box diagonal.
    pub atol: Option<f64>,
    pub newprops: Option<NewProps>,
}

impl CutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn atol(mut self, atol: f64) -> Self {
        self.atol = Some(atol);
        self
    }

    pub fn newprops(mut self, newprops: impl Into<NewProps>) -> Self {
        self.newprops = Some(newprops.into());
        self
    }

    /// Property to stamp for `slot`, if any
    #[inline]
    pub(crate) fn stamp(&self, slot: usize) -> Option<i32> {
        self.newprops.and_then(|p| p.slot(slot))
    }
}

/// Result of a cut, holding the requested sides
#[derive(Debug, Clone, PartialEq)]
pub enum Cut {
    Positive(Formex),
    Negative(Formex),
    Both { positive: Formex, negative: Formex },
}

impl Cut {
    pub(crate) fn from_sides(
        side: Side,
        positive: Option<Formex>,
        negative: Option<Formex>,
        nplex: usize,
    ) -> Cut {
        let positive = positive.unwrap_or_else(|| Formex::empty(nplex));
        let negative = negative.unwrap_or_else(|| Formex::empty(nplex));
        match side {
            Side::Positive => Cut::Positive(positive),
            Side::Negative => Cut::Negative(negative),
            Side::Both => Cut::Both { positive, negative },
        }
    }

    pub fn positive(&self) -> Option<&Formex> {
        match self {
            Cut::Positive(f) | Cut::Both { positive: f, .. } => Some(f),
            Cut::Negative(_) => None,
        }
    }

    pub fn negative(&self) -> Option<&Formex> {
        match self {
            Cut::Negative(f) | Cut::Both { negative: f, .. } => Some(f),
            Cut::Positive(_) => None,
        }
    }

    /// Split into `(positive, negative)`
    pub fn into_parts(self) -> (Option<Formex>, Option<Formex>) {
        match self {
            Cut::Positive(f) => (Some(f), None),
            Cut::Negative(f) => (None, Some(f)),
            Cut::Both { positive, negative } => (Some(positive), Some(negative)),
        }
    }
}

impl Formex {
    /// Cut the elements with one or more planes.
    ///
    /// Plex-2 elements take exactly one plane; plex-3 elements may be cut
    /// by several planes, in which case the positive side is the
    /// intersection of the positive half spaces.
    pub fn cut_with_plane(&self, planes: &[Plane], options: &CutOptions) -> Result<Cut> {
        if planes.is_empty() {
            return Err(Error::NoPlanes);
        }
        let atol = options
            .atol
            .unwrap_or_else(|| DEFAULT_ATOL_FACTOR * self.dsize());
        let options = CutOptions {
            atol: Some(atol),
            ..*options
        };
        match self.nplex() {
            2 => match planes {
                [plane] => cut_segments(self, plane, &options),
                _ => Err(Error::MultiplePlanes(planes.len())),
            },
            3 => cut_triangles(self, planes, &options),
            n => Err(Error::UnsupportedPlexity(n)),
        }
    }
}

/// Free function form of [`Formex::cut_with_plane`]
pub fn cut_with_plane(formex: &Formex, planes: &[Plane], options: &CutOptions) -> Result<Cut> {
    formex.cut_with_plane(planes, options)
}

/// Accumulates the elements produced by a cut.
///
/// Every element carries its parent's property or a stamped one; if no
/// element carries one the result is untagged, otherwise missing ones
/// become 0.
#[derive(Debug)]
pub(crate) struct Pieces {
    nplex: usize,
    coords: Vec<Point3<f64>>,
    props: Vec<i32>,
    tagged: bool,
}

impl Pieces {
    pub(crate) fn new(nplex: usize) -> Self {
        Self {
            nplex,
            coords: Vec::new(),
            props: Vec::new(),
            tagged: false,
        }
    }

    pub(crate) fn push(&mut self, points: &[Point3<f64>], parent: Option<i32>, stamp: Option<i32>) {
        debug_assert_eq!(points.len(), self.nplex);
        self.coords.extend_from_slice(points);
        let prop = stamp.or(parent);
        self.tagged |= prop.is_some();
        self.props.push(prop.unwrap_or(0));
    }

    /// Add all elements of `formex`, stamping `stamp` if given
    pub(crate) fn extend(&mut self, formex: &Formex, stamp: Option<i32>) {
        for (i, x) in formex.elements().enumerate() {
            self.push(x, formex.prop(i), stamp);
        }
    }

    pub(crate) fn append(&mut self, other: Pieces) {
        debug_assert_eq!(self.nplex, other.nplex);
        self.coords.extend(other.coords);
        self.props.extend(other.props);
        self.tagged |= other.tagged;
    }

    pub(crate) fn len(&self) -> usize {
        self.props.len()
    }

    pub(crate) fn into_formex(self) -> Formex {
        let props = if self.tagged {
            ElementProps::Tagged(self.props)
        } else {
            ElementProps::Untagged
        };
        Formex::from_parts(self.coords, self.nplex, props)
    }
}
