// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use nalgebra::Point3;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{Error, Result};
use crate::formex::{Formex, Segment};
use crate::geomtools::{intersection_swp, Mode};
use crate::plane::Plane;

impl Formex {
    /// Intersection of the elements with a plane.
    ///
    /// Segments give the points where they cross the plane, `atol` being a
    /// tolerance on the segment parameter. Triangles give the segments
    /// along which they cross it, `atol` being a distance: vertices nearer
    /// to the plane are projected onto it. Triangles lying in the plane
    /// give nothing.
    pub fn intersection_with_plane(&self, plane: &Plane, atol: f64) -> Result<Formex> {
        let section = match self.nplex() {
            2 => {
                let segments: Vec<Segment> = self.segments().collect();
                let planes = std::slice::from_ref(plane);
                let hits = intersection_swp(&segments, planes, Mode::Pair, atol)?;
                let points = hits.into_iter().map(|h| h.point).collect();
                Formex::new(points, 1)?
            }
            3 => {
                let dist = self.distances_from_plane(plane);
                let mut coords = Vec::new();
                for (tri, d) in self.triangles().zip(dist.chunks_exact(3)) {
                    let mut points: SmallVec<[Point3<f64>; 3]> = (0..3)
                        .filter(|&j| d[j].abs() < atol)
                        .map(|j| plane.project(&tri[j]))
                        .collect();
                    for (i, j) in [(0, 1), (1, 2), (2, 0)] {
                        if (d[i] > atol && d[j] < -atol) || (d[i] < -atol && d[j] > atol) {
                            points.push(tri[i] + (tri[j] - tri[i]) * (d[i] / (d[i] - d[j])));
                        }
                    }
                    if let &[a, b] = points.as_slice() {
                        coords.extend([a, b]);
                    }
                }
                Formex::new(coords, 2)?
            }
            n => return Err(Error::UnsupportedPlexity(n)),
        };
        debug!(
            elements = self.nelems(),
            intersections = section.nelems(),
            "Intersected elements with plane"
        );
        Ok(section)
    }
}
