// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Queries on flat point sets

use nalgebra::Point3;
use rayon::prelude::*;

use crate::plane::Plane;

/// Point count above which plane distances are computed in parallel
const PARALLEL_THRESHOLD: usize = 4096;

/// Bounding box, center and plane distances of a set of points
pub trait CoordsExt {
    /// Axis aligned bounding box `(min, max)`, `None` for an empty set
    fn bbox(&self) -> Option<(Point3<f64>, Point3<f64>)>;

    /// Center of the bounding box
    fn center(&self) -> Option<Point3<f64>>;

    /// Length of the bounding box diagonal, 0 for an empty set
    fn dsize(&self) -> f64;

    /// Arithmetic mean of the points
    fn centroid(&self) -> Option<Point3<f64>>;

    /// Signed distance of every point from `plane`
    fn distances_from_plane(&self, plane: &Plane) -> Vec<f64>;
}

impl CoordsExt for [Point3<f64>] {
    fn bbox(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.first()?;
        Some(self.iter().skip(1).fold((first, first), |(lo, hi), p| {
            (lo.inf(p), hi.sup(p))
        }))
    }

    fn center(&self) -> Option<Point3<f64>> {
        self.bbox().map(|(lo, hi)| nalgebra::center(&lo, &hi))
    }

    fn dsize(&self) -> f64 {
        self.bbox().map_or(0.0, |(lo, hi)| (hi - lo).norm())
    }

    fn centroid(&self) -> Option<Point3<f64>> {
        if self.is_empty() {
            return None;
        }
        let sum = self.iter().fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / self.len() as f64))
    }

    fn distances_from_plane(&self, plane: &Plane) -> Vec<f64> {
        if self.len() >= PARALLEL_THRESHOLD {
            self.par_iter().map(|p| plane.signed_distance(p)).collect()
        } else {
            self.iter().map(|p| plane.signed_distance(p)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_bbox_and_dsize() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, -1.0, 0.0),
            Point3::new(1.0, 3.0, 0.0),
        ];
        let (lo, hi) = pts.bbox().unwrap();
        assert_relative_eq!(lo, Point3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(hi, Point3::new(3.0, 3.0, 0.0));
        assert_relative_eq!(pts.dsize(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(pts.center().unwrap(), Point3::new(1.5, 1.0, 0.0));
        assert_relative_eq!(pts.centroid().unwrap(), Point3::new(4.0 / 3.0, 2.0 / 3.0, 0.0));
    }

    #[test]
    fn test_empty_set() {
        let pts: [Point3<f64>; 0] = [];
        assert!(pts.bbox().is_none());
        assert_eq!(pts.dsize(), 0.0);
    }

    #[test]
    fn test_parallel_distances_match() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 1.0, 1.0));
        let pts: Vec<Point3<f64>> = (0..PARALLEL_THRESHOLD + 10)
            .map(|i| Point3::new(i as f64, 0.5 * i as f64, -(i as f64)))
            .collect();
        let d = pts.distances_from_plane(&plane);
        for (p, d) in pts.iter().zip(&d) {
            assert_relative_eq!(plane.signed_distance(p), *d);
        }
    }
}
