// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Oriented planes

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Plane through `point` with unit `normal`.
///
/// The positive side is the half space the normal points into.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plane {
    /// Point on the plane
    pub point: Point3<f64>,
    /// Unit normal vector
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Create a new plane. The normal is normalized; a zero normal gives NaN
    /// components.
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    /// Plane `x[axis] = value` with the axis direction as normal
    ///
    /// # Panics
    ///
    /// Panics if `axis` is not 0, 1 or 2.
    pub fn axis(axis: usize, value: f64) -> Self {
        let mut point = Point3::origin();
        point[axis] = value;
        Self {
            point,
            normal: Vector3::ith(axis, 1.0),
        }
    }

    /// Same plane with the normal reversed
    pub fn flipped(&self) -> Self {
        Self {
            point: self.point,
            normal: -self.normal,
        }
    }

    /// Signed distance from point to plane.
    /// Positive = in front, Negative = behind
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.point).dot(&self.normal)
    }

    /// Check if point is in front of the plane, within `atol`
    #[inline]
    pub fn is_front(&self, point: &Point3<f64>, atol: f64) -> bool {
        self.signed_distance(point) > -atol
    }

    /// Orthogonal projection of a point onto the plane
    #[inline]
    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.signed_distance(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axis_planes() {
        let plane = Plane::axis(2, -1.5);
        assert_eq!(plane.point, Point3::new(0.0, 0.0, -1.5));
        assert_eq!(plane.normal, Vector3::z());
        assert_relative_eq!(plane.signed_distance(&Point3::new(4.0, 4.0, 0.5)), 2.0);
    }

    #[test]
    #[should_panic]
    fn test_axis_out_of_range_panics() {
        let _ = Plane::axis(3, 1.0);
    }

    #[test]
    fn test_normal_is_normalized() {
        let plane = Plane::new(Point3::origin(), Vector3::new(0.0, 3.0, 4.0));
        assert_relative_eq!(plane.normal.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.normal.y, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_signed_distance_and_projection() {
        let plane = Plane::axis(2, 1.0);
        let p = Point3::new(3.0, -2.0, 4.0);
        assert_relative_eq!(plane.signed_distance(&p), 3.0, epsilon = 1e-12);
        assert_relative_eq!(plane.flipped().signed_distance(&p), -3.0, epsilon = 1e-12);
        assert_relative_eq!(plane.project(&p), Point3::new(3.0, -2.0, 1.0), epsilon = 1e-12);
        assert!(plane.is_front(&Point3::new(0.0, 0.0, 1.0 - 1e-9), 1e-6));
        assert!(!plane.is_front(&Point3::new(0.0, 0.0, 0.5), 1e-6));
    }

    #[test]
    fn test_zero_normal_is_nan() {
        let plane = Plane::new(Point3::origin(), Vector3::zeros());
        assert!(plane.normal.x.is_nan());
    }
}
