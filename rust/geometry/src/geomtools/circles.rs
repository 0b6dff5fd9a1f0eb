// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Incircles, circumcircles and bounding circles of triangles

use nalgebra::{Point3, Vector3};

use super::lines::line_line_times;
use super::Line;
use crate::formex::Triangle;

/// Circle in 3D space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub radius: f64,
    pub center: Point3<f64>,
    /// Unit normal on the plane of the circle
    pub normal: Vector3<f64>,
}

/// Edge vectors `x[i] - x[i+1]` and their squared lengths
#[inline]
fn edges(tri: &Triangle) -> ([Vector3<f64>; 3], [f64; 3]) {
    let v = [tri[0] - tri[1], tri[1] - tri[2], tri[2] - tri[0]];
    let vv = [v[0].norm_squared(), v[1].norm_squared(), v[2].norm_squared()];
    (v, vv)
}

/// Incircles, the largest circles inscribed in the triangles
pub fn triangle_in_circle(triangles: &[Triangle]) -> Vec<Circle> {
    triangles
        .iter()
        .map(|x| {
            let v = [
                (x[1] - x[0]).normalize(),
                (x[2] - x[1]).normalize(),
                (x[0] - x[2]).normalize(),
            ];
            // bisectors in x0 and x1 meet in the center
            let b0 = Line::new(x[0], v[0] - v[2]);
            let b1 = Line::new(x[1], v[1] - v[0]);
            let (t0, _) = line_line_times(&b0, &b1);
            let center = b0.at(t0);
            let side = Line::new(x[0], v[0]);
            let w = center - side.point;
            let radius = (w - side.dir * w.dot(&side.dir)).norm();
            Circle {
                radius,
                center,
                normal: v[0].cross(&v[1]).normalize(),
            }
        })
        .collect()
}

fn circum_circle(x: &Triangle, bounding: bool) -> Circle {
    let (v, vv) = edges(x);
    let n = v[0].cross(&v[1]);
    let nn = n.norm_squared();
    let big_n = nn.sqrt();
    let lv = [vv[0].sqrt(), vv[1].sqrt(), vv[2].sqrt()];
    let mut radius = lv[0] * lv[1] * lv[2] / big_n / 2.0;

    // weight of vertex i-1 is the squared opposite edge times its angle term
    let mut sum = Vector3::zeros();
    for i in 0..3 {
        let prev = (i + 2) % 3;
        let w = -v[prev].dot(&v[(i + 1) % 3]);
        sum += x[prev].coords * (w * vv[i]);
    }
    let mut center = Point3::from(sum / nn / 2.0);

    if bounding {
        for (i, j, k) in [(0, 1, 2), (1, 2, 0), (2, 0, 1)] {
            if vv[i] >= vv[j] + vv[k] {
                radius = 0.5 * lv[i];
                center = nalgebra::center(&x[i], &x[j]);
            }
        }
    }

    Circle {
        radius,
        center,
        normal: n / big_n,
    }
}

/// Circumcircles, through the three vertices of each triangle
pub fn triangle_circum_circle(triangles: &[Triangle]) -> Vec<Circle> {
    triangles.iter().map(|x| circum_circle(x, false)).collect()
}

/// Bounding circles, the smallest circles in the triangle planes containing
/// the vertices.
///
/// Equal to the circumcircle for acute triangles; for obtuse triangles the
/// longest edge is the diameter.
pub fn triangle_bounding_circle(triangles: &[Triangle]) -> Vec<Circle> {
    triangles.iter().map(|x| circum_circle(x, true)).collect()
}

/// Flag triangles having an obtuse angle
pub fn triangle_obtuse(triangles: &[Triangle]) -> Vec<bool> {
    triangles
        .iter()
        .map(|x| {
            let (_, vv) = edges(x);
            vv[0] > vv[1] + vv[2] || vv[1] > vv[2] + vv[0] || vv[2] > vv[0] + vv[1]
        })
        .collect()
}
