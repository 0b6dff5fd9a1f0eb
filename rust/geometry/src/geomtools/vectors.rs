// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vector utilities: rotation angles, perpendiculars, projections

use nalgebra::{Point3, Vector3};

use super::{bcast, pair_len, pair_len_many, AngleUnit, Line};
use crate::coords::CoordsExt;
use crate::error::{Error, Result};

/// Absolute and relative tolerance for recognizing a rotation normal
/// opposite to the requested axis, i.e. a dot product close to -1
const AXIS_FLIP_ATOL: f64 = 1e-8;
const AXIS_FLIP_RTOL: f64 = 1e-5;

/// Some vector perpendicular to `a`, lying in the xy plane.
///
/// The z axis maps to the x axis.
pub fn any_perpendicular_vector(a: &Vector3<f64>) -> Vector3<f64> {
    if a.x == 0.0 && a.y == 0.0 {
        Vector3::x()
    } else {
        Vector3::new(-a.y, a.x, 0.0)
    }
}

/// Vector perpendicular to both `a` and `b`
#[inline]
pub fn perpendicular_vector(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a.cross(b)
}

/// Projection of `a` on the direction of `b`
#[inline]
pub fn projection_vov(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    let u = b.normalize();
    u * a.dot(&u)
}

/// Projection of `a` on the plane with normal `n`
#[inline]
pub fn projection_vop(a: &Vector3<f64>, n: &Vector3<f64>) -> Vector3<f64> {
    a - projection_vov(a, n)
}

fn rotation(a: &Vector3<f64>, b: &Vector3<f64>, unit: AngleUnit) -> (f64, Vector3<f64>) {
    let a = a.normalize();
    let b = b.normalize();
    let mut n = a.cross(&b);
    if n.norm() == 0.0 {
        n = any_perpendicular_vector(&a);
    }
    let angle = a.dot(&b).clamp(-1.0, 1.0).acos();
    (unit.from_radians(angle), n.normalize())
}

/// Angles and unit axes of the rotations taking each `a` to the matching `b`.
///
/// Parallel vectors get an arbitrary perpendicular axis.
pub fn rotation_angle(
    a: &[Vector3<f64>],
    b: &[Vector3<f64>],
    unit: AngleUnit,
) -> Result<Vec<(f64, Vector3<f64>)>> {
    let n = pair_len(a.len(), b.len())?;
    Ok((0..n)
        .map(|k| rotation(&a[bcast(a.len(), k)], &b[bcast(b.len(), k)], unit))
        .collect())
}

/// Signed angles of the rotations around `axis` taking each `a` to `b`.
///
/// Both vectors are first projected on the plane normal to the axis; the
/// angle is negative when the rotation runs clockwise around it.
pub fn rotation_angle_about(
    a: &[Vector3<f64>],
    b: &[Vector3<f64>],
    axis: &[Vector3<f64>],
    unit: AngleUnit,
) -> Result<Vec<f64>> {
    let n = pair_len_many(&[a.len(), b.len(), axis.len()])?;
    Ok((0..n)
        .map(|k| {
            let m = axis[bcast(axis.len(), k)];
            let pa = projection_vop(&a[bcast(a.len(), k)], &m);
            let pb = projection_vop(&b[bcast(b.len(), k)], &m);
            let (angle, n) = rotation(&pa, &pb, unit);
            if (n.dot(&m.normalize()) + 1.0).abs() <= AXIS_FLIP_ATOL + AXIS_FLIP_RTOL {
                -angle
            } else {
                angle
            }
        })
        .collect())
}

/// Orientation of segments `v1[i] -> v2[i]` seen from `point`.
///
/// `v2` defaults to `v1` rolled by one (a closed polygon), `point` to the
/// center of `v1`. The result is the sign (-1, 0, 1) of the triple product
/// `point . (v1 x v2)`.
pub fn segment_orientation(
    v1: &[Point3<f64>],
    v2: Option<&[Point3<f64>]>,
    point: Option<Point3<f64>>,
) -> Result<Vec<i32>> {
    let rolled: Vec<Point3<f64>>;
    let v2 = match v2 {
        Some(v2) if v2.len() == v1.len() => v2,
        Some(v2) => {
            return Err(Error::ShapeMismatch(format!(
                "segment end points: {} vs {}",
                v1.len(),
                v2.len()
            )))
        }
        None => {
            rolled = v1.iter().cycle().skip(1).take(v1.len()).copied().collect();
            &rolled
        }
    };
    let point = point.or_else(|| v1.center()).unwrap_or_else(Point3::origin);
    Ok(v1
        .iter()
        .zip(v2)
        .map(|(a, b)| {
            let s = point.coords.dot(&a.coords.cross(&b.coords));
            if s > 0.0 {
                1
            } else if s < 0.0 {
                -1
            } else {
                0
            }
        })
        .collect())
}

/// Move lines towards `c` over distances `d`.
///
/// Each line is translated in the plane through itself and `c`,
/// perpendicular to its direction. `d` holds one distance or one per line.
pub fn displace_lines(lines: &[Line], c: &Point3<f64>, d: &[f64]) -> Result<Vec<Line>> {
    let n = pair_len(lines.len(), d.len())?;
    Ok((0..n)
        .map(|k| {
            let line = lines[bcast(lines.len(), k)];
            let v = line.dir.normalize();
            let foot = line.point + v * (c - line.point).dot(&v);
            let u = (c - foot).normalize();
            Line::new(line.point + u * d[bcast(d.len(), k)], line.dir)
        })
        .collect())
}
