// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Barycentric coordinates and containment tests

use nalgebra::{Matrix2, Matrix3, Point3, Vector2, Vector3};
use smallvec::{smallvec, SmallVec};

use super::{bcast, grid_map, pair_len, Grid, Mode};
use crate::error::{Error, Result};
use crate::formex::Triangle;

/// Barycentric coordinates of a point w.r.t. a simplex of up to 4 vertices
pub type BaryCoords = SmallVec<[f64; 4]>;

/// Coordinates `(t1, t2)` of `p` in the triangle, `t0 = 1 - t1 - t2`.
///
/// The point is projected onto the triangle plane by the least squares
/// normal equations.
#[inline]
fn triangle_bary(tri: &Triangle, p: &Point3<f64>) -> [f64; 3] {
    let v1 = tri[1] - tri[0];
    let v2 = tri[2] - tri[0];
    let vp = p - tri[0];
    let gram = Matrix2::new(v1.dot(&v1), v1.dot(&v2), v2.dot(&v1), v2.dot(&v2));
    let rhs = Vector2::new(vp.dot(&v1), vp.dot(&v2));
    match gram.try_inverse() {
        Some(inv) => {
            let t = inv * rhs;
            [1.0 - t.x - t.y, t.x, t.y]
        }
        None => [f64::NAN; 3],
    }
}

/// Barycentric coordinates of `p` w.r.t. a simplex of 2, 3 or 4 vertices
/// (segment, triangle or tetrahedron).
///
/// A degenerate simplex yields NaN coordinates.
pub fn bary_coords(simplex: &[Point3<f64>], p: &Point3<f64>) -> Result<BaryCoords> {
    let s0 = simplex
        .first()
        .ok_or(Error::UnsupportedPlexity(0))?;
    let vp = p - s0;
    Ok(match simplex.len() {
        2 => {
            let v = simplex[1] - s0;
            let t = vp.dot(&v) / v.dot(&v);
            smallvec![1.0 - t, t]
        }
        3 => {
            let [t0, t1, t2] = triangle_bary(&[simplex[0], simplex[1], simplex[2]], p);
            smallvec![t0, t1, t2]
        }
        4 => {
            let vs = [simplex[1] - s0, simplex[2] - s0, simplex[3] - s0];
            let gram = Matrix3::from_fn(|i, j| vs[i].dot(&vs[j]));
            let rhs = Vector3::from_fn(|i, _| vp.dot(&vs[i]));
            match gram.lu().solve(&rhs) {
                Some(t) => smallvec![1.0 - t.sum(), t.x, t.y, t.z],
                None => smallvec![f64::NAN; 4],
            }
        }
        n => return Err(Error::UnsupportedPlexity(n)),
    })
}

fn check_simplices(coords: &[Point3<f64>], nplex: usize) -> Result<usize> {
    if !(2..=4).contains(&nplex) {
        return Err(Error::UnsupportedPlexity(nplex));
    }
    if coords.len() % nplex != 0 {
        return Err(Error::ShapeMismatch(format!(
            "{} points do not form plex-{} simplices",
            coords.len(),
            nplex
        )));
    }
    Ok(coords.len() / nplex)
}

/// Barycentric coordinates of every point w.r.t. every simplex.
///
/// `simplices` holds `nplex` consecutive vertices per simplex. The result
/// has shape `(npoints, nsimplices)`.
pub fn bary_coords_all(
    simplices: &[Point3<f64>],
    nplex: usize,
    points: &[Point3<f64>],
) -> Result<Grid<BaryCoords>> {
    let nel = check_simplices(simplices, nplex)?;
    let grid = grid_map(Mode::All, points.len(), nel, |i, j| {
        bary_coords(&simplices[j * nplex..(j + 1) * nplex], &points[i])
    })?;
    let (rows, cols) = grid.shape();
    let data = grid.into_vec().into_iter().collect::<Result<Vec<_>>>()?;
    Ok(Grid::from_vec(rows, cols, data))
}

/// Barycentric coordinates of each point w.r.t. the simplex of the same
/// index, broadcasting single points or simplices
pub fn bary_coords_pair(
    simplices: &[Point3<f64>],
    nplex: usize,
    points: &[Point3<f64>],
) -> Result<Vec<BaryCoords>> {
    let nel = check_simplices(simplices, nplex)?;
    let n = pair_len(nel, points.len())?;
    (0..n)
        .map(|k| {
            let j = bcast(nel, k);
            bary_coords(&simplices[j * nplex..(j + 1) * nplex], &points[bcast(points.len(), k)])
        })
        .collect()
}

/// Check whether barycentric coordinates lie inside the simplex.
///
/// With `bound` points on the boundary count as inside. NaN coordinates
/// are never inside.
#[inline]
pub fn inside_simplex(bc: &[f64], bound: bool) -> bool {
    if bound {
        bc.iter().all(|&t| t >= 0.0)
    } else {
        bc.iter().all(|&t| t > 0.0)
    }
}

/// Check whether `p`, assumed to lie in the plane of `tri`, falls inside it
/// (boundary included)
#[inline]
pub fn inside_triangle(tri: &Triangle, p: &Point3<f64>) -> bool {
    inside_simplex(&triangle_bary(tri, p), true)
}

/// Containment of every point in every triangle, shape `(npoints, ntriangles)`
pub fn inside_triangle_all(triangles: &[Triangle], points: &[Point3<f64>]) -> Grid<bool> {
    let nt = triangles.len();
    let data = (0..points.len() * nt)
        .map(|k| inside_triangle(&triangles[k % nt], &points[k / nt]))
        .collect();
    Grid::from_vec(points.len(), nt, data)
}

/// Containment of each point in the triangle with the same index
pub fn inside_triangle_pair(triangles: &[Triangle], points: &[Point3<f64>]) -> Result<Vec<bool>> {
    let n = pair_len(triangles.len(), points.len())?;
    Ok((0..n)
        .map(|k| {
            inside_triangle(
                &triangles[bcast(triangles.len(), k)],
                &points[bcast(points.len(), k)],
            )
        })
        .collect())
}
