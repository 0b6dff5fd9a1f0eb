// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lengths, areas, volumes and normals of elements

use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};
use crate::formex::Triangle;

/// Areas and unit normals of triangles.
///
/// A collapsed triangle gets area 0 and a NaN normal.
pub fn area_normals(triangles: &[Triangle]) -> (Vec<f64>, Vec<Vector3<f64>>) {
    triangles
        .iter()
        .map(|x| {
            let n = (x[1] - x[0]).cross(&(x[2] - x[1]));
            let len = n.norm();
            (0.5 * len, n / len)
        })
        .unzip()
}

/// Indices of degenerate triangles, from the output of [`area_normals`]
pub fn degenerate(areas: &[f64], normals: &[Vector3<f64>]) -> Vec<usize> {
    areas
        .iter()
        .zip(normals)
        .enumerate()
        .filter(|(_, (a, n))| **a <= 0.0 || n.iter().any(|c| c.is_nan()))
        .map(|(i, _)| i)
        .collect()
}

/// Measure of the elements in their own dimension.
///
/// Plex-2 elements give lengths, plex-3 areas and plex-4 signed
/// tetrahedron volumes.
pub fn level_volumes(coords: &[Point3<f64>], nplex: usize) -> Result<Vec<f64>> {
    if !(2..=4).contains(&nplex) {
        return Err(Error::UnsupportedPlexity(nplex));
    }
    if coords.len() % nplex != 0 {
        return Err(Error::ShapeMismatch(format!(
            "{} points do not form plex-{} elements",
            coords.len(),
            nplex
        )));
    }
    Ok(coords
        .chunks_exact(nplex)
        .map(|x| match nplex {
            2 => (x[1] - x[0]).norm(),
            3 => 0.5 * (x[1] - x[0]).cross(&(x[2] - x[1])).norm(),
            _ => {
                let (a, b, c) = (x[1] - x[0], x[2] - x[1], x[3] - x[0]);
                a.cross(&b).dot(&c) / 6.0
            }
        })
        .collect())
}

/// Volumes of hexahedra with the usual vertex numbering
/// (bottom face 0-1-2-3, top face 4-5-6-7).
///
/// The hexahedron is split in 24 tetrahedra; the result is exact for
/// hexahedra with planar faces.
pub fn hex_volume(hexes: &[[Point3<f64>; 8]]) -> Vec<f64> {
    hexes
        .iter()
        .map(|x| {
            let x71 = x[6] - x[1];
            let x60 = x[7] - x[0];
            let x72 = x[6] - x[3];
            let x30 = x[2] - x[0];
            let x50 = x[5] - x[0];
            let x74 = x[6] - x[4];
            let triple = |a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>| a.dot(&b.cross(&c));
            (triple(x71 + x60, x72, x30)
                + triple(x60, x72 + x50, x74)
                + triple(x71, x50, x74 + x30))
                / 12.0
        })
        .collect()
}

/// Area of a closed polygon projected on a plane normal to `dir`.
///
/// Positive when the polygon runs counterclockwise seen from the tip of
/// `dir`. Fewer than 3 vertices give 0.
pub fn projected_area(polygon: &[Point3<f64>], dir: &Vector3<f64>) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let next = polygon.iter().cycle().skip(1);
    0.5 * polygon
        .iter()
        .zip(next)
        .map(|(a, b)| dir.dot(&a.coords.cross(&b.coords)))
        .sum::<f64>()
}

/// Unit normals at every vertex of polygons with `nplex` vertices,
/// from the two edges meeting there.
///
/// Polygons with less than 3 vertices get `(0, 0, -1)`.
pub fn polygon_normals(coords: &[Point3<f64>], nplex: usize) -> Result<Vec<Vector3<f64>>> {
    if nplex == 0 || coords.len() % nplex != 0 {
        return Err(Error::ShapeMismatch(format!(
            "{} points do not form plex-{} polygons",
            coords.len(),
            nplex
        )));
    }
    if nplex < 3 {
        return Ok(vec![-Vector3::z(); coords.len()]);
    }
    Ok(coords
        .chunks_exact(nplex)
        .flat_map(|x| {
            (0..nplex).map(move |i| {
                let prev = x[(i + nplex - 1) % nplex];
                let next = x[(i + 1) % nplex];
                (x[i] - prev).cross(&(next - x[i])).normalize()
            })
        })
        .collect())
}
