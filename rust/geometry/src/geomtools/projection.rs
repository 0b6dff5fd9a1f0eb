// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projections and distances

use std::cmp::Ordering;

use nalgebra::Point3;
use rayon::prelude::*;

use super::{bcast, grid_map, lines::triangle_plane, Grid, Line, Mode};
use crate::error::{Error, Result};
use crate::formex::{Segment, Triangle};
use crate::geomtools::bary::inside_triangle;
use crate::plane::Plane;

/// Closest footpoint of a point on a set of primitives
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footpoint {
    /// Index of the query point
    pub point: usize,
    pub distance: f64,
    pub foot: Point3<f64>,
}

/// Order distances ascending with NaN after every number
#[inline]
fn nan_last(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

#[inline]
fn plane_time(x: &Point3<f64>, plane: &Plane) -> f64 {
    let n = plane.normal;
    (plane.point - x).dot(&n) / n.dot(&n)
}

#[inline]
fn line_time(x: &Point3<f64>, line: &Line) -> f64 {
    let n = line.dir;
    (x - line.point).dot(&n) / n.dot(&n)
}

/// Parameters `t` along the plane normals such that `x + t * n` lies on
/// the plane
pub fn project_point_on_plane_times(
    points: &[Point3<f64>],
    planes: &[Plane],
    mode: Mode,
) -> Result<Grid<f64>> {
    grid_map(mode, points.len(), planes.len(), |i, j| {
        plane_time(&points[i], &planes[j])
    })
}

/// Orthogonal projections of points on planes
pub fn project_point_on_plane(
    points: &[Point3<f64>],
    planes: &[Plane],
    mode: Mode,
) -> Result<Grid<Point3<f64>>> {
    grid_map(mode, points.len(), planes.len(), |i, j| {
        let plane = &planes[j];
        points[i] + plane.normal * plane_time(&points[i], plane)
    })
}

/// Parameters along the lines of the orthogonal projections of points
pub fn project_point_on_line_times(
    points: &[Point3<f64>],
    lines: &[Line],
    mode: Mode,
) -> Result<Grid<f64>> {
    grid_map(mode, points.len(), lines.len(), |i, j| {
        line_time(&points[i], &lines[j])
    })
}

/// Orthogonal projections of points on lines
pub fn project_point_on_line(
    points: &[Point3<f64>],
    lines: &[Line],
    mode: Mode,
) -> Result<Grid<Point3<f64>>> {
    grid_map(mode, points.len(), lines.len(), |i, j| {
        lines[j].at(line_time(&points[i], &lines[j]))
    })
}

/// Distances of points from lines
pub fn distance_from_line(
    points: &[Point3<f64>],
    lines: &[Line],
    mode: Mode,
) -> Result<Grid<f64>> {
    grid_map(mode, points.len(), lines.len(), |i, j| {
        let x = &points[i];
        (lines[j].at(line_time(x, &lines[j])) - x).norm()
    })
}

/// For every line, the sorted indices of the points closer than `atol`.
///
/// `atol` holds one tolerance for all points or one per point.
pub fn point_near_line(
    points: &[Point3<f64>],
    lines: &[Line],
    atol: &[f64],
) -> Result<Vec<Vec<usize>>> {
    if atol.len() != 1 && atol.len() != points.len() {
        return Err(Error::ShapeMismatch(format!(
            "expected 1 or {} tolerances, got {}",
            points.len(),
            atol.len()
        )));
    }
    Ok(lines
        .par_iter()
        .map(|line| {
            points
                .iter()
                .enumerate()
                .filter(|(k, x)| {
                    (line.at(line_time(x, line)) - *x).norm() < atol[bcast(atol.len(), *k)]
                })
                .map(|(k, _)| k)
                .collect()
        })
        .collect())
}

/// Distances between all points of `x` and all points of `y`
pub fn distance(x: &[Point3<f64>], y: &[Point3<f64>]) -> Grid<f64> {
    let nb = y.len();
    let data: Vec<f64> = (0..x.len() * nb)
        .into_par_iter()
        .map(|k| (x[k / nb] - y[k % nb]).norm())
        .collect();
    Grid::from_vec(x.len(), nb, data)
}

/// Index and distance of the point of `y` closest to each point of `x`.
///
/// Without `y` the closest other point of `x` is searched.
pub fn closest(x: &[Point3<f64>], y: Option<&[Point3<f64>]>) -> Result<Vec<(usize, f64)>> {
    let (targets, exclude_self) = match y {
        Some(y) => (y, false),
        None => (x, true),
    };
    let available = if exclude_self {
        targets.len().saturating_sub(1)
    } else {
        targets.len()
    };
    if available == 0 && !x.is_empty() {
        return Err(Error::InvalidInput(
            "no candidate points to search".to_string(),
        ));
    }
    x.par_iter()
        .enumerate()
        .map(|(i, xi)| {
            targets
                .iter()
                .enumerate()
                .filter(|&(j, _)| !(exclude_self && i == j))
                .map(|(j, yj)| (j, (xi - yj).norm()))
                .min_by(|a, b| nan_last(a.1, b.1))
                .ok_or_else(|| Error::InvalidInput("no candidate points to search".to_string()))
        })
        .collect()
}

/// Closest pair `(i, j, distance)` between points of `x` and `y`
pub fn closest_pair(x: &[Point3<f64>], y: &[Point3<f64>]) -> Option<(usize, usize, f64)> {
    distance(x, y)
        .indexed()
        .map(|(i, j, &d)| (i, j, d))
        .min_by(|a, b| nan_last(a.2, b.2))
}

/// Keep the closest candidate per query point, ordered by point index
fn closest_per_point<I>(candidates: I) -> Vec<Footpoint>
where
    I: IntoIterator<Item = Footpoint>,
{
    let mut best: Vec<Footpoint> = Vec::new();
    let mut all: Vec<Footpoint> = candidates.into_iter().collect();
    all.sort_by(|a, b| a.point.cmp(&b.point).then(nan_last(a.distance, b.distance)));
    for fp in all {
        if best.last().map_or(true, |last| last.point != fp.point) {
            best.push(fp);
        }
    }
    best
}

/// Shortest perpendicular distance of points to triangles.
///
/// Only points whose projection falls inside at least one triangle are
/// reported.
pub fn face_distance(points: &[Point3<f64>], triangles: &[Triangle]) -> Vec<Footpoint> {
    let planes: Vec<Plane> = triangles.iter().map(triangle_plane).collect();
    let candidates: Vec<Footpoint> = points
        .par_iter()
        .enumerate()
        .flat_map_iter(|(i, x)| {
            triangles
                .iter()
                .zip(&planes)
                .filter_map(move |(tri, plane)| {
                    let foot = x + plane.normal * plane_time(x, plane);
                    inside_triangle(tri, &foot).then(|| Footpoint {
                        point: i,
                        distance: (foot - x).norm(),
                        foot,
                    })
                })
        })
        .collect();
    closest_per_point(candidates)
}

/// Shortest perpendicular distance of points to segments.
///
/// Only points whose projection falls inside at least one segment are
/// reported.
pub fn edge_distance(points: &[Point3<f64>], segments: &[Segment]) -> Vec<Footpoint> {
    let candidates: Vec<Footpoint> = points
        .par_iter()
        .enumerate()
        .flat_map_iter(|(i, x)| {
            segments.iter().filter_map(move |s| {
                let line = Line::through(s[0], s[1]);
                let t = line_time(x, &line);
                (0.0..=1.0).contains(&t).then(|| {
                    let foot = line.at(t);
                    Footpoint {
                        point: i,
                        distance: (foot - x).norm(),
                        foot,
                    }
                })
            })
        })
        .collect();
    closest_per_point(candidates)
}

/// Closest vertex for every point
pub fn vertex_distance(points: &[Point3<f64>], vertices: &[Point3<f64>]) -> Result<Vec<Footpoint>> {
    Ok(closest(points, Some(vertices))?
        .into_iter()
        .enumerate()
        .map(|(i, (j, distance))| Footpoint {
            point: i,
            distance,
            foot: vertices[j],
        })
        .collect())
}
