// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Intersections of lines, segments, planes, triangles and spheres

use nalgebra::Point3;

use super::{bcast, grid_map, pair_len, pair_len_many, Grid, Line, Mode};
use crate::error::{Error, Result};
use crate::formex::{Segment, Triangle};
use crate::geomtools::bary::inside_triangle;
use crate::geomtools::circles::triangle_bounding_circle;
use crate::geomtools::projection::distance_from_line;
use crate::plane::Plane;

/// Intersection of a segment with a plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    /// Parameter along the segment, 0 at its first point
    pub t: f64,
    pub point: Point3<f64>,
    pub segment: usize,
    pub plane: usize,
}

/// Intersection of a line or segment with a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub point: Point3<f64>,
    pub line: usize,
    pub triangle: usize,
}

/// Points on `lines` at parameters `t`, pairwise with broadcasting
pub fn points_at_lines(lines: &[Line], t: &[f64]) -> Result<Vec<Point3<f64>>> {
    let n = pair_len(lines.len(), t.len())?;
    Ok((0..n)
        .map(|k| lines[bcast(lines.len(), k)].at(t[bcast(t.len(), k)]))
        .collect())
}

/// Points on segments at parameters `t`, pairwise with broadcasting
pub fn points_at_segments(segments: &[Segment], t: &[f64]) -> Result<Vec<Point3<f64>>> {
    let lines: Vec<Line> = segments.iter().map(segment_line).collect();
    points_at_lines(&lines, t)
}

#[inline]
pub(crate) fn segment_line(s: &Segment) -> Line {
    Line::through(s[0], s[1])
}

/// Parameters of the feet of the common perpendicular of two lines
#[inline]
pub(crate) fn line_line_times(l1: &Line, l2: &Line) -> (f64, f64) {
    let (m1, m2) = (l1.dir, l2.dir);
    let dot11 = m1.dot(&m1);
    let dot22 = m2.dot(&m2);
    let dot12 = m1.dot(&m2);
    let denom = dot12 * dot12 - dot11 * dot22;
    let q12 = l2.point - l1.point;
    let t1 = q12.dot(&(m2 * dot12 - m1 * dot22)) / denom;
    let t2 = q12.dot(&(m2 * dot11 - m1 * dot12)) / denom;
    (t1, t2)
}

/// Parameters of the closest points of lines `l1` and `l2`.
///
/// Parallel lines give NaN.
pub fn intersect_line_with_line_times(
    l1: &[Line],
    l2: &[Line],
    mode: Mode,
) -> Result<(Grid<f64>, Grid<f64>)> {
    let times = grid_map(mode, l1.len(), l2.len(), |i, j| line_line_times(&l1[i], &l2[j]))?;
    Ok((times.map(|t| t.0), times.map(|t| t.1)))
}

/// Closest points of lines `l1` and `l2` on each of them.
///
/// For intersecting lines both points coincide; parallel lines give NaN.
pub fn intersect_line_with_line(
    l1: &[Line],
    l2: &[Line],
    mode: Mode,
) -> Result<(Grid<Point3<f64>>, Grid<Point3<f64>>)> {
    let points = grid_map(mode, l1.len(), l2.len(), |i, j| {
        let (t1, t2) = line_line_times(&l1[i], &l2[j]);
        (l1[i].at(t1), l2[j].at(t2))
    })?;
    Ok((points.map(|p| p.0), points.map(|p| p.1)))
}

#[inline]
pub(crate) fn line_plane_time(line: &Line, plane: &Plane) -> f64 {
    (plane.point - line.point).dot(&plane.normal) / line.dir.dot(&plane.normal)
}

/// Parameters where lines cross planes.
///
/// Lines parallel to a plane give an infinite value (NaN when the line
/// lies in the plane).
pub fn intersect_line_with_plane_times(
    lines: &[Line],
    planes: &[Plane],
    mode: Mode,
) -> Result<Grid<f64>> {
    grid_map(mode, lines.len(), planes.len(), |i, j| {
        line_plane_time(&lines[i], &planes[j])
    })
}

/// Points where lines cross planes
pub fn intersect_line_with_plane(
    lines: &[Line],
    planes: &[Plane],
    mode: Mode,
) -> Result<Grid<Point3<f64>>> {
    grid_map(mode, lines.len(), planes.len(), |i, j| {
        lines[i].at(line_plane_time(&lines[i], &planes[j]))
    })
}

/// Parameters where the lines through segments cross planes.
///
/// Parameter 0 is the first point of a segment, 1 the second.
pub fn intersection_times_swp(
    segments: &[Segment],
    planes: &[Plane],
    mode: Mode,
) -> Result<Grid<f64>> {
    grid_map(mode, segments.len(), planes.len(), |i, j| {
        line_plane_time(&segment_line(&segments[i]), &planes[j])
    })
}

/// Parameters and points where the lines through segments cross planes,
/// including crossings outside the segments
pub fn intersection_swp_all(
    segments: &[Segment],
    planes: &[Plane],
    mode: Mode,
) -> Result<(Grid<f64>, Grid<Point3<f64>>)> {
    let hits = grid_map(mode, segments.len(), planes.len(), |i, j| {
        let line = segment_line(&segments[i]);
        let t = line_plane_time(&line, &planes[j]);
        (t, line.at(t))
    })?;
    Ok((hits.map(|h| h.0), hits.map(|h| h.1)))
}

/// Crossings of segments with planes lying on the segments.
///
/// A crossing is kept when its parameter is within `[-atol, 1 + atol]`.
/// Hits are ordered by segment, then plane.
pub fn intersection_swp(
    segments: &[Segment],
    planes: &[Plane],
    mode: Mode,
    atol: f64,
) -> Result<Vec<SegmentHit>> {
    let (times, points) = intersection_swp_all(segments, planes, mode)?;
    Ok(times
        .indexed()
        .zip(points.as_slice())
        .filter(|((_, _, &t), _)| t >= -atol && t <= 1.0 + atol)
        .map(|((i, j, &t), &point)| {
            let (segment, plane) = match mode {
                Mode::All => (i, j),
                Mode::Pair => (bcast(segments.len(), i), bcast(planes.len(), i)),
            };
            SegmentHit {
                t,
                point,
                segment,
                plane,
            }
        })
        .collect())
}

/// Plane of a triangle, normal by the right hand rule
#[inline]
pub(crate) fn triangle_plane(tri: &Triangle) -> Plane {
    Plane {
        point: tri[0],
        normal: (tri[1] - tri[0]).cross(&(tri[2] - tri[1])),
    }
}

/// Parameters where lines cross the planes of triangles
pub fn intersection_times_lwt(
    lines: &[Line],
    triangles: &[Triangle],
    mode: Mode,
) -> Result<Grid<f64>> {
    grid_map(mode, lines.len(), triangles.len(), |i, j| {
        line_plane_time(&lines[i], &triangle_plane(&triangles[j]))
    })
}

/// Parameters where the lines through segments cross the planes of triangles
pub fn intersection_times_swt(
    segments: &[Segment],
    triangles: &[Triangle],
    mode: Mode,
) -> Result<Grid<f64>> {
    grid_map(mode, segments.len(), triangles.len(), |i, j| {
        line_plane_time(&segment_line(&segments[i]), &triangle_plane(&triangles[j]))
    })
}

/// Candidate (line, triangle) pairs whose line passes through the
/// bounding circle of the triangle
fn bounding_candidates(
    lines: &[Line],
    triangles: &[Triangle],
    mode: Mode,
) -> Result<Vec<(usize, usize)>> {
    let circles = triangle_bounding_circle(triangles);
    let centers: Vec<Point3<f64>> = circles.iter().map(|c| c.center).collect();
    let dist = distance_from_line(&centers, lines, mode)?;
    Ok(match mode {
        Mode::All => dist
            .indexed()
            .filter(|&(c, _, &d)| d <= circles[c].radius)
            .map(|(c, l, _)| (l, c))
            .collect(),
        Mode::Pair => {
            let n = pair_len(lines.len(), triangles.len())?;
            (0..n)
                .filter(|&k| dist[(k, 0)] <= circles[bcast(circles.len(), k)].radius)
                .map(|k| (bcast(lines.len(), k), bcast(triangles.len(), k)))
                .collect()
        }
    })
}

fn line_triangle_hits(
    lines: &[Line],
    triangles: &[Triangle],
    mode: Mode,
    on_segment: bool,
) -> Result<Vec<TriangleHit>> {
    let mut candidates = bounding_candidates(lines, triangles, mode)?;
    candidates.sort_unstable();
    Ok(candidates
        .into_iter()
        .filter_map(|(l, k)| {
            let line = &lines[l];
            let tri = &triangles[k];
            let t = line_plane_time(line, &triangle_plane(tri));
            if on_segment && !(0.0..=1.0).contains(&t) {
                return None;
            }
            let point = line.at(t);
            inside_triangle(tri, &point).then_some(TriangleHit {
                point,
                line: l,
                triangle: k,
            })
        })
        .collect())
}

/// Points where lines pierce triangles.
///
/// Only crossings inside the triangles are returned, ordered by line.
pub fn intersection_points_lwt(
    lines: &[Line],
    triangles: &[Triangle],
    mode: Mode,
) -> Result<Vec<TriangleHit>> {
    line_triangle_hits(lines, triangles, mode, false)
}

/// Points where segments pierce triangles
pub fn intersection_points_swt(
    segments: &[Segment],
    triangles: &[Triangle],
    mode: Mode,
) -> Result<Vec<TriangleHit>> {
    let lines: Vec<Line> = segments.iter().map(segment_line).collect();
    line_triangle_hits(&lines, triangles, mode, true)
}

#[inline]
fn three_plane_point(p1: &Plane, p2: &Plane, p3: &Plane) -> Point3<f64> {
    let (n1, n2, n3) = (p1.normal, p2.normal, p3.normal);
    let d1 = p1.point.coords.dot(&n1);
    let d2 = p2.point.coords.dot(&n2);
    let d3 = p3.point.coords.dot(&n3);
    let cross23 = n2.cross(&n3);
    let cross31 = n3.cross(&n1);
    let cross12 = n1.cross(&n2);
    let denom = n1.dot(&cross23);
    Point3::from((cross23 * d1 + cross31 * d2 + cross12 * d3) / denom)
}

/// Common points of three families of planes.
///
/// With [`Mode::All`] the result holds `n1 * n2 * n3` points in row-major
/// order; with [`Mode::Pair`] one point per broadcast triple.
pub fn intersection_points_pwp(
    p1: &[Plane],
    p2: &[Plane],
    p3: &[Plane],
    mode: Mode,
) -> Result<Vec<Point3<f64>>> {
    match mode {
        Mode::All => {
            let mut out = Vec::with_capacity(p1.len() * p2.len() * p3.len());
            for a in p1 {
                for b in p2 {
                    out.extend(p3.iter().map(|c| three_plane_point(a, b, c)));
                }
            }
            Ok(out)
        }
        Mode::Pair => {
            let n = pair_len_many(&[p1.len(), p2.len(), p3.len()])?;
            Ok((0..n)
                .map(|k| {
                    three_plane_point(
                        &p1[bcast(p1.len(), k)],
                        &p2[bcast(p2.len(), k)],
                        &p3[bcast(p3.len(), k)],
                    )
                })
                .collect())
        }
    }
}

/// Intersection lines of two families of planes.
///
/// The direction of each line is `n1 x n2`.
pub fn intersection_lines_pwp(p1: &[Plane], p2: &[Plane], mode: Mode) -> Result<Grid<Line>> {
    grid_map(mode, p1.len(), p2.len(), |i, j| {
        let (a, b) = (&p1[i], &p2[j]);
        let dir = a.normal.cross(&b.normal);
        let through = Plane {
            point: a.point,
            normal: dir,
        };
        Line::new(three_plane_point(a, b, &through), dir)
    })
}

/// Intersection circle of two spheres with radii `big_r` and `r` whose
/// centers are `d` apart.
///
/// Returns `(x, y)`: the circle center lies at distance `x` from the first
/// sphere center, towards the second, and has radius `y`.
pub fn intersection_sphere_sphere(big_r: f64, r: f64, d: f64) -> Result<(f64, f64)> {
    if d > big_r + r {
        return Err(Error::InvalidInput(format!(
            "sphere distance {} is larger than the sum of the radii {}",
            d,
            big_r + r
        )));
    }
    let dd = big_r * big_r - r * r + d * d;
    let d2 = 2.0 * d;
    let x = dd / d2;
    let y = (d2 * d2 * big_r * big_r - dd * dd).sqrt() / d2;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3<f64> {
        Vector3::new(x, y, z)
    }

    #[test]
    fn test_line_with_line() {
        let l1 = [
            Line::new(p(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0)),
            Line::new(p(0.0, 0.0, 1.0), v(1.0, 1.0, 0.0)),
            Line::new(p(0.0, 0.0, 3.0), v(0.0, 1.0, 0.0)),
        ];
        let l2 = [
            Line::new(p(2.0, 0.0, 0.0), v(0.0, 1.0, 0.0)),
            Line::new(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)),
        ];
        let (x1, x2) = intersect_line_with_line(&l1, &l2, Mode::All).unwrap();
        assert_eq!(x1.shape(), (3, 2));
        assert_relative_eq!(x1[(1, 0)], p(2.0, 2.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(x2[(1, 0)], p(2.0, 2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(x1[(2, 1)], p(0.0, 0.0, 3.0), epsilon = 1e-12);
        assert!(x1[(2, 0)].x.is_nan());

        let (t1, t2) = intersect_line_with_line_times(&l1[..2], &l2, Mode::Pair).unwrap();
        assert_relative_eq!(t1[(0, 0)], 2.0, epsilon = 1e-12);
        assert_relative_eq!(t2[(1, 0)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_line_with_plane() {
        let lines = [
            Line::new(p(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0)),
            Line::new(p(0.0, 1.0, 0.0), v(0.0, 1.0, 0.0)),
            Line::new(p(0.0, 0.0, 3.0), v(0.0, 0.0, 1.0)),
        ];
        let planes = [
            Plane::new(p(1.0, 1.0, 1.0), v(1.0, 1.0, 0.0)),
            Plane::new(p(1.0, 1.0, 1.0), v(1.0, 1.0, 1.0)),
        ];
        let t = intersect_line_with_plane_times(&lines, &planes, Mode::All).unwrap();
        assert_relative_eq!(t[(0, 0)], 2.0, epsilon = 1e-12);
        assert_relative_eq!(t[(0, 1)], 3.0, epsilon = 1e-12);
        assert_relative_eq!(t[(1, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(t[(1, 1)], 2.0, epsilon = 1e-12);
        assert!(t[(2, 0)].is_infinite());
        assert_relative_eq!(t[(2, 1)], 0.0, epsilon = 1e-12);

        let x = intersect_line_with_plane(&lines[..2], &planes, Mode::Pair).unwrap();
        assert_relative_eq!(x[(0, 0)], p(2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(x[(1, 0)], p(0.0, 3.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_line_gives_infinity() {
        let line = [Line::new(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0))];
        let plane = [Plane::new(p(1.0, 1.0, 1.0), v(1.0, 1.0, 0.0))];
        let t = intersect_line_with_plane_times(&line, &plane, Mode::All).unwrap();
        assert!(t[(0, 0)].is_infinite() && t[(0, 0)] > 0.0);
    }

    #[test]
    fn test_segment_with_planes_filters_hits() {
        let segs = [
            [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0)],
            [p(0.0, 1.0, 0.0), p(0.5, 1.0, 0.0)],
        ];
        let planes = [Plane::axis(0, 1.0), Plane::axis(0, 0.25)];
        let hits = intersection_swp(&segs, &planes, Mode::All, 0.0).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!((hits[0].segment, hits[0].plane), (0, 0));
        assert_relative_eq!(hits[0].t, 0.5, epsilon = 1e-12);
        assert_eq!((hits[2].segment, hits[2].plane), (1, 1));
        assert_relative_eq!(hits[2].point, p(0.25, 1.0, 0.0), epsilon = 1e-12);

        let (t, _) = intersection_swp_all(&segs, &planes, Mode::All).unwrap();
        assert_relative_eq!(t[(1, 0)], 2.0, epsilon = 1e-12);

        let t = intersection_times_swp(&segs, &planes, Mode::Pair).unwrap();
        assert_relative_eq!(t[(1, 0)], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_segment_tolerance_keeps_end_hits() {
        let segs = [[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)]];
        let planes = [Plane::axis(0, 1.0 + 1e-9)];
        assert!(intersection_swp(&segs, &planes, Mode::Pair, 0.0).unwrap().is_empty());
        assert_eq!(intersection_swp(&segs, &planes, Mode::Pair, 1e-6).unwrap().len(), 1);
    }

    #[test]
    fn test_line_with_triangles() {
        let tris = [
            [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)],
            [p(5.0, 5.0, 1.0), p(6.0, 5.0, 1.0), p(5.0, 6.0, 1.0)],
        ];
        let lines = [
            Line::new(p(0.25, 0.25, -1.0), v(0.0, 0.0, 1.0)),
            Line::new(p(0.9, 0.9, -1.0), v(0.0, 0.0, 1.0)),
            Line::new(p(5.2, 5.2, 0.0), v(0.0, 0.0, 2.0)),
        ];
        let hits = intersection_points_lwt(&lines, &tris, Mode::All).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!((hits[0].line, hits[0].triangle), (0, 0));
        assert_relative_eq!(hits[0].point, p(0.25, 0.25, 0.0), epsilon = 1e-12);
        assert_eq!((hits[1].line, hits[1].triangle), (2, 1));

        let t = intersection_times_lwt(&lines, &tris, Mode::All).unwrap();
        assert_relative_eq!(t[(2, 1)], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_segment_with_triangles() {
        let tris = [[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)]];
        let segs = [
            [p(0.2, 0.2, -1.0), p(0.2, 0.2, 1.0)],
            [p(0.2, 0.2, 1.0), p(0.2, 0.2, 2.0)],
        ];
        let hits = intersection_points_swt(&segs, &tris, Mode::All).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 0);
        let t = intersection_times_swt(&segs, &tris, Mode::Pair).unwrap();
        assert_relative_eq!(t[(0, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(t[(1, 0)], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_three_planes() {
        let pts = intersection_points_pwp(
            &[Plane::axis(0, 1.0)],
            &[Plane::axis(1, 2.0), Plane::axis(1, -1.0)],
            &[Plane::axis(2, 3.0)],
            Mode::All,
        )
        .unwrap();
        assert_eq!(pts.len(), 2);
        assert_relative_eq!(pts[0], p(1.0, 2.0, 3.0), epsilon = 1e-12);
        assert_relative_eq!(pts[1], p(1.0, -1.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_two_planes() {
        let lines = intersection_lines_pwp(
            &[Plane::axis(0, 1.0)],
            &[Plane::axis(1, 2.0)],
            Mode::Pair,
        )
        .unwrap();
        let line = lines[(0, 0)];
        assert_relative_eq!(line.dir, v(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(line.point, p(1.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_sphere() {
        let (x, y) = intersection_sphere_sphere(1.0, 1.0, 1.0).unwrap();
        assert_relative_eq!(x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(y, 0.75f64.sqrt(), epsilon = 1e-12);
        assert!(intersection_sphere_sphere(1.0, 1.0, 2.5).is_err());
    }

    #[test]
    fn test_points_at_segments() {
        let segs = [[p(0.0, 0.0, 0.0), p(2.0, 2.0, 0.0)]];
        let pts = points_at_segments(&segs, &[0.0, 0.5, 1.0]).unwrap();
        assert_relative_eq!(pts[1], p(1.0, 1.0, 0.0));
        assert!(points_at_lines(&[], &[0.0, 1.0]).is_err());
    }
}
