// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::debug;

use super::{Cut, CutOptions, Pieces, DEFAULT_ATOL_FACTOR};
use crate::error::{Error, Result};
use crate::formex::{Formex, Segment};
use crate::geomtools::{intersection_times_swp, points_at_segments, Mode};
use crate::plane::Plane;

/// Cut plex-2 elements with a single plane.
///
/// Segments with no endpoint beyond `atol` at the negative side are kept
/// whole in the positive part, and vice versa; a segment lying in the
/// plane therefore shows up in both parts. Straddling segments are split
/// at their intersection with the plane.
pub fn cut_segments(formex: &Formex, plane: &Plane, options: &CutOptions) -> Result<Cut> {
    if formex.nplex() != 2 {
        return Err(Error::PlexityMismatch {
            expected: 2,
            got: formex.nplex(),
        });
    }
    let atol = options
        .atol
        .unwrap_or_else(|| DEFAULT_ATOL_FACTOR * formex.dsize());
    let side = options.side;
    let dist = formex.distances_from_plane(plane);

    let mut positive = Pieces::new(2);
    let mut negative = Pieces::new(2);
    let mut cutting = Vec::new();
    for (i, (x, d)) in formex.elements().zip(dist.chunks_exact(2)).enumerate() {
        let above = d.iter().filter(|&&d| d > atol).count();
        let below = d.iter().filter(|&&d| d < -atol).count();
        if below == 0 && side.wants_positive() {
            positive.push(x, formex.prop(i), options.stamp(0));
        }
        if above == 0 && side.wants_negative() {
            negative.push(x, formex.prop(i), options.stamp(1));
        }
        if above > 0 && below > 0 {
            cutting.push(i);
        }
    }

    if !cutting.is_empty() {
        let segments: Vec<Segment> = cutting
            .iter()
            .map(|&i| {
                let x = formex.element(i);
                [x[0], x[1]]
            })
            .collect();
        let t = intersection_times_swp(&segments, std::slice::from_ref(plane), Mode::All)?;
        let g = points_at_segments(&segments, t.as_slice())?;
        for ((&i, seg), g) in cutting.iter().zip(&segments).zip(g) {
            let parent = formex.prop(i);
            // the endpoint at the wrong side moves to the intersection
            let first_below = dist[2 * i] < 0.0;
            let (pos, neg) = if first_below {
                ([g, seg[1]], [seg[0], g])
            } else {
                ([seg[0], g], [g, seg[1]])
            };
            if side.wants_positive() {
                positive.push(&pos, parent, options.stamp(2));
            }
            if side.wants_negative() {
                negative.push(&neg, parent, options.stamp(3));
            }
        }
    }

    debug!(
        elements = formex.nelems(),
        cut = cutting.len(),
        positive = positive.len(),
        negative = negative.len(),
        "Cut segments with plane"
    );
    Ok(Cut::from_sides(
        side,
        Some(positive.into_formex()),
        Some(negative.into_formex()),
        2,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formex::ElementProps;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    fn x_plane(x: f64) -> Plane {
        Plane::new(p(x, 0.0, 0.0), Vector3::x())
    }

    #[test]
    fn test_split_straddling_segment() {
        let f = Formex::from_segments(&[[p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0)]]);
        let cut = cut_segments(&f, &x_plane(1.0), &CutOptions::default()).unwrap();
        let (pos, neg) = cut.into_parts();
        let (pos, neg) = (pos.unwrap(), neg.unwrap());
        assert_eq!(pos.nelems(), 1);
        assert_relative_eq!(pos.element(0)[0], p(1.0, 0.0, 0.0));
        assert_relative_eq!(pos.element(0)[1], p(2.0, 0.0, 0.0));
        assert_relative_eq!(neg.element(0)[0], p(0.0, 0.0, 0.0));
        assert_relative_eq!(neg.element(0)[1], p(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_reversed_segment_keeps_orientation() {
        let f = Formex::from_segments(&[[p(3.0, 1.0, 0.0), p(-1.0, 1.0, 0.0)]]);
        let cut = cut_segments(&f, &x_plane(0.0), &CutOptions::default()).unwrap();
        let pos = cut.positive().unwrap();
        let neg = cut.negative().unwrap();
        assert_relative_eq!(pos.element(0)[0], p(3.0, 1.0, 0.0));
        assert_relative_eq!(pos.element(0)[1], p(0.0, 1.0, 0.0));
        assert_relative_eq!(neg.element(0)[0], p(0.0, 1.0, 0.0));
        assert_relative_eq!(neg.element(0)[1], p(-1.0, 1.0, 0.0));
    }

    #[test]
    fn test_untouched_and_on_plane_segments() {
        let f = Formex::from_segments(&[
            [p(2.0, 0.0, 0.0), p(3.0, 0.0, 0.0)],
            [p(-2.0, 0.0, 0.0), p(-1.0, 0.0, 0.0)],
            [p(1.0, 0.0, 0.0), p(1.0, 5.0, 0.0)],
            [p(1.0, 0.0, 0.0), p(4.0, 0.0, 0.0)],
        ]);
        let cut = cut_segments(&f, &x_plane(1.0), &CutOptions::new().atol(1e-9)).unwrap();
        let (pos, neg) = cut.into_parts();
        let (pos, neg) = (pos.unwrap(), neg.unwrap());
        assert_eq!(pos.nelems(), 3);
        assert_eq!(neg.nelems(), 2);
        assert_eq!(pos.element(1), f.element(2));
        assert_eq!(neg.element(1), f.element(2));
    }

    #[test]
    fn test_newprops_stamp_each_group() {
        let f = Formex::from_segments(&[
            [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0)],
            [p(3.0, 0.0, 0.0), p(4.0, 0.0, 0.0)],
            [p(-3.0, 0.0, 0.0), p(-4.0, 0.0, 0.0)],
        ])
        .with_props(vec![7, 8, 9])
        .unwrap();
        let opts = CutOptions::new().newprops([10i32, 11, 12, 13]);
        let (pos, neg) = cut_segments(&f, &x_plane(1.0), &opts).unwrap().into_parts();
        assert_eq!(pos.unwrap().props(), &ElementProps::Tagged(vec![10, 12]));
        assert_eq!(neg.unwrap().props(), &ElementProps::Tagged(vec![11, 13]));

        let (pos, _) = cut_segments(&f, &x_plane(1.0), &CutOptions::default())
            .unwrap()
            .into_parts();
        assert_eq!(pos.unwrap().props(), &ElementProps::Tagged(vec![8, 7]));
    }

    #[test]
    fn test_single_side() {
        let f = Formex::from_segments(&[[p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0)]]);
        let opts = CutOptions::new().side(crate::clip::Side::Negative);
        let cut = cut_segments(&f, &x_plane(0.5), &opts).unwrap();
        assert!(cut.positive().is_none());
        let neg = cut.negative().unwrap();
        assert_relative_eq!(neg.lengths().unwrap()[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_triangles() {
        let f = Formex::from_triangles(&[[p(0.0, 0.0, 0.0); 3]]);
        assert!(matches!(
            cut_segments(&f, &x_plane(0.0), &CutOptions::default()),
            Err(Error::PlexityMismatch { expected: 2, got: 3 })
        ));
    }
}
