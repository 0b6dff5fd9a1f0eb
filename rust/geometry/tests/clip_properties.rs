// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use formex_lite_geometry::{CutOptions, Formex, Plane, Point3, Vector3};
use proptest::collection::vec;
use proptest::prelude::*;

const ATOL: f64 = 1e-9;

fn point() -> impl Strategy<Value = Point3<f64>> {
    (-5.0f64..5.0, -5.0f64..5.0, -5.0f64..5.0).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

/// Point with an x coordinate at least 0.1 away from 0, at the given side
fn point_at(positive: bool) -> impl Strategy<Value = Point3<f64>> {
    (0.1f64..5.0, -5.0f64..5.0, -5.0f64..5.0).prop_map(move |(x, y, z)| {
        Point3::new(if positive { x } else { -x }, y, z)
    })
}

fn straddling_segment() -> impl Strategy<Value = [Point3<f64>; 2]> {
    (any::<bool>(), point_at(true), point_at(false))
        .prop_map(|(flip, a, b)| if flip { [b, a] } else { [a, b] })
}

fn straddling_triangle() -> impl Strategy<Value = [Point3<f64>; 3]> {
    (point_at(true), point_at(false), point(), 0usize..3).prop_map(|(a, b, c, rot)| {
        let mut tri = [a, b, c];
        tri.rotate_left(rot);
        tri
    })
}

fn sum(values: Vec<f64>) -> f64 {
    values.iter().sum()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-7 * (1.0 + a.abs().max(b.abs()))
}

fn x_plane() -> Plane {
    Plane::new(Point3::origin(), Vector3::x())
}

proptest! {
    #[test]
    fn prop_segment_cut_keeps_length(segs in vec(straddling_segment(), 1..20)) {
        let f = Formex::from_segments(&segs);
        let cut = f.cut_with_plane(&[x_plane()], &CutOptions::new().atol(ATOL)).unwrap();
        let pos = cut.positive().unwrap();
        let neg = cut.negative().unwrap();
        prop_assert_eq!(pos.nelems(), segs.len());
        prop_assert_eq!(neg.nelems(), segs.len());
        let before = sum(f.lengths().unwrap());
        let after = sum(pos.lengths().unwrap()) + sum(neg.lengths().unwrap());
        prop_assert!(close(before, after), "{} != {}", before, after);
        prop_assert!(pos.coords().iter().all(|p| p.x >= -ATOL));
        prop_assert!(neg.coords().iter().all(|p| p.x <= ATOL));
    }

    #[test]
    fn prop_triangle_cut_keeps_area(tris in vec(straddling_triangle(), 1..20)) {
        let f = Formex::from_triangles(&tris);
        let cut = f.cut_with_plane(&[x_plane()], &CutOptions::new().atol(ATOL)).unwrap();
        let pos = cut.positive().unwrap();
        let neg = cut.negative().unwrap();
        let before = sum(f.areas().unwrap());
        let after = sum(pos.areas().unwrap()) + sum(neg.areas().unwrap());
        prop_assert!(close(before, after), "{} != {}", before, after);
        prop_assert!(pos.coords().iter().all(|p| p.x >= -ATOL));
        prop_assert!(neg.coords().iter().all(|p| p.x <= ATOL));
    }

    #[test]
    fn prop_two_planes_commute(
        tris in vec((point(), point(), point()).prop_map(|(a, b, c)| [a, b, c]), 1..12),
        a in -2.0f64..2.0,
        b in -2.0f64..2.0,
    ) {
        let f = Formex::from_triangles(&tris);
        let p1 = Plane::axis(0, a);
        let p2 = Plane::new(Point3::new(0.0, b, 0.0), Vector3::new(0.0, -1.0, 1.0));
        let opts = CutOptions::new().atol(ATOL);
        let c12 = f.cut_with_plane(&[p1, p2], &opts).unwrap();
        let c21 = f.cut_with_plane(&[p2, p1], &opts).unwrap();
        let pos12 = sum(c12.positive().unwrap().areas().unwrap());
        let pos21 = sum(c21.positive().unwrap().areas().unwrap());
        prop_assert!(close(pos12, pos21), "{} != {}", pos12, pos21);

        let total = sum(f.areas().unwrap());
        let neg12 = sum(c12.negative().unwrap().areas().unwrap());
        prop_assert!(close(total, pos12 + neg12), "{} != {} + {}", total, pos12, neg12);
    }
}
