// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use formex_lite_geometry::{CutOptions, Formex, Plane, Point3, Vector3};

/// Unit square split in `2 * n * n` triangles
fn grid_triangles(n: usize) -> Formex {
    let h = 1.0 / n as f64;
    let mut tris = Vec::with_capacity(2 * n * n);
    for i in 0..n {
        for j in 0..n {
            let (x, y) = (i as f64 * h, j as f64 * h);
            let a = Point3::new(x, y, 0.0);
            let b = Point3::new(x + h, y, 0.0);
            let c = Point3::new(x + h, y + h, 0.0);
            let d = Point3::new(x, y + h, 0.0);
            tris.push([a, b, c]);
            tris.push([a, c, d]);
        }
    }
    Formex::from_triangles(&tris)
}

fn bench_cut_triangles(c: &mut Criterion) {
    let oblique = Plane::new(Point3::new(0.37, 0.0, 0.0), Vector3::new(1.0, 0.3, 0.1));
    let corner = [
        oblique,
        Plane::new(Point3::new(0.0, 0.61, 0.0), Vector3::new(-0.2, -1.0, 0.0)),
    ];
    let opts = CutOptions::default();

    let mut group = c.benchmark_group("cut_triangles");
    for n in [16, 64, 256] {
        let f = grid_triangles(n);
        group.bench_with_input(BenchmarkId::new("one_plane", n), &f, |b, f| {
            b.iter(|| black_box(f).cut_with_plane(&[oblique], &opts))
        });
        group.bench_with_input(BenchmarkId::new("two_planes", n), &f, |b, f| {
            b.iter(|| black_box(f).cut_with_plane(&corner, &opts))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cut_triangles);
criterion_main!(benches);
