// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cutting plex-3 elements
//!
//! Each triangle is classified by the number of vertices lying in the
//! plane (within `atol`). Vertices in the plane are projected onto it and
//! never become the end of a new edge, so no slivers thinner than `atol`
//! are created.

use nalgebra::Point3;
use smallvec::{smallvec, SmallVec};
use tracing::{debug, trace};

use super::{Cut, CutOptions, Pieces, Side, DEFAULT_ATOL_FACTOR};
use crate::error::{Error, Result};
use crate::formex::{Formex, Nodes, Triangle};
use crate::plane::Plane;

/// Number of property slots for triangle cuts
const NSLOTS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    Positive,
    Negative,
}

/// A triangle produced from one input triangle
#[derive(Debug, Clone, Copy)]
struct Piece {
    /// Property slot, `None` for elements passed through uncut
    slot: Option<usize>,
    half: Half,
    tri: Triangle,
}

type CasePieces = SmallVec<[Piece; 3]>;

/// Point where edge `i-j` crosses the plane, from the vertex distances
#[inline]
fn edge_crossing(tri: &Triangle, d: &[f64; 3], i: usize, j: usize) -> Point3<f64> {
    tri[i] + (tri[j] - tri[i]) * (d[i] / (d[i] - d[j]))
}

/// No vertex in the plane.
///
/// The vertex alone at its side is cut off as a triangle (slot 0); the
/// remaining quadrilateral is split along the diagonal from the first
/// crossing (slots 1 and 2).
fn two_edge_crossings(tri: &Triangle, d: &[f64; 3]) -> CasePieces {
    let npos = d.iter().filter(|&&d| d > 0.0).count();
    let (iso, other) = match npos {
        1 => (Half::Positive, Half::Negative),
        2 => (Half::Negative, Half::Positive),
        _ => {
            let half = if npos == 3 { Half::Positive } else { Half::Negative };
            return smallvec![Piece { slot: None, half, tri: *tri }];
        }
    };
    let Some(k) = (0..3).find(|&j| (d[j] > 0.0) == (npos == 1)) else {
        return CasePieces::new();
    };
    // crossings in edge order 0-1, 1-2, 2-0
    let (pa, pb) = match k {
        0 => (edge_crossing(tri, d, 0, 1), edge_crossing(tri, d, 2, 0)),
        1 => (edge_crossing(tri, d, 0, 1), edge_crossing(tri, d, 1, 2)),
        _ => (edge_crossing(tri, d, 1, 2), edge_crossing(tri, d, 2, 0)),
    };
    let (k2, k3) = match k {
        0 => (2, 1),
        1 => (2, 0),
        _ => (0, 1),
    };
    smallvec![
        Piece {
            slot: Some(0),
            half: iso,
            tri: [pa, pb, tri[k]],
        },
        Piece {
            slot: Some(1),
            half: other,
            tri: [pa, pb, tri[k2]],
        },
        Piece {
            slot: Some(2),
            half: other,
            tri: [pa, tri[k2], tri[k3]],
        },
    ]
}

/// Vertex `u` in the plane.
///
/// If the other vertices are at the same side the triangle goes there
/// whole (slot 3), else it is split through `u` (slot 4).
fn one_vertex_on_plane(
    tri: &Triangle,
    d: &[f64; 3],
    u: usize,
    plane: &Plane,
    atol: f64,
) -> CasePieces {
    let k1 = plane.project(&tri[u]);
    let [a, b] = match u {
        0 => [1, 2],
        1 => [0, 2],
        _ => [0, 1],
    };
    let above = [a, b].iter().filter(|&&j| d[j] > atol).count();
    match above {
        2 => smallvec![Piece {
            slot: Some(3),
            half: Half::Positive,
            tri: [k1, tri[a], tri[b]],
        }],
        0 => smallvec![Piece {
            slot: Some(3),
            half: Half::Negative,
            tri: [k1, tri[a], tri[b]],
        }],
        _ => {
            let p = edge_crossing(tri, d, (u + 1) % 3, (u + 2) % 3);
            let (vp, vn) = if d[a] > atol { (a, b) } else { (b, a) };
            smallvec![
                Piece {
                    slot: Some(4),
                    half: Half::Positive,
                    tri: [p, k1, tri[vp]],
                },
                Piece {
                    slot: Some(4),
                    half: Half::Negative,
                    tri: [p, k1, tri[vn]],
                },
            ]
        }
    }
}

/// Vertices `a` and `b` in the plane: the triangle goes to the side of
/// the third vertex (slot 5).
fn two_vertices_on_plane(
    tri: &Triangle,
    d: &[f64; 3],
    (a, b): (usize, usize),
    plane: &Plane,
    atol: f64,
) -> CasePieces {
    let c = 3 - a - b;
    let half = if d[c] > atol {
        Half::Positive
    } else {
        Half::Negative
    };
    smallvec![Piece {
        slot: Some(5),
        half,
        tri: [plane.project(&tri[a]), plane.project(&tri[b]), tri[c]],
    }]
}

/// Triangle lying in the plane: it belongs to both sides (slot 6)
fn all_vertices_on_plane(tri: &Triangle, plane: &Plane) -> CasePieces {
    let projected = tri.map(|x| plane.project(&x));
    smallvec![
        Piece {
            slot: Some(6),
            half: Half::Positive,
            tri: projected,
        },
        Piece {
            slot: Some(6),
            half: Half::Negative,
            tri: projected,
        },
    ]
}

/// Cut every element at one plane, returning the pieces for the
/// requested sides grouped by property slot.
fn cut_at_plane(
    formex: &Formex,
    plane: &Plane,
    atol: f64,
    side: Side,
    options: &CutOptions,
) -> (Pieces, Pieces) {
    let dist = formex.distances_from_plane(plane);
    let mut cases = [0usize; 4];
    let mut produced: Vec<(usize, usize, Piece)> = Vec::with_capacity(2 * formex.nelems());
    for (i, (tri, d)) in formex.triangles().zip(dist.chunks_exact(3)).enumerate() {
        let d = [d[0], d[1], d[2]];
        let on: SmallVec<[usize; 3]> = (0..3).filter(|&j| d[j].abs() < atol).collect();
        cases[on.len()] += 1;
        let pieces = match *on.as_slice() {
            [] => two_edge_crossings(&tri, &d),
            [u] => one_vertex_on_plane(&tri, &d, u, plane, atol),
            [a, b] => two_vertices_on_plane(&tri, &d, (a, b), plane, atol),
            _ => all_vertices_on_plane(&tri, plane),
        };
        for piece in pieces {
            let wanted = match piece.half {
                Half::Positive => side.wants_positive(),
                Half::Negative => side.wants_negative(),
            };
            if wanted {
                produced.push((piece.slot.unwrap_or(NSLOTS), i, piece));
            }
        }
    }
    trace!(
        no_vertex = cases[0],
        one_vertex = cases[1],
        two_vertices = cases[2],
        three_vertices = cases[3],
        "Triangles by vertices in plane"
    );

    produced.sort_by_key(|&(key, _, _)| key);
    let mut positive = Pieces::new(3);
    let mut negative = Pieces::new(3);
    for (_, i, piece) in produced {
        let stamp = piece.slot.and_then(|s| options.stamp(s));
        let out = match piece.half {
            Half::Positive => &mut positive,
            Half::Negative => &mut negative,
        };
        out.push(&piece.tri, formex.prop(i), stamp);
    }
    (positive, negative)
}

fn check_triangles(formex: &Formex) -> Result<()> {
    if formex.nplex() == 3 {
        Ok(())
    } else {
        Err(Error::PlexityMismatch {
            expected: 3,
            got: formex.nplex(),
        })
    }
}

/// Cut every triangle at a single plane, without sorting out the
/// elements that lie entirely at one side.
///
/// Elements that do not touch the plane are passed through whole, after
/// all cut pieces and without a stamped property.
pub fn cut_elements(formex: &Formex, plane: &Plane, options: &CutOptions) -> Result<Cut> {
    check_triangles(formex)?;
    let atol = options
        .atol
        .unwrap_or_else(|| DEFAULT_ATOL_FACTOR * formex.dsize());
    let (positive, negative) = cut_at_plane(formex, plane, atol, options.side, options);
    Ok(Cut::from_sides(
        options.side,
        Some(positive.into_formex()),
        Some(negative.into_formex()),
        3,
    ))
}

/// Flags elements passing `test` for every plane
fn test_all_planes(formex: &Formex, planes: &[Plane], nodes: &Nodes, atol: f64) -> Vec<bool> {
    let mut flags = vec![true; formex.nelems()];
    for plane in planes {
        for (f, t) in flags.iter_mut().zip(formex.test(nodes, plane, atol)) {
            *f &= t;
        }
    }
    flags
}

/// Cut plex-3 elements with one or more planes.
///
/// The positive part is the region at the positive side of all planes.
/// Elements entirely at the negative side of some plane go to the
/// negative part whole. The rest is cut plane by plane: the positive
/// pieces of one plane are cut by the next one and the negative pieces
/// are collected.
pub fn cut_triangles(formex: &Formex, planes: &[Plane], options: &CutOptions) -> Result<Cut> {
    check_triangles(formex)?;
    if planes.is_empty() {
        return Err(Error::NoPlanes);
    }
    let atol = options
        .atol
        .unwrap_or_else(|| DEFAULT_ATOL_FACTOR * formex.dsize());
    let side = options.side;

    let keep = test_all_planes(formex, planes, &Nodes::Any, atol);
    let kept = formex.clip(&keep);
    let mut negative = Pieces::new(3);
    if side.wants_negative() {
        negative.extend(&formex.cclip(&keep), None);
    }

    // strictly positive for every plane
    let inside = test_all_planes(&kept, planes, &Nodes::All, -atol);
    let mut positive = Pieces::new(3);
    if side.wants_positive() {
        positive.extend(&kept.clip(&inside), None);
    }

    let mut survivors = kept.cclip(&inside);
    let ncut = survivors.nelems();
    for (i, plane) in planes.iter().enumerate() {
        if survivors.is_empty() {
            break;
        }
        if i > 0 {
            // projections onto earlier planes may leave elements fully
            // at the negative side of this one
            let front = survivors.test(&Nodes::Any, plane, atol);
            if side.wants_negative() {
                negative.extend(&survivors.cclip(&front), None);
            }
            survivors = survivors.clip(&front);
        }
        let front = survivors.test(&Nodes::All, plane, -atol);
        let mut next = survivors.clip(&front);
        let cutting = survivors.cclip(&front);

        let more_planes = i + 1 < planes.len();
        let plane_side = match (side.wants_positive() || more_planes, side.wants_negative()) {
            (true, false) => Side::Positive,
            (false, true) => Side::Negative,
            _ => Side::Both,
        };
        let (cut_pos, cut_neg) = cut_at_plane(&cutting, plane, atol, plane_side, options);
        trace!(
            plane = i,
            cut = cutting.nelems(),
            positive = cut_pos.len(),
            negative = cut_neg.len(),
            "Cut triangles at plane"
        );
        if side.wants_negative() {
            negative.append(cut_neg);
        }
        next.append(&cut_pos.into_formex())?;
        survivors = next;
    }
    if side.wants_positive() {
        positive.extend(&survivors, None);
    }

    debug!(
        elements = formex.nelems(),
        planes = planes.len(),
        cut = ncut,
        positive = positive.len(),
        negative = negative.len(),
        "Cut triangles with planes"
    );
    Ok(Cut::from_sides(
        side,
        Some(positive.into_formex()),
        Some(negative.into_formex()),
        3,
    ))
}
