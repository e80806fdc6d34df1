//! Streaming Sutherland-Hodgman clipping in homogeneous coordinates.
//!
//! Five plane stages are chained: vertices flow through one stage at a
//! time and survivors (plus edge-plane intersections) are handed to the
//! next, so no intermediate polygon is ever materialized.

use crate::geom::EPS;
use crate::geom::vector4::Vector4;

use super::poly::ClipPoly;

pub const NUM_PLANES: usize = 5;

/// One clipping stage. Remembers the first vertex seen (to close the
/// polygon) and the previous vertex (to detect plane crossings).
#[derive(Debug, Clone, Copy)]
struct ClipEdge {
    plane: Vector4,
    first: Option<Vector4>,
    first_inside: bool,
    start: Option<Vector4>,
    start_inside: bool,
}

impl ClipEdge {
    fn new(plane: Vector4) -> Self {
        Self {
            plane,
            first: None,
            first_inside: false,
            start: None,
            start_inside: false,
        }
    }

    fn is_inside(&self, v: Vector4) -> bool {
        self.plane.dot(v) >= 0.0
    }

    /// Intersection of segment `s`-`e` with the plane. None if the
    /// segment runs (numerically) parallel to it.
    fn intersect(&self, s: Vector4, e: Vector4) -> Option<Vector4> {
        let dir = e - s;
        let d = self.plane.dot(dir);
        if d.abs() < EPS {
            return None;
        }
        let t = -self.plane.dot(s) / d;
        Some(s + dir.scale(t))
    }
}

/// Chain of five clipping stages ending in a [`ClipPoly`].
#[derive(Debug, Clone)]
pub struct Clipper {
    edges: [ClipEdge; NUM_PLANES],
}

impl Clipper {
    pub fn new(planes: [Vector4; NUM_PLANES]) -> Self {
        Self {
            edges: planes.map(ClipEdge::new),
        }
    }

    /// Clips a convex polygon given in homogeneous coordinates,
    /// writing the surviving polygon into `out`. Returns the number of
    /// output vertices (0 when fully clipped away).
    pub fn clip(&mut self, verts: &[Vector4], out: &mut ClipPoly) -> usize {
        out.reset();
        for &v in verts {
            self.put(0, v, out);
        }
        self.close(0, out);
        out.len()
    }

    fn put(&mut self, stage: usize, v: Vector4, out: &mut ClipPoly) {
        if stage == NUM_PLANES {
            out.add_vertex(v);
            return;
        }
        let edge = self.edges[stage];
        let inside = edge.is_inside(v);
        let mut crossing = None;
        match edge.start {
            None => {
                self.edges[stage].first = Some(v);
                self.edges[stage].first_inside = inside;
            }
            Some(start) => {
                if inside != edge.start_inside {
                    crossing = edge.intersect(start, v);
                }
            }
        }
        self.edges[stage].start = Some(v);
        self.edges[stage].start_inside = inside;
        if let Some(c) = crossing {
            self.put(stage + 1, c, out);
        }
        if inside {
            self.put(stage + 1, v, out);
        }
    }

    /// Closes every stage in order: the closing edge of stage `n` may
    /// emit an intersection that stage `n + 1` still has to see before
    /// it closes itself.
    fn close(&mut self, stage: usize, out: &mut ClipPoly) {
        if stage == NUM_PLANES {
            return;
        }
        let edge = self.edges[stage];
        if let (Some(first), Some(start)) = (edge.first, edge.start) {
            if edge.first_inside != edge.start_inside {
                if let Some(c) = edge.intersect(start, first) {
                    self.put(stage + 1, c, out);
                }
            }
        }
        self.edges[stage].first = None;
        self.edges[stage].start = None;
        self.close(stage + 1, out);
    }
}
