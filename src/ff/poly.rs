//! Output polygon of the clipping pipeline.

use arrayvec::ArrayVec;

use crate::geom::EPS;
use crate::geom::vector4::Vector4;

/// A convex polygon clipped against five planes gains at most one
/// vertex per plane, so a quad can never exceed nine vertices.
pub const MAX_VERTICES: usize = 10;

/// A polygon vertex after perspective division: normalized face
/// coordinates in [0, 1] plus pseudodepth (smaller is nearer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolyVertex {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

/// Clipped polygon in normalized device coordinates.
///
/// Vertices arrive in homogeneous form from the last clipping stage;
/// perspective division happens on insertion.
#[derive(Debug, Clone, Default)]
pub struct ClipPoly {
    verts: ArrayVec<PolyVertex, MAX_VERTICES>,
}

impl ClipPoly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.verts.clear();
    }

    pub fn len(&self) -> usize {
        self.verts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    pub fn vertices(&self) -> &[PolyVertex] {
        &self.verts
    }

    /// Divides through by `w` and appends. Vertices on the eye plane
    /// (near-zero `w`) are dropped; the front clipping plane keeps
    /// legitimate geometry well away from it.
    pub fn add_vertex(&mut self, v: Vector4) {
        if self.verts.is_full() || v.w.abs() < EPS {
            return;
        }
        self.verts.push(PolyVertex {
            x: v.x / v.w,
            y: v.y / v.w,
            depth: v.z / v.w,
        });
    }
}
