//! Hemicube view transforms.
//!
//! The eye sits at the patch center, one unit behind each face plane
//! of a unit hemicube aligned with the patch normal. Each face gets a
//! combined view / perspective / viewport matrix mapping scene points
//! into homogeneous clip coordinates where the face spans [0, 1] x
//! [0, 1] after perspective division.

use crate::geom::vector4::{Matrix4, Vector4};
use crate::{Point, Vector};

use super::clip::NUM_PLANES;

/// Pseudodepth of the front clipping plane.
pub const FRONT_PLANE_DEPTH: f64 = -0.99;

/// View distance treated as infinitely far (pseudodepth 1).
pub const BACK_PLANE_DEPTH: f64 = 1e10;

/// View-space distance of the front clipping plane. Sits just above
/// the patch plane so that geometry between the patch and the face
/// still projects, while blocking division blowup near the eye.
const NEAR_DISTANCE: f64 = 0.01;

/// Pseudodepth spread: q(z) = scale - spread / z, with
/// q(NEAR_DISTANCE) = FRONT_PLANE_DEPTH and q(BACK_PLANE_DEPTH) = 1.
/// Monotone in z, so smaller pseudodepth means nearer.
fn depth_spread() -> f64 {
    (1.0 - FRONT_PLANE_DEPTH) / (1.0 / NEAR_DISTANCE - 1.0 / BACK_PLANE_DEPTH)
}

fn depth_scale() -> f64 {
    1.0 + depth_spread() / BACK_PLANE_DEPTH
}

/// The five faces of a hemicube. Side faces are named from the
/// viewpoint of the base patch basis (u right, v forward, n up).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Top,
    Front,
    Right,
    Back,
    Left,
}

pub const FACES: [Face; 5] = [Face::Top, Face::Front, Face::Right, Face::Back, Face::Left];

/// Clipping planes of the hemicube frustum in clip coordinates,
/// normalized. Identical for all faces and views.
pub fn clip_planes() -> [Vector4; NUM_PLANES] {
    let front = Vector4::new(0., 0., 1., -FRONT_PLANE_DEPTH);
    let front_len = (1.0 + FRONT_PLANE_DEPTH * FRONT_PLANE_DEPTH).sqrt();
    let side_len = std::f64::consts::SQRT_2;
    [
        Vector4::new(1., 0., 0., 0.),
        Vector4::new(-1., 0., 0., 1.).scale(1.0 / side_len),
        Vector4::new(0., 1., 0., 0.),
        Vector4::new(0., -1., 0., 1.).scale(1.0 / side_len),
        front.scale(1.0 / front_len),
    ]
}

/// Per-patch view state: an orthonormal basis at the patch center and
/// the transform for the currently selected face.
#[derive(Debug, Clone)]
pub struct HemiView {
    origin: Point,
    u: Vector,
    v: Vector,
    n: Vector,
    transform: Matrix4,
}

impl HemiView {
    pub fn new() -> Self {
        Self {
            origin: Point::origin(),
            u: Vector::new(1., 0., 0.),
            v: Vector::new(0., 1., 0.),
            n: Vector::new(0., 0., 1.),
            transform: Matrix4::identity(),
        }
    }

    /// Positions the hemicube on a patch. `normal` must be unit
    /// length. The tangent basis is derived deterministically from the
    /// normal, so repeated solves see identical hemicube orientations.
    pub fn set_view(&mut self, center: Point, normal: Vector) {
        let axis = if normal.dx.abs() < 0.9 {
            Vector::new(1., 0., 0.)
        } else {
            Vector::new(0., 1., 0.)
        };
        // The axis pick guarantees the cross product is well away from
        // zero length.
        let u = normal
            .cross(axis)
            .normalize()
            .unwrap_or(Vector::new(0., 1., 0.));
        self.origin = center;
        self.u = u;
        self.v = u.cross(normal);
        self.n = normal;
        self.update_view(Face::Top);
    }

    /// Selects a face and rebuilds the combined transform. Side faces
    /// reuse the base basis with the patch normal as "up".
    pub fn update_view(&mut self, face: Face) {
        let (u, v, n) = match face {
            Face::Top => (self.u, self.v, self.n),
            Face::Front => (self.n.cross(self.u), self.n, self.u),
            Face::Right => (self.n.cross(self.v), self.n, self.v),
            Face::Back => (self.n.cross(-self.u), self.n, -self.u),
            Face::Left => (self.n.cross(-self.v), self.n, -self.v),
        };
        self.transform = build_transform(self.origin, u, v, n);
    }

    /// Transforms a scene point into clip coordinates for the current
    /// face.
    pub fn project(&self, p: Point) -> Vector4 {
        self.transform.transform(p)
    }
}

impl Default for HemiView {
    fn default() -> Self {
        Self::new()
    }
}

/// Combined transform: view rotation/translation, then perspective
/// with pseudodepth, then viewport mapping [-1, 1] to [0, 1].
fn build_transform(origin: Point, u: Vector, v: Vector, n: Vector) -> Matrix4 {
    let o = origin - Point::origin();
    let view = Matrix4::from_rows([
        [u.dx, u.dy, u.dz, -o.dot(u)],
        [v.dx, v.dy, v.dz, -o.dot(v)],
        [n.dx, n.dy, n.dz, -o.dot(n)],
        [0., 0., 0., 1.],
    ]);
    let scale = depth_scale();
    let spread = depth_spread();
    let persp = Matrix4::from_rows([
        [1., 0., 0., 0.],
        [0., 1., 0., 0.],
        [0., 0., scale, -spread],
        [0., 0., 1., 0.],
    ]);
    let viewport = Matrix4::from_rows([
        [0.5, 0., 0., 0.5],
        [0., 0.5, 0., 0.5],
        [0., 0., 1., 0.],
        [0., 0., 0., 1.],
    ]);
    viewport.mul(&persp.mul(&view))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upward_view() -> HemiView {
        let mut view = HemiView::new();
        view.set_view(Point::origin(), Vector::new(0., 0., 1.));
        view
    }

    #[test]
    fn test_top_face_center() {
        let view = upward_view();
        let v = view.project(Point::new(0., 0., 1.));
        assert!((v.x / v.w - 0.5).abs() < 1e-12);
        assert!((v.y / v.w - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_top_face_corner_ray() {
        let view = upward_view();
        // A point on the corner ray of the frustum projects to the
        // face corner at any distance.
        for s in [1.0, 2.5, 10.0] {
            let v = view.project(Point::new(s, s, s));
            let x = v.x / v.w;
            let y = v.y / v.w;
            assert!((x - 1.0).abs() < 1e-9 || x.abs() < 1e-9);
            assert!((y - 1.0).abs() < 1e-9 || y.abs() < 1e-9);
        }
    }

    #[test]
    fn test_pseudodepth_monotone() {
        let view = upward_view();
        let near = view.project(Point::new(0., 0., 0.5));
        let mid = view.project(Point::new(0., 0., 1.));
        let far = view.project(Point::new(0., 0., 100.));
        assert!(near.z / near.w < mid.z / mid.w);
        assert!(mid.z / mid.w < far.z / far.w);
        assert!(far.z / far.w < 1.0);
    }

    #[test]
    fn test_front_plane_anchor() {
        let view = upward_view();
        let v = view.project(Point::new(0., 0., 0.01));
        assert!((v.z / v.w - FRONT_PLANE_DEPTH).abs() < 1e-9);
    }

    #[test]
    fn test_side_face_above_horizon() {
        let view = upward_view();
        let mut side = view.clone();
        side.update_view(Face::Front);
        // A point above the patch plane lands in the upper half of a
        // side face.
        let v = side.project(Point::new(0., 2., 0.5));
        assert!(v.y / v.w > 0.5);
        // A point on the patch plane lands on the horizon.
        let h = side.project(Point::new(0., 2., 0.));
        assert!((h.y / h.w - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_faces_cover_distinct_directions() {
        let view = upward_view();
        // A point along +u (the base tangent) is centered on exactly
        // one side face.
        let mut centered = 0;
        for face in [Face::Front, Face::Right, Face::Back, Face::Left] {
            let mut side = view.clone();
            side.update_view(face);
            let v = side.project(Point::new(0., 0., 0.) + view.u * 2.0);
            if v.w > 0.0 && (v.x / v.w - 0.5).abs() < 1e-9 && (v.y / v.w - 0.5).abs() < 1e-9 {
                centered += 1;
            }
        }
        assert_eq!(centered, 1);
    }
}
