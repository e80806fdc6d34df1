//! Homogeneous coordinates for projective transforms.
//!
//! `Vector4` carries the homogeneous `w` used by the hemicube clipping
//! pipeline; `Matrix4` composes view, perspective and viewport
//! transforms by premultiplication.

use crate::Point;
use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Vector4 {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub fn from_point(p: Point) -> Self {
        Self::new(p.x, p.y, p.z, 1.0)
    }

    /// Dot product over all four components.
    ///
    /// With `self` interpreted as a plane equation, the sign tells on
    /// which side of the plane the homogeneous point `other` lies.
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Scales all four components.
    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }
}

impl Add for Vector4 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
            self.w + other.w,
        )
    }
}

impl Sub for Vector4 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(
            self.x - other.x,
            self.y - other.y,
            self.z - other.z,
            self.w - other.w,
        )
    }
}

/// Row-major 4x4 transformation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    pub m: [[f64; 4]; 4],
}

impl Matrix4 {
    pub fn identity() -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { m }
    }

    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self { m: rows }
    }

    /// Matrix product `self * other` (apply `other` first).
    pub fn mul(&self, other: &Self) -> Self {
        let mut out = [[0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.m[i][k] * other.m[k][j];
                }
                out[i][j] = sum;
            }
        }
        Self { m: out }
    }

    /// Transforms a point into homogeneous coordinates.
    pub fn transform(&self, p: Point) -> Vector4 {
        let v = [p.x, p.y, p.z, 1.0];
        let mut out = [0.0; 4];
        for (i, row) in self.m.iter().enumerate() {
            out[i] = row[0] * v[0] + row[1] * v[1] + row[2] * v[2] + row[3] * v[3];
        }
        Vector4::new(out[0], out[1], out[2], out[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let m = Matrix4::identity();
        let p = Point::new(1., 2., 3.);
        let v = m.transform(p);
        assert_eq!(v, Vector4::new(1., 2., 3., 1.));
    }

    #[test]
    fn test_mul_applies_right_first() {
        // Scale by 2, then translate x by 1.
        let scale = Matrix4::from_rows([
            [2., 0., 0., 0.],
            [0., 2., 0., 0.],
            [0., 0., 2., 0.],
            [0., 0., 0., 1.],
        ]);
        let translate = Matrix4::from_rows([
            [1., 0., 0., 1.],
            [0., 1., 0., 0.],
            [0., 0., 1., 0.],
            [0., 0., 0., 1.],
        ]);
        let m = translate.mul(&scale);
        let v = m.transform(Point::new(1., 1., 1.));
        assert_eq!(v, Vector4::new(3., 2., 2., 1.));
    }

    #[test]
    fn test_plane_dot_sign() {
        // Plane x >= 0 in homogeneous form.
        let plane = Vector4::new(1., 0., 0., 0.);
        let inside = Vector4::from_point(Point::new(0.5, 0., 0.));
        let outside = Vector4::from_point(Point::new(-0.5, 0., 0.));
        assert!(plane.dot(inside) > 0.);
        assert!(plane.dot(outside) < 0.);
    }
}
