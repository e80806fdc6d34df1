use anyhow::{Result, bail};

use crate::{Point, Spectra, Vector};

/// Smallest geometric unit: a triangle or quadrilateral carrying its
/// own exitance for rendering.
///
/// Area, normal and centroid are computed eagerly at construction
/// since scene topology is frozen once the environment is built.
#[derive(Debug, Clone)]
pub struct Element {
    /// 3 or 4 indices into the environment's vertex arena.
    pub vertices: Vec<usize>,
    pub area: f64,
    pub normal: Vector,
    pub center: Point,
    /// Accumulated irradiance, mutated every solver step.
    pub exitance: Spectra,
    /// Dense 0..N-1 id, assigned by `Environment::new`. Indexes
    /// form-factor arrays; stable for the duration of a solve.
    pub id: usize,
    /// Dense id of the owning patch, assigned by `Environment::new`.
    pub patch_id: usize,
}

impl Element {
    /// Builds an element over vertex ids, resolving positions through
    /// `points`.
    ///
    /// Fails on anything other than 3 or 4 vertices (malformed
    /// geometry is a configuration error) and on collapsed geometry
    /// without a well-defined normal.
    pub fn new(vertices: Vec<usize>, points: &[Point]) -> Result<Self> {
        if vertices.len() != 3 && vertices.len() != 4 {
            bail!(
                "An element requires 3 or 4 vertices, got {}",
                vertices.len()
            );
        }
        for &v in &vertices {
            if v >= points.len() {
                bail!("Vertex id {} out of range ({} points)", v, points.len());
            }
        }
        let pts: Vec<Point> = vertices.iter().map(|&v| points[v]).collect();
        let (area, normal) = polygon_area_normal(&pts)?;
        let center = Point::mean(&pts);
        Ok(Self {
            vertices,
            area,
            normal,
            center,
            exitance: Spectra::black(),
            id: 0,
            patch_id: 0,
        })
    }
}

/// Area and unit normal of a planar triangle or quad.
///
/// Quads are treated as two triangles sharing the first vertex.
pub(crate) fn polygon_area_normal(pts: &[Point]) -> Result<(f64, Vector)> {
    let mut cross_sum = Vector::zero();
    for i in 1..pts.len() - 1 {
        let v1 = pts[i] - pts[0];
        let v2 = pts[i + 1] - pts[0];
        cross_sum = cross_sum + v1.cross(v2);
    }
    let area = 0.5 * cross_sum.length();
    let normal = match cross_sum.normalize() {
        Some(n) => n,
        None => bail!("Degenerate element: vertices are collinear or coincident"),
    };
    Ok((area, normal))
}
