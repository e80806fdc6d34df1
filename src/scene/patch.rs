use anyhow::{Result, bail};

use crate::scene::element::{Element, polygon_area_normal};
use crate::{Point, Spectra};
use crate::{Vector, geom::EPS};

/// A region of a surface that accumulates and redistributes radiant
/// energy as one unit during solving.
///
/// Elements subdivide the patch for finer visual sampling; a patch
/// built without explicit elements becomes its own single element.
#[derive(Debug, Clone)]
pub struct Patch {
    /// 3 or 4 indices into the environment's vertex arena.
    pub vertices: Vec<usize>,
    pub elements: Vec<Element>,
    pub area: f64,
    pub normal: Vector,
    pub center: Point,
    /// Exitance not yet redistributed to the rest of the scene.
    pub unsent: Spectra,
    /// Dense 0..P-1 id, assigned by `Environment::new`.
    pub id: usize,
}

impl Patch {
    /// Builds a patch over vertex ids, with optional subdivision
    /// elements. An empty element list makes the patch its own single
    /// element.
    pub fn new(vertices: Vec<usize>, elements: Vec<Element>, points: &[Point]) -> Result<Self> {
        if vertices.len() != 3 && vertices.len() != 4 {
            bail!("A patch requires 3 or 4 vertices, got {}", vertices.len());
        }
        for &v in &vertices {
            if v >= points.len() {
                bail!("Vertex id {} out of range ({} points)", v, points.len());
            }
        }
        let pts: Vec<Point> = vertices.iter().map(|&v| points[v]).collect();
        let (area, normal) = polygon_area_normal(&pts)?;
        let center = Point::mean(&pts);
        let elements = if elements.is_empty() {
            vec![Element::new(vertices.clone(), points)?]
        } else {
            elements
        };
        Ok(Self {
            vertices,
            elements,
            area,
            normal,
            center,
            unsent: Spectra::black(),
            id: 0,
        })
    }

    /// Unsent flux: summed band energy scaled by patch area.
    pub fn unsent_flux(&self) -> f64 {
        self.unsent.total() * self.area
    }

    /// True if the patch faces away from a viewer at `origin` (or is
    /// edge-on to it).
    pub fn is_facing_away(&self, origin: Point) -> bool {
        let view = self.center - origin;
        -self.normal.dot(view) < EPS
    }
}
