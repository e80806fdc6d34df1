use crate::{Point, Spectra, Vector};

/// A mesh vertex.
///
/// The normal is the area-weighted average of the normals of the
/// elements referencing this vertex, computed once when the
/// environment is built (topology is frozen afterwards). Exitance is
/// written by vertex interpolation and tone reproduction.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub pos: Point,
    pub normal: Vector,
    pub exitance: Spectra,
}

impl Vertex {
    pub fn new(pos: Point) -> Self {
        Self {
            pos,
            normal: Vector::zero(),
            exitance: Spectra::black(),
        }
    }
}
