use crate::{Patch, Spectra};

/// A surface groups patches sharing one diffuse material.
///
/// Reflectance and emittance are fixed after construction; solver code
/// reads them but must never scale them in place (weighted averages go
/// into local accumulators).
#[derive(Debug, Clone)]
pub struct Surface {
    pub name: String,
    pub reflectance: Spectra,
    pub emittance: Spectra,
    pub patches: Vec<Patch>,
}

impl Surface {
    pub fn new(name: &str, reflectance: Spectra, emittance: Spectra, patches: Vec<Patch>) -> Self {
        Self {
            name: name.to_string(),
            reflectance,
            emittance,
            patches,
        }
    }

    /// All vertex ids referenced by this surface's patches and
    /// elements.
    pub fn vertex_ids(&self) -> Vec<usize> {
        let mut ids = Vec::new();
        for patch in &self.patches {
            ids.extend_from_slice(&patch.vertices);
            for element in &patch.elements {
                ids.extend_from_slice(&element.vertices);
            }
        }
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
