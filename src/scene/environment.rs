use std::collections::HashSet;

use anyhow::{Result, bail};

use crate::geom::bboxes::bounding_box;
use crate::{Element, Instance, Patch, Point, Spectra, Surface, Vertex};

/// The complete scene: a vertex arena plus object instances.
///
/// `Environment::new` freezes the topology: it validates vertex ids,
/// rejects cross-surface vertex sharing, assigns dense patch and
/// element ids (stable for the whole solve; element ids index
/// form-factor arrays) and computes area-weighted vertex normals.
/// After that, solvers only mutate exitance fields.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vertices: Vec<Vertex>,
    pub instances: Vec<Instance>,
    element_count: usize,
    patch_count: usize,
}

impl Environment {
    pub fn new(points: Vec<Point>, mut instances: Vec<Instance>) -> Result<Self> {
        if points.is_empty() {
            bail!("Environment requires at least one vertex");
        }

        // Validate all vertex references against the arena.
        for instance in &instances {
            for surface in &instance.surfaces {
                for patch in &surface.patches {
                    for element in &patch.elements {
                        for &v in patch.vertices.iter().chain(element.vertices.iter()) {
                            if v >= points.len() {
                                bail!(
                                    "Vertex id {} out of range in surface '{}'",
                                    v,
                                    surface.name
                                );
                            }
                        }
                    }
                }
            }
        }

        if let Some((a, b)) = shared_vertex_surfaces(&instances) {
            bail!("Surfaces '{}' and '{}' share vertices", a, b);
        }

        // Dense numbering of patches and elements.
        let mut element_count = 0;
        let mut patch_count = 0;
        for instance in instances.iter_mut() {
            for surface in instance.surfaces.iter_mut() {
                for patch in surface.patches.iter_mut() {
                    patch.id = patch_count;
                    patch_count += 1;
                    for element in patch.elements.iter_mut() {
                        element.id = element_count;
                        element.patch_id = patch.id;
                        element_count += 1;
                    }
                }
            }
        }

        let mut env = Self {
            vertices: points.into_iter().map(Vertex::new).collect(),
            instances,
            element_count,
            patch_count,
        };
        env.compute_vertex_normals();
        Ok(env)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn patch_count(&self) -> usize {
        self.patch_count
    }

    pub fn surface_count(&self) -> usize {
        self.instances.iter().map(|i| i.surfaces.len()).sum()
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.instances.iter().flat_map(|i| i.surfaces.iter())
    }

    pub fn patches(&self) -> impl Iterator<Item = &Patch> {
        self.surfaces().flat_map(|s| s.patches.iter())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.patches().flat_map(|p| p.elements.iter())
    }

    /// Bounding box over all vertices.
    pub fn bounding_box(&self) -> (Point, Point) {
        let pts: Vec<Point> = self.vertices.iter().map(|v| v.pos).collect();
        bounding_box(&pts)
    }

    /// Snapshot of per-element exitance, indexed by element id.
    ///
    /// Valid to call between solver steps for progressive display.
    pub fn element_exitances(&self) -> Vec<Spectra> {
        let mut out = vec![Spectra::black(); self.element_count];
        for element in self.elements() {
            out[element.id] = element.exitance;
        }
        out
    }

    /// Snapshot of per-vertex exitance.
    pub fn vertex_exitances(&self) -> Vec<Spectra> {
        self.vertices.iter().map(|v| v.exitance).collect()
    }

    /// Area-weighted average of adjacent element normals, per vertex.
    ///
    /// Vertices referenced by no element keep a zero normal.
    fn compute_vertex_normals(&mut self) {
        let mut sums = vec![crate::Vector::zero(); self.vertices.len()];
        for instance in &self.instances {
            for surface in &instance.surfaces {
                for patch in &surface.patches {
                    for element in &patch.elements {
                        let weighted = element.normal * element.area;
                        for &v in &element.vertices {
                            sums[v] = sums[v] + weighted;
                        }
                    }
                }
            }
        }
        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            if let Some(n) = sum.normalize() {
                vertex.normal = n;
            }
        }
    }
}

/// Returns the names of the first pair of surfaces found referencing a
/// common vertex id, if any.
fn shared_vertex_surfaces(instances: &[Instance]) -> Option<(String, String)> {
    let mut seen: Vec<(&str, HashSet<usize>)> = Vec::new();
    for instance in instances {
        for surface in &instance.surfaces {
            let ids: HashSet<usize> = surface.vertex_ids().into_iter().collect();
            for (other_name, other_ids) in &seen {
                if !ids.is_disjoint(other_ids) {
                    return Some((other_name.to_string(), surface.name.clone()));
                }
            }
            seen.push((&surface.name, ids));
        }
    }
    None
}
