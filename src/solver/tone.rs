//! Tone reproduction: turning solved exitances into displayable
//! vertex colors.

use crate::Spectra;
use crate::scene::Environment;

/// Largest displayable band value; everything above is rescaled.
pub const MAX_EXITANCE: f64 = 254.0 / 255.0;

/// Full shading pass used by the element-based solvers.
pub fn shade(env: &mut Environment, ambient: Option<Spectra>) {
    interpolate(env);
    if let Some(a) = ambient {
        add_ambient(env, a);
    }
    normalize(env);
}

/// Preview without light transport: every vertex shows its surface
/// reflectance. Useful for checking materials before a solve.
pub fn preview(env: &mut Environment) {
    let mut colors: Vec<(usize, Spectra)> = Vec::new();
    for surface in env.surfaces() {
        for v in surface.vertex_ids() {
            colors.push((v, surface.reflectance));
        }
    }
    for (v, color) in colors {
        env.vertices[v].exitance = color;
    }
}

/// Sets each vertex exitance to the mean of its adjacent element
/// exitances. Vertices belong to exactly one surface, so no bleeding
/// across material boundaries can occur.
pub fn interpolate(env: &mut Environment) {
    let mut sums = vec![Spectra::black(); env.vertex_count()];
    let mut counts = vec![0usize; env.vertex_count()];
    for element in env.elements() {
        for &v in &element.vertices {
            sums[v].add(&element.exitance);
            counts[v] += 1;
        }
    }
    for (vertex, (sum, count)) in env.vertices.iter_mut().zip(sums.into_iter().zip(counts)) {
        if count > 0 {
            vertex.exitance = sum.scaled(1.0 / count as f64);
        }
    }
}

/// Adds the ambient term to every vertex, filtered through its
/// surface reflectance.
pub fn add_ambient(env: &mut Environment, ambient: Spectra) {
    let mut terms: Vec<(usize, Spectra)> = Vec::new();
    for surface in env.surfaces() {
        let term = ambient.multiplied(&surface.reflectance);
        for v in surface.vertex_ids() {
            terms.push((v, term));
        }
    }
    for (v, term) in terms {
        env.vertices[v].exitance.add(&term);
    }
}

/// Rescales vertex and element exitances so no band exceeds
/// [`MAX_EXITANCE`]. Solutions already in range are left untouched.
pub fn normalize(env: &mut Environment) {
    let max = env
        .vertices
        .iter()
        .map(|v| v.exitance.max_band())
        .fold(0.0, f64::max);
    if max <= MAX_EXITANCE {
        return;
    }
    let s = MAX_EXITANCE / max;
    for vertex in env.vertices.iter_mut() {
        vertex.exitance.scale(s);
    }
    for instance in env.instances.iter_mut() {
        for surface in instance.surfaces.iter_mut() {
            for patch in surface.patches.iter_mut() {
                for element in patch.elements.iter_mut() {
                    element.exitance.scale(s);
                }
            }
        }
    }
}
