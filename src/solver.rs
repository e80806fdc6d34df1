//! Radiosity equation solvers.
//!
//! All solvers share the same lifecycle: `open` seeds the solution
//! from surface emittances, repeated `step` calls redistribute flux
//! until convergence, `close` turns the solution into displayable
//! vertex exitances.

pub mod full;
pub mod progressive;
pub mod ray;
pub mod stats;
pub mod tone;

pub use full::FullSolver;
pub use progressive::ProgressiveSolver;
pub use ray::RaySolver;

use anyhow::Result;

use crate::ff::hemicube::DEFAULT_RESOLUTION;
use crate::ff::raycast::DEFAULT_NUM_RAYS;
use crate::scene::Environment;

/// Step-driven radiosity solver.
pub trait RadiositySolver {
    /// Seeds the solution from surface emittances and prepares any
    /// per-solve state.
    fn open(&mut self, env: &mut Environment) -> Result<()>;

    /// Runs one solution step. Returns true once the solution has
    /// converged or the step limit is reached.
    fn step(&mut self, env: &mut Environment) -> Result<bool>;

    /// Finalizes vertex exitances for display.
    fn close(&mut self, env: &mut Environment);
}

/// Runs a solver to completion.
pub fn solve(solver: &mut dyn RadiositySolver, env: &mut Environment) -> Result<()> {
    solver.open(env)?;
    while !solver.step(env)? {}
    solver.close(env);
    Ok(())
}

/// Parameters shared by the solvers. Unused fields are ignored (for
/// example the hemicube resolution by the ray solver).
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Hard cap on solution steps.
    pub max_steps: usize,
    /// Convergence threshold on |unsent flux| / |total flux|.
    pub stop_criterion: f64,
    /// Add an ambient estimate of the not-yet-distributed flux when
    /// shading.
    pub ambient: bool,
    /// Positive overshooting: shoot flux the shooter is yet to
    /// receive, speeding up convergence.
    pub overshoot: bool,
    /// Hemicube cells per face edge (even).
    pub resolution: usize,
    /// Monte Carlo rays per vertex for the ray-based solvers.
    pub rays_per_vertex: usize,
    /// Seed for the ray-based solvers.
    pub seed: u64,
}

impl SolverConfig {
    pub fn new() -> Self {
        Self {
            max_steps: 100,
            stop_criterion: 1e-3,
            ambient: false,
            overshoot: false,
            resolution: DEFAULT_RESOLUTION,
            rays_per_vertex: DEFAULT_NUM_RAYS,
            seed: 0,
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Seeds patch unsent exitance and element exitance from surface
/// emittances and clears vertex exitances.
pub(crate) fn seed_exitances(env: &mut Environment) {
    for instance in env.instances.iter_mut() {
        for surface in instance.surfaces.iter_mut() {
            let emittance = surface.emittance;
            for patch in surface.patches.iter_mut() {
                patch.unsent = emittance;
                for element in patch.elements.iter_mut() {
                    element.exitance = emittance;
                }
            }
        }
    }
    for vertex in env.vertices.iter_mut() {
        vertex.exitance.reset();
    }
}
