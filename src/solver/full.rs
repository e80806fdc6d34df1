//! Full matrix radiosity.
//!
//! Computes the complete patch-to-element form factor matrix up front
//! (one hemicube per patch, in parallel), then iterates Jacobi style:
//! every patch shoots its unsent exitance from the same snapshot each
//! step. Converges smoothly but pays the full matrix cost before the
//! first step.

use anyhow::Result;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::Spectra;
use crate::ff::{FormFactors, HemiCube};
use crate::scene::{Environment, Patch};

use super::stats::FluxStats;
use super::{RadiositySolver, SolverConfig, seed_exitances, stats, tone};

pub struct FullSolver {
    config: SolverConfig,
    /// Form factor rows indexed by patch id, then element id.
    ff: Vec<Vec<f64>>,
    stats: FluxStats,
    steps: usize,
}

impl FullSolver {
    pub fn new(config: SolverConfig) -> Result<Self> {
        // Validate the resolution before open pays for a full matrix.
        HemiCube::new(config.resolution)?;
        Ok(Self {
            config,
            ff: Vec::new(),
            stats: FluxStats::default(),
            steps: 0,
        })
    }

    pub fn step_count(&self) -> usize {
        self.steps
    }

    pub fn convergence(&self) -> f64 {
        self.stats.convergence()
    }
}

impl RadiositySolver for FullSolver {
    fn open(&mut self, env: &mut Environment) -> Result<()> {
        seed_exitances(env);
        self.stats = FluxStats::default();
        self.stats.calc_total_flux(env);
        self.steps = 0;

        let shooters: Vec<Patch> = env.patches().cloned().collect();
        let resolution = self.config.resolution;
        let elements = env.element_count();
        let env_ref: &Environment = env;
        self.ff = shooters
            .par_iter()
            .map(|patch| -> Result<Vec<f64>> {
                let mut hemicube = HemiCube::new(resolution)?;
                let mut row = vec![0.0; elements];
                hemicube.calculate_form_factors(patch, env_ref, &mut row);
                Ok(row)
            })
            .collect::<Result<Vec<_>>>()?;
        info!(
            patches = env.patch_count(),
            elements,
            "form factor matrix ready"
        );
        Ok(())
    }

    fn step(&mut self, env: &mut Environment) -> Result<bool> {
        self.stats.update_unsent(env);
        if self.stats.converged(self.config.stop_criterion) || self.steps >= self.config.max_steps
        {
            return Ok(true);
        }

        // Jacobi: all patches shoot from the same unsent snapshot.
        let shooters: Vec<(usize, f64, Spectra)> = env
            .patches()
            .map(|p| (p.id, p.area, p.unsent))
            .collect();
        let mut element_delta = vec![Spectra::black(); env.element_count()];
        let mut patch_delta = vec![Spectra::black(); env.patch_count()];
        for surface in env.surfaces() {
            let reflectance = surface.reflectance;
            for patch in &surface.patches {
                for element in &patch.elements {
                    for &(sid, s_area, s_unsent) in &shooters {
                        if sid == patch.id {
                            continue;
                        }
                        let f = self.ff[sid][element.id];
                        if f <= 0.0 {
                            continue;
                        }
                        let rff = (f * s_area / element.area).min(1.0);
                        let delta = reflectance.multiplied(&s_unsent).scaled(rff);
                        element_delta[element.id].add(&delta);
                        patch_delta[patch.id].add(&delta.scaled(element.area / patch.area));
                    }
                }
            }
        }

        for instance in env.instances.iter_mut() {
            for surface in instance.surfaces.iter_mut() {
                for patch in surface.patches.iter_mut() {
                    patch.unsent = patch_delta[patch.id];
                    for element in patch.elements.iter_mut() {
                        element.exitance.add(&element_delta[element.id]);
                    }
                }
            }
        }

        self.steps += 1;
        self.stats.update_unsent(env);
        debug!(
            step = self.steps,
            convergence = self.stats.convergence(),
            "jacobi sweep"
        );
        Ok(self.stats.converged(self.config.stop_criterion)
            || self.steps >= self.config.max_steps)
    }

    fn close(&mut self, env: &mut Environment) {
        let ambient = self.config.ambient.then(|| stats::ambient(env));
        tone::shade(env, ambient);
        info!(
            steps = self.steps,
            convergence = self.stats.convergence(),
            "full matrix solve closed"
        );
    }
}
