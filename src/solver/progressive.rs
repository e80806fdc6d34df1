//! Progressive refinement radiosity.
//!
//! Each step the patch with the most unsent flux shoots it into the
//! scene through a hemicube. Optional positive overshooting also
//! shoots an estimate of the flux the shooter is still going to
//! receive, which cuts the number of steps in brightly lit scenes.

use anyhow::{Result, anyhow};
use tracing::{debug, info};

use crate::Spectra;
use crate::ff::{FormFactors, HemiCube};
use crate::scene::Environment;

use super::stats::{FluxStats, Shooter};
use super::{RadiositySolver, SolverConfig, seed_exitances, stats, tone};

pub struct ProgressiveSolver {
    config: SolverConfig,
    ffs: HemiCube,
    ff: Vec<f64>,
    stats: FluxStats,
    steps: usize,
}

impl ProgressiveSolver {
    pub fn new(config: SolverConfig) -> Result<Self> {
        let ffs = HemiCube::new(config.resolution)?;
        Ok(Self {
            config,
            ffs,
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

    /// Flux the shooter is still owed by the rest of the scene,
    /// estimated from positive unsent exitances through the already
    /// computed form factors.
    fn overshoot_term(&self, env: &Environment, shooter: &Shooter) -> Spectra {
        let mut unsent = vec![Spectra::black(); env.patch_count()];
        for patch in env.patches() {
            unsent[patch.id] = patch.unsent;
        }
        let mut term = Spectra::black();
        for element in env.elements() {
            if element.patch_id == shooter.id() {
                continue;
            }
            term.add(&unsent[element.patch_id].clamped_positive().scaled(self.ff[element.id]));
        }
        term.multiplied(&shooter.reflectance)
    }
}

impl RadiositySolver for ProgressiveSolver {
    fn open(&mut self, env: &mut Environment) -> Result<()> {
        seed_exitances(env);
        self.ff = vec![0.0; env.element_count()];
        self.stats = FluxStats::default();
        self.stats.calc_total_flux(env);
        self.steps = 0;
        info!(
            patches = env.patch_count(),
            elements = env.element_count(),
            "progressive solve opened"
        );
        Ok(())
    }

    fn step(&mut self, env: &mut Environment) -> Result<bool> {
        self.stats.update_unsent(env);
        if self.stats.converged(self.config.stop_criterion) || self.steps >= self.config.max_steps
        {
            return Ok(true);
        }
        let Some(id) = self.stats.shooter else {
            return Ok(true);
        };
        let shooter =
            Shooter::capture(env, id).ok_or_else(|| anyhow!("no patch with id {id}"))?;

        self.ffs
            .calculate_form_factors(&shooter.patch, env, &mut self.ff);

        let mut shoot = shooter.patch.unsent;
        let mut overshoot = Spectra::black();
        if self.config.overshoot {
            overshoot = self.overshoot_term(env, &shooter);
            shoot.add(&overshoot);
        }

        distribute(env, &shooter, shoot, &self.ff);
        reset_shooter(env, id, overshoot);

        self.steps += 1;
        self.stats.update_unsent(env);
        debug!(
            step = self.steps,
            shooter = id,
            convergence = self.stats.convergence(),
            "distributed flux"
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
            "progressive solve closed"
        );
    }
}

/// Delivers the shot exitance to every visible element and rolls the
/// received share up into the owning patches' unsent totals.
fn distribute(env: &mut Environment, shooter: &Shooter, shoot: Spectra, ff: &[f64]) {
    let shoot_area = shooter.area();
    for instance in env.instances.iter_mut() {
        for surface in instance.surfaces.iter_mut() {
            let reflectance = surface.reflectance;
            for patch in surface.patches.iter_mut() {
                if patch.id == shooter.id() {
                    continue;
                }
                let patch_area = patch.area;
                let mut received = Spectra::black();
                for element in patch.elements.iter_mut() {
                    let f = ff[element.id];
                    if f <= 0.0 {
                        continue;
                    }
                    // Reciprocal form factor, bounded for receivers
                    // smaller than the shooter.
                    let rff = (f * shoot_area / element.area).min(1.0);
                    let delta = reflectance.multiplied(&shoot).scaled(rff);
                    element.exitance.add(&delta);
                    received.add(&delta.scaled(element.area / patch_area));
                }
                patch.unsent.add(&received);
            }
        }
    }
}

/// The shooter has spent its flux; with overshooting it is left owing
/// the overshot amount.
fn reset_shooter(env: &mut Environment, id: usize, overshoot: Spectra) {
    for instance in env.instances.iter_mut() {
        for surface in instance.surfaces.iter_mut() {
            for patch in surface.patches.iter_mut() {
                if patch.id == id {
                    patch.unsent.reset();
                    patch.unsent.sub(&overshoot);
                    return;
                }
            }
        }
    }
}
