//! Flux bookkeeping shared by the iterative solvers.

use crate::Spectra;
use crate::geom::EPS;
use crate::scene::{Environment, Patch};

/// Totals over unsent patch flux, refreshed once per step.
#[derive(Debug, Clone, Default)]
pub struct FluxStats {
    /// Flux emitted into the scene at `open`, the convergence
    /// reference.
    pub total_flux: f64,
    pub total_unsent: f64,
    /// Unsent flux of the current shooter candidate.
    pub max_unsent: f64,
    /// Patch id of the candidate, if any patch still holds flux.
    pub shooter: Option<usize>,
}

impl FluxStats {
    /// Captures the emitted flux baseline. Call once after seeding.
    pub fn calc_total_flux(&mut self, env: &Environment) {
        let mut total = 0.0;
        for surface in env.surfaces() {
            let emitted = surface.emittance.total();
            for patch in &surface.patches {
                total += patch.area * emitted;
            }
        }
        self.total_flux = total;
    }

    /// Rescans unsent flux and picks the patch with the most of it as
    /// the next shooter.
    pub fn update_unsent(&mut self, env: &Environment) {
        self.total_unsent = 0.0;
        self.max_unsent = 0.0;
        self.shooter = None;
        for patch in env.patches() {
            let flux = patch.unsent_flux();
            self.total_unsent += flux;
            if flux > self.max_unsent {
                self.max_unsent = flux;
                self.shooter = Some(patch.id);
            }
        }
    }

    /// Fraction of the emitted flux still undistributed. A scene that
    /// emits no light counts as converged rather than 0/0.
    pub fn convergence(&self) -> f64 {
        if self.total_flux < EPS {
            return 0.0;
        }
        (self.total_unsent / self.total_flux).abs()
    }

    pub fn converged(&self, stop_criterion: f64) -> bool {
        self.convergence() < stop_criterion
    }
}

/// Snapshot of the shooting patch, detached from the environment so
/// the distribution pass can mutate everything else.
#[derive(Debug, Clone)]
pub struct Shooter {
    pub patch: Patch,
    /// Reflectance of the owning surface.
    pub reflectance: Spectra,
}

impl Shooter {
    pub fn capture(env: &Environment, patch_id: usize) -> Option<Self> {
        for surface in env.surfaces() {
            for patch in &surface.patches {
                if patch.id == patch_id {
                    return Some(Self {
                        patch: patch.clone(),
                        reflectance: surface.reflectance,
                    });
                }
            }
        }
        None
    }

    pub fn id(&self) -> usize {
        self.patch.id
    }

    pub fn area(&self) -> f64 {
        self.patch.area
    }
}

/// Per-band interreflection factor 1 / (1 - mean reflectance), with
/// the mean weighted by surface area.
pub fn interreflection(env: &Environment) -> Spectra {
    let mut refl_area = Spectra::black();
    let mut total_area = 0.0;
    for surface in env.surfaces() {
        let area: f64 = surface.patches.iter().map(|p| p.area).sum();
        refl_area.add(&surface.reflectance.scaled(area));
        total_area += area;
    }
    if total_area <= 0.0 {
        return Spectra::grey(1.0);
    }
    let mean = refl_area.scaled(1.0 / total_area);
    Spectra::new(
        1.0 / (1.0 - mean.r).max(f64::MIN_POSITIVE),
        1.0 / (1.0 - mean.g).max(f64::MIN_POSITIVE),
        1.0 / (1.0 - mean.b).max(f64::MIN_POSITIVE),
    )
}

/// Ambient exitance: the area-weighted mean unsent exitance, bounced
/// through the interreflection factor. A cheap stand-in for flux the
/// solver has not distributed yet.
pub fn ambient(env: &Environment) -> Spectra {
    let mut unsent_area = Spectra::black();
    let mut total_area = 0.0;
    for patch in env.patches() {
        unsent_area.add(&patch.unsent.scaled(patch.area));
        total_area += patch.area;
    }
    if total_area <= 0.0 {
        return Spectra::black();
    }
    let mean = unsent_area.scaled(1.0 / total_area);
    mean.multiplied(&interreflection(env))
}
