//! Form factor determination.
//!
//! A form factor is the fraction of diffuse radiant flux leaving one
//! patch that arrives at an element. Two interchangeable strategies are
//! provided: a hemicube rasterizer ([`HemiCube`]) and a Monte Carlo ray
//! caster ([`RayCast`]).

pub mod clip;
pub mod delta;
pub mod hemicube;
pub mod poly;
pub mod raycast;
pub mod scan;
pub mod view;

pub use hemicube::HemiCube;
pub use raycast::RayCast;

use crate::scene::{Environment, Patch};

/// Strategy for computing patch-to-element form factors.
pub trait FormFactors {
    /// Fills `ff` with the fraction of flux leaving `shooter` that
    /// arrives at each element, indexed by element id. `ff` must hold
    /// `env.element_count()` entries; every entry is overwritten.
    fn calculate_form_factors(&mut self, shooter: &Patch, env: &Environment, ff: &mut [f64]);
}
