//! Radiosity global illumination for diffuse polygonal scenes.
//!
//! A scene is an [`Environment`] of instances, surfaces, patches and
//! elements over a shared vertex arena. Form factors between patches
//! and elements come from either a hemicube rasterizer or a Monte
//! Carlo ray caster ([`ff`]), and three step-driven solvers
//! ([`solver`]) redistribute flux until convergence before tone
//! reproduction maps the result into displayable vertex colors.

pub mod ff;
pub mod geom;
pub mod scene;
pub mod solver;
pub mod spectra;

pub use geom::point::Point;
pub use geom::vector::Vector;
pub use scene::{Element, Environment, Instance, Patch, Surface, Vertex};
pub use spectra::Spectra;
