//! Scene graph for radiosity solving.
//!
//! Ownership runs Environment → Instance → Surface → Patch → Element.
//! Vertices live in one arena owned by the `Environment`; elements and
//! patches refer to them by index. Surfaces never share vertices with
//! each other; `Environment::new` rejects scenes that violate this,
//! which lets reflectance and emittance be looked up unambiguously from
//! any element's owning surface.

pub mod element;
pub mod environment;
pub mod instance;
pub mod patch;
pub mod surface;
pub mod vertex;

pub use element::Element;
pub use environment::Environment;
pub use instance::Instance;
pub use patch::Patch;
pub use surface::Surface;
pub use vertex::Vertex;
