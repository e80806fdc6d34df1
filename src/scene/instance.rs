use crate::Surface;

/// A named group of surfaces, typically one modeled object.
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: String,
    pub surfaces: Vec<Surface>,
}

impl Instance {
    pub fn new(name: &str, surfaces: Vec<Surface>) -> Self {
        Self {
            name: name.to_string(),
            surfaces,
        }
    }
}
