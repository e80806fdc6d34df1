//! Radiant energy in three wavelength bands.
//!
//! Depending on context a `Spectra` holds reflectance, emittance, total
//! exitance or unsent exitance. Values are never clamped here; tone
//! reproduction is the only place allowed to rescale into displayable
//! range.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spectra {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Spectra {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self::new(0., 0., 0.)
    }

    pub fn grey(v: f64) -> Self {
        Self::new(v, v, v)
    }

    /// Adds another spectra in place.
    pub fn add(&mut self, other: &Self) {
        self.r += other.r;
        self.g += other.g;
        self.b += other.b;
    }

    /// Subtracts another spectra in place.
    pub fn sub(&mut self, other: &Self) {
        self.r -= other.r;
        self.g -= other.g;
        self.b -= other.b;
    }

    /// Scales all bands in place.
    pub fn scale(&mut self, s: f64) {
        self.r *= s;
        self.g *= s;
        self.b *= s;
    }

    /// Componentwise product in place.
    pub fn mul(&mut self, other: &Self) {
        self.r *= other.r;
        self.g *= other.g;
        self.b *= other.b;
    }

    /// Resets all bands to zero.
    pub fn reset(&mut self) {
        *self = Self::black();
    }

    /// Sum of the three bands (used for flux bookkeeping).
    pub fn total(&self) -> f64 {
        self.r + self.g + self.b
    }

    /// Largest band value.
    pub fn max_band(&self) -> f64 {
        self.r.max(self.g).max(self.b)
    }

    /// Copy with each band clamped to be non-negative.
    pub fn clamped_positive(&self) -> Self {
        Self::new(self.r.max(0.), self.g.max(0.), self.b.max(0.))
    }

    /// Copy scaled by a factor.
    pub fn scaled(&self, s: f64) -> Self {
        Self::new(self.r * s, self.g * s, self.b * s)
    }

    /// Copy multiplied componentwise.
    pub fn multiplied(&self, other: &Self) -> Self {
        Self::new(self.r * other.r, self.g * other.g, self.b * other.b)
    }
}

impl fmt::Display for Spectra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(3);
        write!(
            f,
            "Spectra({:.prec$}, {:.prec$}, {:.prec$})",
            self.r,
            self.g,
            self.b,
            prec = prec
        )
    }
}
