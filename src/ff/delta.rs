//! Precomputed per-cell delta form factors.
//!
//! Every hemicube cell subtends a small solid angle at the eye; its
//! delta form factor is the fraction of the hemisphere it covers,
//! cosine-weighted. Faces are fourfold symmetric about their center
//! (sides: about the vertical center line), so only one quadrant per
//! face type is stored and indices are folded into it.

use std::f64::consts::PI;

/// Quadrant tables for one hemicube resolution.
///
/// `top` is indexed by distance from the face center along both axes;
/// `side` by height above the patch plane and horizontal distance from
/// the face center line. Both hold (res / 2)^2 entries.
#[derive(Debug, Clone)]
pub struct HemiDelta {
    half: usize,
    top: Vec<f64>,
    side: Vec<f64>,
}

impl HemiDelta {
    /// Builds the tables for an even `res` x `res` face grid.
    pub fn new(res: usize) -> Self {
        let half = res / 2;
        let width = 2.0 / res as f64;
        let da = width * width;
        let mut top = vec![0.0; half * half];
        let mut side = vec![0.0; half * half];
        for j in 0..half {
            let y = (j as f64 + 0.5) * width;
            for i in 0..half {
                let x = (i as f64 + 0.5) * width;
                let r2 = x * x + y * y + 1.0;
                // Top cell at (x, y) on the z = 1 plane.
                top[j * half + i] = da / (PI * r2 * r2);
                // Side cell at horizontal offset x, height y.
                side[j * half + i] = y * da / (PI * r2 * r2);
            }
        }
        Self { half, top, side }
    }

    /// Folds a full-face cell index into the stored quadrant.
    fn fold(&self, c: usize) -> usize {
        if c >= self.half { c - self.half } else { self.half - 1 - c }
    }

    /// Delta form factor of top-face cell (row, col), both in
    /// 0..res.
    pub fn top_factor(&self, row: usize, col: usize) -> f64 {
        self.top[self.fold(row) * self.half + self.fold(col)]
    }

    /// Delta form factor of side-face cell (row, col). Only rows in
    /// the upper half (res/2..res) lie above the patch plane and carry
    /// energy.
    pub fn side_factor(&self, row: usize, col: usize) -> f64 {
        debug_assert!(row >= self.half);
        self.side[(row - self.half) * self.half + self.fold(col)]
    }
}
