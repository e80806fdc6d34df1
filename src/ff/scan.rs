//! Depth-buffered scanline rasterization of clipped polygons onto a
//! hemicube face.
//!
//! Each face is a res x res grid of cells sampled at cell centers.
//! Convex polygons are converted to per-row spans via edge crossings,
//! then span cells are depth-tested so that only the nearest element
//! claims each cell.

use super::delta::HemiDelta;
use super::poly::ClipPoly;
use super::view::Face;

/// Cell id 0 means "no element"; elements are stored as id + 1.
#[derive(Debug, Clone, Copy)]
struct Cell {
    id: usize,
    depth: f64,
}

impl Cell {
    fn empty() -> Self {
        Self {
            id: 0,
            depth: f64::MAX,
        }
    }
}

/// Edge crossings of one grid row. A convex polygon crosses a row
/// center line at most twice; extra crossings from vertices landing
/// exactly on the line collapse into the outermost pair.
#[derive(Debug, Clone, Copy, Default)]
struct EdgeRow {
    count: usize,
    x: [f64; 2],
    depth: [f64; 2],
}

impl EdgeRow {
    fn add(&mut self, x: f64, depth: f64) {
        match self.count {
            0 => {
                self.x[0] = x;
                self.depth[0] = depth;
                self.count = 1;
            }
            1 => {
                if x < self.x[0] {
                    self.x[1] = self.x[0];
                    self.depth[1] = self.depth[0];
                    self.x[0] = x;
                    self.depth[0] = depth;
                } else {
                    self.x[1] = x;
                    self.depth[1] = depth;
                }
                self.count = 2;
            }
            _ => {
                if x < self.x[0] {
                    self.x[0] = x;
                    self.depth[0] = depth;
                } else if x > self.x[1] {
                    self.x[1] = x;
                    self.depth[1] = depth;
                }
                self.count += 1;
            }
        }
    }
}

/// Rasterizer for one hemicube face.
#[derive(Debug, Clone)]
pub struct HemiScan {
    res: usize,
    cells: Vec<Cell>,
    rows: Vec<EdgeRow>,
}

impl HemiScan {
    pub fn new(res: usize) -> Self {
        Self {
            res,
            cells: vec![Cell::empty(); res * res],
            rows: vec![EdgeRow::default(); res],
        }
    }

    /// Clears the depth buffer for a new face.
    pub fn reset(&mut self) {
        self.cells.fill(Cell::empty());
    }

    /// Rasterizes a clipped polygon under the given non-zero id.
    pub fn scan(&mut self, poly: &ClipPoly, id: usize) {
        debug_assert!(id > 0);
        let verts = poly.vertices();
        if verts.len() < 3 {
            return;
        }
        let res = self.res as f64;
        let gy_min = verts.iter().map(|v| v.y).fold(f64::MAX, f64::min) * res;
        let gy_max = verts.iter().map(|v| v.y).fold(f64::MIN, f64::max) * res;
        let (Some(lo), Some(hi)) = (self.row_at(gy_min, true), self.row_at(gy_max, false)) else {
            return;
        };
        if lo > hi {
            return;
        }
        for row in &mut self.rows[lo..=hi] {
            *row = EdgeRow::default();
        }

        // Collect crossings of every edge with the row center lines.
        for i in 0..verts.len() {
            let v0 = verts[i];
            let v1 = verts[(i + 1) % verts.len()];
            let y0 = v0.y * res;
            let y1 = v1.y * res;
            let dy = y1 - y0;
            if dy.abs() < 1e-12 {
                continue;
            }
            let e_lo = self.row_at(y0.min(y1), true);
            let e_hi = self.row_at(y0.max(y1), false);
            let (Some(e_lo), Some(e_hi)) = (e_lo, e_hi) else {
                continue;
            };
            for row in e_lo..=e_hi {
                let t = (row as f64 + 0.5 - y0) / dy;
                if !(0.0..=1.0).contains(&t) {
                    continue;
                }
                let x = (v0.x + t * (v1.x - v0.x)) * res;
                let depth = v0.depth + t * (v1.depth - v0.depth);
                self.rows[row].add(x, depth);
            }
        }

        // Fill spans with depth testing at cell centers.
        for row in lo..=hi {
            let er = self.rows[row];
            if er.count < 2 {
                continue;
            }
            let (Some(c_lo), Some(c_hi)) = (col_at(er.x[0], self.res, true), col_at(er.x[1], self.res, false)) else {
                continue;
            };
            let dx = er.x[1] - er.x[0];
            for col in c_lo..=c_hi {
                let t = if dx < 1e-12 {
                    0.0
                } else {
                    (col as f64 + 0.5 - er.x[0]) / dx
                };
                let depth = er.depth[0] + t * (er.depth[1] - er.depth[0]);
                let cell = &mut self.cells[row * self.res + col];
                if depth < cell.depth {
                    cell.id = id;
                    cell.depth = depth;
                }
            }
        }
    }

    /// Accumulates delta form factors of claimed cells into `ff`,
    /// indexed by element id. Side faces only read rows above the
    /// patch plane.
    pub fn sum_deltas(&self, delta: &HemiDelta, face: Face, ff: &mut [f64]) {
        let row_start = match face {
            Face::Top => 0,
            _ => self.res / 2,
        };
        for row in row_start..self.res {
            for col in 0..self.res {
                let cell = self.cells[row * self.res + col];
                if cell.id == 0 {
                    continue;
                }
                let f = match face {
                    Face::Top => delta.top_factor(row, col),
                    _ => delta.side_factor(row, col),
                };
                ff[cell.id - 1] += f;
            }
        }
    }

    /// First (or last) row whose center line lies past `g` in grid
    /// coordinates. None when the interval misses the grid entirely.
    fn row_at(&self, g: f64, lower: bool) -> Option<usize> {
        index_at(g, self.res, lower)
    }
}

fn col_at(g: f64, res: usize, lower: bool) -> Option<usize> {
    index_at(g, res, lower)
}

fn index_at(g: f64, res: usize, lower: bool) -> Option<usize> {
    let i = if lower {
        (g - 0.5).ceil()
    } else {
        (g - 0.5).floor()
    };
    if lower {
        if i >= res as f64 {
            return None;
        }
        Some(i.max(0.0) as usize)
    } else {
        if i < 0.0 {
            return None;
        }
        Some((i as usize).min(res - 1))
    }
}
