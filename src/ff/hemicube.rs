//! Hemicube form factor determination.
//!
//! Places a half cube over the shooting patch, projects every element
//! onto its five faces through the clipping pipeline, depth-tests the
//! projections and accumulates per-cell delta form factors. Occlusion
//! falls out of the depth test.

use anyhow::{Result, bail};
use arrayvec::ArrayVec;

use crate::geom::vector4::Vector4;
use crate::scene::{Environment, Patch};

use super::FormFactors;
use super::clip::Clipper;
use super::delta::HemiDelta;
use super::poly::ClipPoly;
use super::scan::HemiScan;
use super::view::{FACES, HemiView, clip_planes};

pub const DEFAULT_RESOLUTION: usize = 100;

/// Hemicube rasterizer with all per-solve buffers allocated once.
pub struct HemiCube {
    view: HemiView,
    clipper: Clipper,
    scan: HemiScan,
    delta: HemiDelta,
    poly: ClipPoly,
}

impl HemiCube {
    /// Builds a hemicube with `resolution` cells along each face edge.
    /// The resolution must be even so cells fold onto quadrant delta
    /// tables.
    pub fn new(resolution: usize) -> Result<Self> {
        if resolution == 0 || resolution % 2 != 0 {
            bail!("Hemicube resolution must be a positive even number, got {resolution}");
        }
        Ok(Self {
            view: HemiView::new(),
            clipper: Clipper::new(clip_planes()),
            scan: HemiScan::new(resolution),
            delta: HemiDelta::new(resolution),
            poly: ClipPoly::new(),
        })
    }
}

impl FormFactors for HemiCube {
    fn calculate_form_factors(&mut self, shooter: &Patch, env: &Environment, ff: &mut [f64]) {
        for f in ff.iter_mut() {
            *f = 0.0;
        }
        self.view.set_view(shooter.center, shooter.normal);
        for face in FACES {
            self.view.update_view(face);
            self.scan.reset();
            for patch in env.patches() {
                // The shooter cannot see itself, and back faces are
                // invisible to it.
                if patch.id == shooter.id || patch.is_facing_away(shooter.center) {
                    continue;
                }
                for element in &patch.elements {
                    let verts: ArrayVec<Vector4, 4> = element
                        .vertices
                        .iter()
                        .map(|&v| self.view.project(env.vertices[v].pos))
                        .collect();
                    if self.clipper.clip(&verts, &mut self.poly) > 0 {
                        self.scan.scan(&self.poly, element.id + 1);
                    }
                }
            }
            self.scan.sum_deltas(&self.delta, face, ff);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Instance, Patch, Point, Spectra, Surface};

    fn square(points: &mut Vec<Point>, corners: [Point; 4]) -> Patch {
        let base = points.len();
        points.extend_from_slice(&corners);
        Patch::new((base..base + 4).collect(), vec![], points).unwrap()
    }

    /// Two parallel unit squares facing each other at unit distance.
    fn facing_squares(gap: f64) -> Environment {
        let mut points = Vec::new();
        let lower = square(
            &mut points,
            [
                Point::new(0., 0., 0.),
                Point::new(1., 0., 0.),
                Point::new(1., 1., 0.),
                Point::new(0., 1., 0.),
            ],
        );
        let upper = square(
            &mut points,
            [
                Point::new(0., 0., gap),
                Point::new(0., 1., gap),
                Point::new(1., 1., gap),
                Point::new(1., 0., gap),
            ],
        );
        let s0 = Surface::new("lower", Spectra::grey(0.5), Spectra::black(), vec![lower]);
        let s1 = Surface::new("upper", Spectra::grey(0.5), Spectra::black(), vec![upper]);
        Environment::new(points, vec![Instance::new("pair", vec![s0, s1])]).unwrap()
    }

    #[test]
    fn test_rejects_odd_resolution() {
        assert!(HemiCube::new(99).is_err());
        assert!(HemiCube::new(0).is_err());
        assert!(HemiCube::new(100).is_ok());
    }

    #[test]
    fn test_parallel_squares_reference_value() {
        // Center-to-area form factor between directly opposed unit
        // squares at unit distance is about 0.24 (analytic value
        // 0.2395).
        let env = facing_squares(1.0);
        let shooter = env.patches().next().unwrap().clone();
        let mut hc = HemiCube::new(DEFAULT_RESOLUTION).unwrap();
        let mut ff = vec![0.0; env.element_count()];
        hc.calculate_form_factors(&shooter, &env, &mut ff);
        assert!((ff[1] - 0.2395).abs() < 0.01, "ff = {}", ff[1]);
        // No energy back to the shooter's own element.
        assert_eq!(ff[0], 0.0);
    }

    #[test]
    fn test_form_factor_falls_with_distance() {
        let mut hc = HemiCube::new(DEFAULT_RESOLUTION).unwrap();
        let mut prev = f64::MAX;
        for gap in [1.0, 2.0, 4.0] {
            let env = facing_squares(gap);
            let shooter = env.patches().next().unwrap().clone();
            let mut ff = vec![0.0; env.element_count()];
            hc.calculate_form_factors(&shooter, &env, &mut ff);
            assert!(ff[1] < prev, "ff did not fall at gap {gap}");
            prev = ff[1];
        }
    }

    #[test]
    fn test_back_face_invisible() {
        // Flip the upper square to face away from the shooter.
        let mut points = Vec::new();
        let lower = square(
            &mut points,
            [
                Point::new(0., 0., 0.),
                Point::new(1., 0., 0.),
                Point::new(1., 1., 0.),
                Point::new(0., 1., 0.),
            ],
        );
        let upper = square(
            &mut points,
            [
                Point::new(0., 0., 1.),
                Point::new(1., 0., 1.),
                Point::new(1., 1., 1.),
                Point::new(0., 1., 1.),
            ],
        );
        let s0 = Surface::new("lower", Spectra::grey(0.5), Spectra::black(), vec![lower]);
        let s1 = Surface::new("upper", Spectra::grey(0.5), Spectra::black(), vec![upper]);
        let env = Environment::new(points, vec![Instance::new("pair", vec![s0, s1])]).unwrap();
        let shooter = env.patches().next().unwrap().clone();
        let mut hc = HemiCube::new(DEFAULT_RESOLUTION).unwrap();
        let mut ff = vec![0.0; env.element_count()];
        hc.calculate_form_factors(&shooter, &env, &mut ff);
        assert_eq!(ff[1], 0.0);
    }

    #[test]
    fn test_occluder_blocks_energy() {
        // A square between shooter and receiver intercepts the flux
        // that would have reached the receiver.
        let mut points = Vec::new();
        let lower = square(
            &mut points,
            [
                Point::new(0., 0., 0.),
                Point::new(1., 0., 0.),
                Point::new(1., 1., 0.),
                Point::new(0., 1., 0.),
            ],
        );
        let blocker = square(
            &mut points,
            [
                Point::new(-1., -1., 1.),
                Point::new(-1., 2., 1.),
                Point::new(2., 2., 1.),
                Point::new(2., -1., 1.),
            ],
        );
        let upper = square(
            &mut points,
            [
                Point::new(0., 0., 2.),
                Point::new(0., 1., 2.),
                Point::new(1., 1., 2.),
                Point::new(1., 0., 2.),
            ],
        );
        let s0 = Surface::new("lower", Spectra::grey(0.5), Spectra::black(), vec![lower]);
        let s1 = Surface::new("blocker", Spectra::grey(0.5), Spectra::black(), vec![blocker]);
        let s2 = Surface::new("upper", Spectra::grey(0.5), Spectra::black(), vec![upper]);
        let env =
            Environment::new(points, vec![Instance::new("scene", vec![s0, s1, s2])]).unwrap();
        let shooter = env.patches().next().unwrap().clone();
        let mut hc = HemiCube::new(DEFAULT_RESOLUTION).unwrap();
        let mut ff = vec![0.0; env.element_count()];
        hc.calculate_form_factors(&shooter, &env, &mut ff);
        assert!(ff[1] > 0.1, "blocker should receive flux, got {}", ff[1]);
        assert_eq!(ff[2], 0.0, "occluded receiver must get nothing");
    }

    #[test]
    fn test_reciprocity_between_unequal_areas() {
        // a_A * F(A->B) == a_B * F(B->A) for diffuse patches. The
        // hemicube estimates from the patch center, so reciprocity
        // only holds to within the near-field error; keep the squares
        // small relative to their separation and the tolerance loose.
        let mut points = Vec::new();
        let small = square(
            &mut points,
            [
                Point::new(0., 0., 0.),
                Point::new(1., 0., 0.),
                Point::new(1., 1., 0.),
                Point::new(0., 1., 0.),
            ],
        );
        let big = square(
            &mut points,
            [
                Point::new(-0.5, -0.5, 6.),
                Point::new(-0.5, 1.5, 6.),
                Point::new(1.5, 1.5, 6.),
                Point::new(1.5, -0.5, 6.),
            ],
        );
        let s0 = Surface::new("small", Spectra::grey(0.5), Spectra::black(), vec![small]);
        let s1 = Surface::new("big", Spectra::grey(0.5), Spectra::black(), vec![big]);
        let env = Environment::new(points, vec![Instance::new("pair", vec![s0, s1])]).unwrap();

        let mut hc = HemiCube::new(DEFAULT_RESOLUTION).unwrap();
        let patches: Vec<Patch> = env.patches().cloned().collect();
        let mut ff_ab = vec![0.0; env.element_count()];
        let mut ff_ba = vec![0.0; env.element_count()];
        hc.calculate_form_factors(&patches[0], &env, &mut ff_ab);
        hc.calculate_form_factors(&patches[1], &env, &mut ff_ba);
        let lhs = patches[0].area * ff_ab[1];
        let rhs = patches[1].area * ff_ba[0];
        assert!(lhs > 0.0 && rhs > 0.0);
        assert!(
            (lhs - rhs).abs() / lhs.max(rhs) < 0.1,
            "reciprocity violated: {lhs} vs {rhs}"
        );
    }

    #[test]
    fn test_row_sum_bounded_by_one() {
        let env = facing_squares(0.5);
        let shooter = env.patches().next().unwrap().clone();
        let mut hc = HemiCube::new(DEFAULT_RESOLUTION).unwrap();
        let mut ff = vec![0.0; env.element_count()];
        hc.calculate_form_factors(&shooter, &env, &mut ff);
        let sum: f64 = ff.iter().sum();
        assert!(sum <= 1.0 + 1e-6, "row sum {sum}");
        assert!(sum > 0.0);
    }
}
