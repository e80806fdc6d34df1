//! Demo: progressive radiosity inside a Cornell-style box.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use radiosity3d::solver::{ProgressiveSolver, SolverConfig, solve};
use radiosity3d::{Environment, Instance, Patch, Point, Spectra, Surface};

fn quad_patch(points: &mut Vec<Point>, corners: [Point; 4]) -> Result<Patch> {
    let base = points.len();
    points.extend_from_slice(&corners);
    Patch::new((base..base + 4).collect(), vec![], points)
}

/// Closed unit box with all faces turned inward and a light ceiling.
fn box_room() -> Result<Environment> {
    let mut points = Vec::new();
    let p = Point::new;

    let floor = quad_patch(
        &mut points,
        [p(0., 0., 0.), p(1., 0., 0.), p(1., 1., 0.), p(0., 1., 0.)],
    )?;
    let ceiling = quad_patch(
        &mut points,
        [p(0., 0., 1.), p(0., 1., 1.), p(1., 1., 1.), p(1., 0., 1.)],
    )?;
    let left = quad_patch(
        &mut points,
        [p(0., 0., 0.), p(0., 1., 0.), p(0., 1., 1.), p(0., 0., 1.)],
    )?;
    let right = quad_patch(
        &mut points,
        [p(1., 0., 0.), p(1., 0., 1.), p(1., 1., 1.), p(1., 1., 0.)],
    )?;
    let front = quad_patch(
        &mut points,
        [p(0., 0., 0.), p(0., 0., 1.), p(1., 0., 1.), p(1., 0., 0.)],
    )?;
    let back = quad_patch(
        &mut points,
        [p(0., 1., 0.), p(1., 1., 0.), p(1., 1., 1.), p(0., 1., 1.)],
    )?;

    let surfaces = vec![
        Surface::new("floor", Spectra::grey(0.7), Spectra::black(), vec![floor]),
        Surface::new(
            "ceiling",
            Spectra::grey(0.8),
            Spectra::grey(1.0),
            vec![ceiling],
        ),
        Surface::new(
            "left",
            Spectra::new(0.8, 0.2, 0.2),
            Spectra::black(),
            vec![left],
        ),
        Surface::new(
            "right",
            Spectra::new(0.2, 0.8, 0.2),
            Spectra::black(),
            vec![right],
        ),
        Surface::new("front", Spectra::grey(0.7), Spectra::black(), vec![front]),
        Surface::new("back", Spectra::grey(0.7), Spectra::black(), vec![back]),
    ];
    Environment::new(points, vec![Instance::new("room", surfaces)])
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut env = box_room()?;
    let mut config = SolverConfig::new();
    config.ambient = true;
    let mut solver = ProgressiveSolver::new(config)?;
    solve(&mut solver, &mut env)?;

    println!(
        "Solved {} patches / {} vertices in {} steps (convergence {:.2e})",
        env.patch_count(),
        env.vertex_count(),
        solver.step_count(),
        solver.convergence()
    );
    println!("Mean vertex exitance per surface:");
    for surface in env.surfaces() {
        let ids = surface.vertex_ids();
        let mut mean = Spectra::black();
        for &v in &ids {
            mean.add(&env.vertices[v].exitance);
        }
        mean.scale(1.0 / ids.len() as f64);
        println!("  {:<8} {mean:.3}", surface.name);
    }
    Ok(())
}
