//! Normal estimation on a synthetic two-wall scene.
//!
//! Two perpendicular planar patches are observed by one calibrated and one
//! uncalibrated shot. A small cloud of mis-triangulated points floats between
//! them. The example:
//! 1. Builds the scene with the synthetic helpers
//! 2. Runs normal estimation through a session
//! 3. Compares the exported normals against the wall orientations
//!
//! Run with: `RUST_LOG=info cargo run -p vision-reconstruction --example normals_session`

use anyhow::Result;
use vision_reconstruction::prelude::*;
use vision_reconstruction::synthetic::{
    SceneBuilder, UniformPointNoise, grid_on_plane, jittered, noise_blob,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let floor = Plane::new(Vec3::z(), 0.0);
    let wall = Plane::new(Vec3::x(), -1.0);

    let mut scene = SceneBuilder::new().with_seed(42);
    let camera = scene.shot(Shot::calibrated(1280, 720, Vec3::new(1.0, 0.5, 2.0)))?;
    let sketch = scene.shot(Shot::uncalibrated(1024, 768))?;

    let noise = UniformPointNoise::new(7, 2e-3);
    let floor_pts = jittered(&grid_on_plane(&floor, &Pt3::new(1.0, 0.0, 0.0), 12, 12, 0.1), &noise);
    let wall_pts = jittered(&grid_on_plane(&wall, &Pt3::new(-1.0, 0.0, 0.8), 12, 12, 0.1), &noise);
    let floor_ids = scene.reconstructed_points(&floor_pts, &[sketch, camera])?;
    let wall_ids = scene.reconstructed_points(&wall_pts, &[camera])?;
    scene.reconstructed_points(&noise_blob(&Pt3::new(4.0, 4.0, 4.0), 0.3, 25, 9), &[camera])?;

    let mut session =
        ReconstructionSession::<NormalEstimationProblem>::with_description("synthetic floor and wall");
    session.set_input(scene.build())?;
    session.update_config(|c| {
        c.k = 24;
        c.progress_interval = 100;
    })?;

    step_compute_normals(&mut session, None)?;
    let export = session.export()?;

    println!("\n=== Summary ===");
    let summary = &export.summary;
    println!("  reconstructed: {}", summary.reconstructed);
    println!("  oriented:      {} ({} flipped)", summary.oriented, summary.flipped);
    println!("  skipped:       {}", summary.skipped());

    let mean_error = |ids: &[VertexId], expected: Vec3| -> f64 {
        let errors: Vec<f64> = export
            .normals
            .iter()
            .filter(|r| ids.contains(&r.vertex))
            .map(|r| r.normal.angle(&expected).to_degrees())
            .collect();
        errors.iter().sum::<f64>() / errors.len().max(1) as f64
    };

    println!("\n=== Orientation ===");
    println!("  floor mean angle to +z: {:.3} deg", mean_error(&floor_ids, Vec3::z()));
    println!("  wall mean angle to +x:  {:.3} deg", mean_error(&wall_ids, Vec3::x()));

    println!("\nSession log:");
    for entry in &session.log {
        println!(
            "  {} [{}] {}",
            entry.operation,
            if entry.success { "ok" } else { "failed" },
            entry.notes.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
