use vision_reconstruction_core::synthetic::{
    SceneBuilder, UniformPointNoise, grid_on_plane, jittered, noise_blob,
};
use vision_reconstruction_core::{Plane, Pt3, ReconstructionStore, Shot, Vec3, VertexId};
use vision_reconstruction_linear::{PlaneFitError, PlaneFitter, RansacPlaneFitter};

fn tilted_plane() -> Plane {
    Plane::from_coefficients(0.2, -0.1, 1.0, 0.4).unwrap()
}

fn patch_with_outliers() -> (ReconstructionStore, Vec<VertexId>) {
    let plane = tilted_plane();
    let grid = grid_on_plane(&plane, &Pt3::new(0.0, 0.0, 0.4), 6, 6, 0.1);
    let mut points = jittered(&grid, &UniformPointNoise::new(11, 1e-4));
    for i in 0..8 {
        let base = points[i * 4];
        points.push(base + plane.normal * (0.5 + 0.1 * i as f64));
    }

    let mut scene = SceneBuilder::new();
    let shot = scene
        .shot(Shot::calibrated(800, 600, Vec3::new(0.0, 0.0, 3.0)))
        .unwrap();
    let ids = scene.reconstructed_points(&points, &[shot]).unwrap();
    (scene.build(), ids)
}

#[test]
fn recovers_plane_despite_outliers() {
    let (store, ids) = patch_with_outliers();
    let fitter = RansacPlaneFitter::default();

    let plane = fitter.fit_plane(&store, &ids).expect("plane fit");
    let truth = tilted_plane();
    let dot = plane.normal.dot(&truth.normal);
    assert!(dot.abs() > 1.0 - 1e-6, "normal misaligned: dot {dot}");
    assert!((plane.normal.norm() - 1.0).abs() < 1e-9);

    // Every grid vertex is close to the fitted plane, the lifted ones are not.
    for (k, id) in ids.iter().enumerate() {
        let p = store.vertex(*id).unwrap().position;
        if k < 36 {
            assert!(plane.distance(&p) < 1e-3, "inlier {k} off plane");
        } else {
            assert!(plane.distance(&p) > 0.4, "outlier {k} on plane");
        }
    }
}

#[test]
fn fit_is_reproducible() {
    let (store, ids) = patch_with_outliers();
    let fitter = RansacPlaneFitter::default();
    let a = fitter.fit_plane(&store, &ids).unwrap();
    let b = fitter.fit_plane(&store, &ids).unwrap();
    assert_eq!(a, b);
}

#[test]
fn unstructured_noise_has_no_consensus() {
    let blob = noise_blob(&Pt3::new(1.0, -2.0, 0.5), 1.0, 60, 5);
    let mut scene = SceneBuilder::new();
    let shot = scene.shot(Shot::uncalibrated(640, 480)).unwrap();
    let ids = scene.reconstructed_points(&blob, &[shot]).unwrap();
    let store = scene.build();

    let err = RansacPlaneFitter::default()
        .fit_plane(&store, &ids)
        .unwrap_err();
    assert!(
        matches!(err, PlaneFitError::NoConsensus { candidates: 60, .. }),
        "unexpected error {err:?}"
    );
}

#[test]
fn rejects_bad_candidates() {
    let (mut store, ids) = patch_with_outliers();
    let fitter = RansacPlaneFitter::default();

    let missing = VertexId(10_000);
    assert_eq!(
        fitter.fit_plane(&store, &[ids[0], missing, ids[1]]),
        Err(PlaneFitError::UnknownVertex(missing))
    );

    store.clear_position(ids[1]).unwrap();
    assert_eq!(
        fitter.fit_plane(&store, &ids[..5]),
        Err(PlaneFitError::NotReconstructed(ids[1]))
    );

    assert_eq!(
        fitter.fit_plane(&store, &[ids[0], ids[2]]),
        Err(PlaneFitError::NotEnoughPoints(2))
    );
}
