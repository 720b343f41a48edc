use assert_approx_eq::assert_approx_eq;
use rand::{rngs::StdRng, SeedableRng};
use robolab_planner::*;
use robolab_viewer::{NoopViewer, RecordingViewer};

fn ur5() -> PlanarArm {
    PlanarArm::ur5(Target::default(), &RobotCollisionDetectorConfig::default()).unwrap()
}

#[test]
fn test_random_positions_from_arm_limits() {
    let arm = ur5();
    let limits = arm.active_limits();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
        let x = generate_random_joint_positions_from_limits_with_rng(&limits, &mut rng);
        assert_eq!(x.len(), 2);
        assert!(arm.is_within_limits(&arm.lock().expand(&x).unwrap()));
    }
}

#[test]
fn test_interpolate() {
    let points: Vec<Vec<f64>> = vec![
        vec![0.0, -1.0],
        vec![2.0, -3.0],
        vec![3.0, 3.0],
        vec![1.0, 5.0],
    ];
    let interpolated = interpolate(&points, 3.0, 0.01).unwrap();
    // key frames are one second apart
    for (i, point) in points.iter().enumerate() {
        let p = &interpolated[i * 100].position;
        assert_approx_eq!(p[0], point[0], 1e-6);
        assert_approx_eq!(p[1], point[1], 1e-6);
    }
    let last = interpolated.last().unwrap();
    assert_approx_eq!(last.position[0], 1.0);
    assert_approx_eq!(last.position[1], 5.0);
}

#[test]
fn test_sample_space_is_reproducible() {
    let arm = ur5();
    let a = sample_space(&arm, &mut StdRng::seed_from_u64(42), 50).unwrap();
    let b = sample_space(&arm, &mut StdRng::seed_from_u64(42), 50).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_descent_then_path() {
    let arm = ur5();
    let mut rng = StdRng::seed_from_u64(7);
    let config = DescentConfig {
        pause_ms: 0,
        ..Default::default()
    };
    let report = random_descent(&arm, &mut rng, &config, &NoopViewer).unwrap();
    let start = arm.lock().reduce(&report.start).unwrap();
    let last = arm.lock().reduce(&report.last).unwrap();

    // both ends of the descent are free, so planning between them can only
    // fail inside RRT
    let planner = JointPathPlannerBuilder::new(arm).seed(7).finalize();
    match planner.plan(&start, &last) {
        Ok(path) => {
            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&last));
        }
        Err(Error::PathPlanFail(_)) => {}
        Err(e) => panic!("unexpected error {e}"),
    }
}

// Restarts are random, and so is the success of a single run.
#[flaky_test::flaky_test]
fn test_optimize_until_success() {
    let mut arm = ur5();
    let goal = arm.lock().expand(&[-2.356, 0.0]).unwrap();
    let p = arm.end_effector(&goal).unwrap();
    arm.set_target(Target::new(p.x, p.y));

    let config = OptimizationConfig {
        success_cost: 1e-2,
        ..Default::default()
    };
    let viewer = RecordingViewer::new();
    let mut rng = StdRng::seed_from_u64(1);
    let report = optimize_until_success(&arm, &mut rng, &config, &viewer, 20).unwrap();
    assert!(report.converged);
    assert!(report.cost < 1e-2);
    let q = arm.lock().expand(&report.x).unwrap();
    assert!(!arm.is_colliding(&q).unwrap());
    assert_eq!(viewer.last_frame(), Some(q));
}

#[test]
fn test_default_target_is_sampled() {
    let arm = ur5();
    assert_eq!(arm.target(), &Target::default());
    let mut rng = StdRng::seed_from_u64(8);
    let q = random_target_configuration(
        &arm,
        &mut rng,
        DEFAULT_TARGET_THRESHOLD,
        &NoopViewer,
        DEFAULT_MAX_TRIALS,
    )
    .unwrap();
    assert!(arm.distance_to_target(&q).unwrap() < DEFAULT_TARGET_THRESHOLD);
    assert!(!arm.is_colliding(&q).unwrap());
}

// Restarts are random, and so is the success of a single run.
#[flaky_test::flaky_test]
fn test_optimize_until_success_on_default_target() {
    let arm = ur5();
    let config = OptimizationConfig {
        max_duration_secs: Some(5.0),
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(2);
    let report = optimize_until_success(&arm, &mut rng, &config, &NoopViewer, 30).unwrap();
    assert!(report.converged);
    assert!(report.cost < config.success_cost);
    let q = arm.lock().expand(&report.x).unwrap();
    assert!(!arm.is_colliding(&q).unwrap());
    assert!(arm.distance_to_target(&q).unwrap() < DEFAULT_TARGET_THRESHOLD);
}
