use std::{f64::consts::PI, time::Duration};

use optimization_engine::{
    alm::{AlmCache, AlmFactory, AlmOptimizer, AlmProblem, NO_JACOBIAN_MAPPING, NO_MAPPING, NO_SET},
    constraints,
    core::ExitStatus,
    panoc::PANOCCache,
    SolverError,
};
use rand::Rng;
use robolab_viewer::Viewer;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{arm::PlanarArm, errors::*, sampling::random_configuration};

/// Parameters of the constrained optimization
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OptimizationConfig {
    /// Lower bound of every active joint
    #[serde(default = "default_lower_bound")]
    pub lower_bound: f64,
    /// Upper bound of every active joint
    #[serde(default = "default_upper_bound")]
    pub upper_bound: f64,
    #[serde(default = "default_max_outer_iterations")]
    pub max_outer_iterations: usize,
    #[serde(default = "default_max_inner_iterations")]
    pub max_inner_iterations: usize,
    #[serde(default)]
    pub max_duration_secs: Option<f64>,
    /// Step of the central finite differences
    #[serde(default = "default_finite_difference_step")]
    pub finite_difference_step: f64,
    /// Final tolerance of the inner solver
    #[serde(default = "default_epsilon_tolerance")]
    pub epsilon_tolerance: f64,
    /// A run is successful only below this cost
    #[serde(default = "default_success_cost")]
    pub success_cost: f64,
    #[serde(default = "default_max_trials")]
    pub max_trials: usize,
}

fn default_lower_bound() -> f64 {
    -PI
}

fn default_upper_bound() -> f64 {
    PI
}

fn default_max_outer_iterations() -> usize {
    50
}

fn default_max_inner_iterations() -> usize {
    500
}

fn default_finite_difference_step() -> f64 {
    1e-6
}

fn default_epsilon_tolerance() -> f64 {
    1e-8
}

fn default_success_cost() -> f64 {
    1e-6
}

fn default_max_trials() -> usize {
    crate::sampling::DEFAULT_MAX_TRIALS
}

impl OptimizationConfig {
    /// The solver panics on zero iteration counts and non positive tolerances
    fn validate(&self) -> Result<()> {
        if self.max_outer_iterations == 0 || self.max_inner_iterations == 0 {
            return Err(Error::Solver("iteration counts must be positive".to_owned()));
        }
        if self.epsilon_tolerance.is_nan() || self.epsilon_tolerance <= 0.0 {
            return Err(Error::Solver(format!(
                "epsilon_tolerance must be positive, got {}",
                self.epsilon_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            lower_bound: default_lower_bound(),
            upper_bound: default_upper_bound(),
            max_outer_iterations: default_max_outer_iterations(),
            max_inner_iterations: default_max_inner_iterations(),
            max_duration_secs: None,
            finite_difference_step: default_finite_difference_step(),
            epsilon_tolerance: default_epsilon_tolerance(),
            success_cost: default_success_cost(),
            max_trials: default_max_trials(),
        }
    }
}

/// Outcome of one run of [`optimize`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Optimal values of the active joints
    pub x: Vec<f64>,
    pub cost: f64,
    pub converged: bool,
    pub outer_iterations: usize,
    pub inner_iterations: usize,
    pub solve_time: Duration,
}

fn solver_error(e: Error) -> SolverError {
    debug!("evaluation failed: {e}");
    SolverError::Cost
}

fn target_cost(arm: &PlanarArm, x: &[f64]) -> Result<f64> {
    arm.distance_to_target(&arm.lock().expand(x)?)
}

/// Smooth at the target, unlike the distance itself
fn squared_target_cost(arm: &PlanarArm, x: &[f64]) -> Result<f64> {
    Ok(target_cost(arm, x)?.powi(2))
}

/// Violation of `collision_distance >= 0`, zero when feasible
fn constraint_violation(arm: &PlanarArm, x: &[f64]) -> Result<f64> {
    Ok((-arm.collision_distance(&arm.lock().expand(x)?)?).max(0.0))
}

fn central_difference<F>(f: F, x: &[f64], h: f64, grad: &mut [f64]) -> Result<()>
where
    F: Fn(&[f64]) -> Result<f64>,
{
    let mut probe = x.to_vec();
    for (i, g) in grad.iter_mut().enumerate() {
        probe[i] = x[i] + h;
        let plus = f(&probe)?;
        probe[i] = x[i] - h;
        let minus = f(&probe)?;
        probe[i] = x[i];
        *g = (plus - minus) / (2.0 * h);
    }
    Ok(())
}

/// Minimizes the distance to the target over the active joints, subject to
/// `collision_distance >= 0`
///
/// The solver works on the squared distance, the report gives the distance.
/// The constraint is handled by the penalty part of the augmented Lagrangian
/// method as `max(0, -collision_distance) = 0`. The start and the result are
/// shown to `viewer`.
pub fn optimize<V>(
    arm: &PlanarArm,
    x0: &[f64],
    config: &OptimizationConfig,
    viewer: &V,
) -> Result<OptimizationReport>
where
    V: Viewer<[f64]> + ?Sized,
{
    let n = arm.lock().reduced_dof();
    if x0.len() != n {
        return Err(Error::DofMismatch(x0.len(), n));
    }
    config.validate()?;
    viewer.display(&arm.lock().expand(x0)?);

    let h = config.finite_difference_step;
    let lower = vec![config.lower_bound; n];
    let upper = vec![config.upper_bound; n];
    let bounds = constraints::Rectangle::new(Some(&lower), Some(&upper));

    let f = |u: &[f64], cost: &mut f64| -> std::result::Result<(), SolverError> {
        *cost = squared_target_cost(arm, u).map_err(solver_error)?;
        Ok(())
    };
    let df = |u: &[f64], grad: &mut [f64]| -> std::result::Result<(), SolverError> {
        central_difference(|x| squared_target_cost(arm, x), u, h, grad).map_err(solver_error)
    };
    let f2 = |u: &[f64], f2u: &mut [f64]| -> std::result::Result<(), SolverError> {
        f2u[0] = constraint_violation(arm, u).map_err(solver_error)?;
        Ok(())
    };
    // JF2(u)^T d with a single constraint
    let f2_jacobian_product =
        |u: &[f64], d: &[f64], res: &mut [f64]| -> std::result::Result<(), SolverError> {
            central_difference(|x| constraint_violation(arm, x), u, h, res)
                .map_err(solver_error)?;
            res.iter_mut().for_each(|r| *r *= d[0]);
            Ok(())
        };

    let factory = AlmFactory::new(
        f,
        df,
        NO_MAPPING,
        NO_JACOBIAN_MAPPING,
        Some(f2),
        Some(f2_jacobian_product),
        NO_SET,
        1,
    );
    let problem = AlmProblem::new(
        bounds,
        NO_SET,
        NO_SET,
        |u: &[f64], xi: &[f64], cost: &mut f64| -> std::result::Result<(), SolverError> {
            factory.psi(u, xi, cost)
        },
        |u: &[f64], xi: &[f64], grad: &mut [f64]| -> std::result::Result<(), SolverError> {
            factory.d_psi(u, xi, grad)
        },
        NO_MAPPING,
        Some(f2),
        0,
        1,
    );

    let panoc_cache = PANOCCache::new(n, 1e-5, 3);
    let mut alm_cache = AlmCache::new(panoc_cache, 0, 1);
    let mut optimizer = AlmOptimizer::new(&mut alm_cache, problem)
        .with_max_outer_iterations(config.max_outer_iterations)
        .with_max_inner_iterations(config.max_inner_iterations)
        .with_epsilon_tolerance(config.epsilon_tolerance);
    if let Some(secs) = config.max_duration_secs {
        optimizer = optimizer.with_max_duration(Duration::from_secs_f64(secs));
    }

    let mut x = x0.to_vec();
    let status = optimizer
        .solve(&mut x)
        .map_err(|e| Error::Solver(format!("{e:?}")))?;
    viewer.display(&arm.lock().expand(&x)?);

    let report = OptimizationReport {
        cost: target_cost(arm, &x)?,
        x,
        converged: status.exit_status() == ExitStatus::Converged,
        outer_iterations: status.num_outer_iterations(),
        inner_iterations: status.num_inner_iterations(),
        solve_time: status.solve_time(),
    };
    debug!("{report:?}");
    Ok(report)
}

/// Restarts [`optimize`] from random free configurations until a run
/// converges collision free with a cost below `config.success_cost`
pub fn optimize_until_success<R, V>(
    arm: &PlanarArm,
    rng: &mut R,
    config: &OptimizationConfig,
    viewer: &V,
    max_attempts: usize,
) -> Result<OptimizationReport>
where
    R: Rng + ?Sized,
    V: Viewer<[f64]> + ?Sized,
{
    for attempt in 1..=max_attempts {
        let start = random_configuration(rng, arm.lock(), Some(arm), config.max_trials)?;
        let x0 = arm.lock().reduce(&start)?;
        match optimize(arm, &x0, config, viewer) {
            Ok(report)
                if report.converged
                    && report.cost < config.success_cost
                    && !arm.is_colliding(&arm.lock().expand(&report.x)?)? =>
            {
                info!("Finally successful after {attempt} attempts, cost={}", report.cost);
                return Ok(report);
            }
            Ok(report) => warn!(
                "Failed ... let's try again! (attempt {attempt}, cost={}, converged={})",
                report.cost, report.converged
            ),
            Err(e) => warn!("Failed ... let's try again! (attempt {attempt}, {e})"),
        }
    }
    Err(Error::OptimizationFailed(max_attempts))
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use robolab_viewer::{NoopViewer, RecordingViewer};

    use super::*;
    use crate::{arm::Target, collision::RobotCollisionDetectorConfig};

    fn arm() -> PlanarArm {
        PlanarArm::ur5(Target::default(), &RobotCollisionDetectorConfig::default()).unwrap()
    }

    #[test]
    fn central_difference_of_quadratic() {
        let mut grad = [0.0; 2];
        central_difference(
            |x| Ok(x[0] * x[0] + 3.0 * x[1]),
            &[2.0, -1.0],
            1e-6,
            &mut grad,
        )
        .unwrap();
        assert!((grad[0] - 4.0).abs() < 1e-5);
        assert!((grad[1] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn violation_is_zero_when_free() {
        let arm = arm();
        assert_eq!(constraint_violation(&arm, &[-2.356, 0.0]).unwrap(), 0.0);
        assert!(constraint_violation(&arm, &[0.0, 0.0]).unwrap() > 0.0);
    }

    #[test]
    fn wrong_start_size() {
        let arm = arm();
        assert!(matches!(
            optimize(&arm, &[0.0; 3], &OptimizationConfig::default(), &NoopViewer),
            Err(Error::DofMismatch(3, 2))
        ));
    }

    #[test]
    fn invalid_config() {
        let arm = arm();
        let config = OptimizationConfig {
            max_inner_iterations: 0,
            ..Default::default()
        };
        assert!(matches!(
            optimize(&arm, &[-2.356, 0.0], &config, &NoopViewer),
            Err(Error::Solver(_))
        ));
        let config = OptimizationConfig {
            epsilon_tolerance: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            optimize(&arm, &[-2.356, 0.0], &config, &NoopViewer),
            Err(Error::Solver(_))
        ));
    }

    #[test]
    fn optimize_reaches_the_default_target() {
        let arm = arm();
        // free and already within a few centimeters of (0.5, 0.5)
        let x0 = [-1.3, 1.0];
        let report = optimize(&arm, &x0, &OptimizationConfig::default(), &NoopViewer).unwrap();
        assert!(report.converged);
        assert!(report.cost < 1e-3, "{report:?}");
        assert!(!arm.is_colliding(&arm.lock().expand(&report.x).unwrap()).unwrap());
    }

    #[test]
    fn optimize_reduces_distance() {
        let mut arm = arm();
        // close enough to the folded configuration to stay clear of the obstacles
        let goal = arm.lock().expand(&[-2.33, 0.03]).unwrap();
        let p = arm.end_effector(&goal).unwrap();
        arm.set_target(Target::new(p.x, p.y));

        let x0 = [-2.356, 0.0];
        let start_distance = target_cost(&arm, &x0).unwrap();
        let viewer = RecordingViewer::new();
        let report = optimize(&arm, &x0, &OptimizationConfig::default(), &viewer).unwrap();
        assert_eq!(viewer.num_frames(), 2);
        assert_eq!(report.x.len(), 2);
        assert!(report.cost < start_distance);
        for v in &report.x {
            assert!((-PI..=PI).contains(v));
        }
    }

    #[test]
    fn no_attempt_is_a_failure() {
        let arm = arm();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            optimize_until_success(&arm, &mut rng, &OptimizationConfig::default(), &NoopViewer, 0),
            Err(Error::OptimizationFailed(0))
        ));
    }
}
