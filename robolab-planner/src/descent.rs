use std::time::Duration;

use rand::Rng;
use robolab_viewer::Viewer;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    arm::PlanarArm,
    errors::*,
    sampling::{random_configuration, DEFAULT_MAX_TRIALS},
};

/// Parameters of [`random_descent`]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DescentConfig {
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Random steps are sampled configurations scaled by this factor
    #[serde(default = "default_step_scale")]
    pub step_scale: f64,
    /// Pause after each accepted step, in milliseconds
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
    #[serde(default = "default_max_trials")]
    pub max_trials: usize,
}

fn default_iterations() -> usize {
    100
}

fn default_step_scale() -> f64 {
    0.1
}

fn default_pause_ms() -> u64 {
    5
}

fn default_max_trials() -> usize {
    DEFAULT_MAX_TRIALS
}

impl Default for DescentConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            step_scale: default_step_scale(),
            pause_ms: default_pause_ms(),
            max_trials: default_max_trials(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescentReport {
    pub start: Vec<f64>,
    pub last: Vec<f64>,
    /// Accepted configurations, in order
    pub trace: Vec<Vec<f64>>,
    pub start_distance: f64,
    pub final_distance: f64,
}

/// Crawls from a random free configuration toward the target with random steps
///
/// A step is kept only if it stays inside the joint limits and gets closer to
/// the target without colliding.
pub fn random_descent<R, V>(
    arm: &PlanarArm,
    rng: &mut R,
    config: &DescentConfig,
    viewer: &V,
) -> Result<DescentReport>
where
    R: Rng + ?Sized,
    V: Viewer<[f64]> + ?Sized,
{
    let start = random_configuration(rng, arm.lock(), Some(arm), config.max_trials)?;
    let start_distance = arm.distance_to_target(&start)?;
    let pause = Duration::from_millis(config.pause_ms);
    let mut q = start.clone();
    let mut distance = start_distance;
    let mut trace = Vec::new();
    for i in 0..config.iterations {
        let dq = random_configuration(rng, arm.lock(), None, 1)?;
        let q_try: Vec<f64> = q
            .iter()
            .zip(&dq)
            .map(|(q, dq)| q + dq * config.step_scale)
            .collect();
        if !arm.is_within_limits(&q_try) {
            debug!("step {i}: out of the joint limits");
            continue;
        }
        let distance_try = arm.distance_to_target(&q_try)?;
        if distance_try < distance && !arm.is_colliding(&q_try)? {
            debug!("step {i}: {distance} -> {distance_try}");
            q = q_try;
            distance = distance_try;
            viewer.display(&q);
            viewer.sleep(pause);
            trace.push(q.clone());
        }
    }
    info!(
        "random descent: {} accepted steps, distance {start_distance} -> {distance}",
        trace.len()
    );
    Ok(DescentReport {
        start,
        last: q,
        trace,
        start_distance,
        final_distance: distance,
    })
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use robolab_viewer::RecordingViewer;

    use super::*;
    use crate::{arm::Target, collision::RobotCollisionDetectorConfig};

    #[test]
    fn descent_never_goes_up() {
        let arm = PlanarArm::ur5(Target::default(), &RobotCollisionDetectorConfig::default())
            .unwrap();
        let viewer = RecordingViewer::new();
        let mut rng = StdRng::seed_from_u64(10);
        let config = DescentConfig {
            pause_ms: 0,
            ..Default::default()
        };
        let report = random_descent(&arm, &mut rng, &config, &viewer).unwrap();

        assert!(report.final_distance <= report.start_distance);
        assert_eq!(viewer.num_frames(), report.trace.len());
        let mut previous = report.start_distance;
        for q in &report.trace {
            let d = arm.distance_to_target(q).unwrap();
            assert!(d < previous);
            assert!(!arm.is_colliding(q).unwrap());
            previous = d;
        }
        match report.trace.last() {
            Some(last) => assert_eq!(last, &report.last),
            None => assert_eq!(report.start, report.last),
        }
    }

    #[test]
    fn zero_iterations() {
        let arm = PlanarArm::ur5(Target::default(), &RobotCollisionDetectorConfig::default())
            .unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let config = DescentConfig {
            iterations: 0,
            ..Default::default()
        };
        let report =
            random_descent(&arm, &mut rng, &config, &robolab_viewer::NoopViewer).unwrap();
        assert!(report.trace.is_empty());
        assert_eq!(report.start, report.last);
        assert_eq!(report.start_distance, report.final_distance);
    }
}
