use std::{fs::File, io::Write, path::Path, time::Duration};

use rand::Rng;
use robolab_viewer::Viewer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{arm::PlanarArm, errors::*, joint_lock::JointLock};

/// Active joints are drawn in `[-SAMPLE_RANGE, SAMPLE_RANGE)`
pub const SAMPLE_RANGE: f64 = 3.0;
/// Default bound on rejection sampling loops
pub const DEFAULT_MAX_TRIALS: usize = 100_000;
/// Default distance to the target accepted by [`random_target_configuration`]
pub const DEFAULT_TARGET_THRESHOLD: f64 = 5e-2;
/// Obstacle distance recorded for colliding samples
pub const COLLIDING_SAMPLE_DISTANCE: f64 = 1e-2;

/// Draws a full configuration with uniform active joints and zero locked joints
///
/// With `check`, draws are repeated until one is collision free.
pub fn random_configuration<R>(
    rng: &mut R,
    lock: &JointLock,
    check: Option<&PlanarArm>,
    max_trials: usize,
) -> Result<Vec<f64>>
where
    R: Rng + ?Sized,
{
    for _ in 0..max_trials {
        let reduced: Vec<f64> = (0..lock.reduced_dof())
            .map(|_| rng.gen::<f64>() * 2.0 * SAMPLE_RANGE - SAMPLE_RANGE)
            .collect();
        let q = lock.expand(&reduced)?;
        match check {
            Some(arm) if arm.is_colliding(&q)? => continue,
            _ => return Ok(q),
        }
    }
    Err(Error::SamplingExhausted {
        what: "collision free configuration",
        trials: max_trials,
    })
}

/// Rejection-samples a free configuration whose end effector is near the target
///
/// Every candidate is shown to `viewer`.
pub fn random_target_configuration<R, V>(
    arm: &PlanarArm,
    rng: &mut R,
    threshold: f64,
    viewer: &V,
    max_trials: usize,
) -> Result<Vec<f64>>
where
    R: Rng + ?Sized,
    V: Viewer<[f64]> + ?Sized,
{
    for trial in 0..max_trials {
        let q = random_configuration(rng, arm.lock(), None, 1)?;
        viewer.display(&q);
        viewer.sleep(Duration::from_millis(1));
        if !arm.is_colliding(&q)? && arm.distance_to_target(&q)? < threshold {
            info!("found a configuration close to the target after {} trials", trial + 1);
            return Ok(q);
        }
    }
    Err(Error::SamplingExhausted {
        what: "configuration close to the target",
        trials: max_trials,
    })
}

/// One sampled configuration of the two active joints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationSample {
    pub q: [f64; 2],
    pub target_distance: f64,
    pub obstacle_distance: f64,
}

/// Samples of the configuration space split by collision status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampledSpace {
    pub free: Vec<ConfigurationSample>,
    pub colliding: Vec<ConfigurationSample>,
}

impl SampledSpace {
    pub fn len(&self) -> usize {
        self.free.len() + self.colliding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).map_err(|e| Error::Other {
            error: e.to_string(),
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_json(file)
    }
}

/// Draws `num_samples` configurations and measures both distances for each
///
/// Only arms with two active joints can be sampled this way.
pub fn sample_space<R>(arm: &PlanarArm, rng: &mut R, num_samples: usize) -> Result<SampledSpace>
where
    R: Rng + ?Sized,
{
    if arm.lock().reduced_dof() != 2 {
        return Err(Error::DofMismatch(arm.lock().reduced_dof(), 2));
    }
    let mut space = SampledSpace::default();
    for _ in 0..num_samples {
        let q = random_configuration(rng, arm.lock(), None, 1)?;
        let reduced = arm.lock().reduce(&q)?;
        let target_distance = arm.distance_to_target(&q)?;
        if arm.is_colliding(&q)? {
            space.colliding.push(ConfigurationSample {
                q: [reduced[0], reduced[1]],
                target_distance,
                obstacle_distance: COLLIDING_SAMPLE_DISTANCE,
            });
        } else {
            space.free.push(ConfigurationSample {
                q: [reduced[0], reduced[1]],
                target_distance,
                obstacle_distance: arm.collision_distance(&q)?,
            });
        }
    }
    debug!(
        "sampled {} free and {} colliding configurations",
        space.free.len(),
        space.colliding.len()
    );
    Ok(space)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use robolab_viewer::{NoopViewer, RecordingViewer};

    use super::*;
    use crate::{
        arm::{Target, DEFAULT_COLLISION_THRESHOLD},
        collision::RobotCollisionDetectorConfig,
    };

    fn arm() -> PlanarArm {
        PlanarArm::ur5(Target::default(), &RobotCollisionDetectorConfig::default()).unwrap()
    }

    #[test]
    fn unchecked_samples_are_in_range() {
        let lock = JointLock::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let q = random_configuration(&mut rng, &lock, None, 1).unwrap();
            assert_eq!(q.len(), 6);
            for (i, v) in q.iter().enumerate() {
                if lock.active.contains(&i) {
                    assert!((-SAMPLE_RANGE..SAMPLE_RANGE).contains(v));
                } else {
                    assert_eq!(*v, 0.0);
                }
            }
        }
    }

    #[test]
    fn checked_samples_are_free() {
        let arm = arm();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..20 {
            let q = random_configuration(&mut rng, arm.lock(), Some(&arm), DEFAULT_MAX_TRIALS)
                .unwrap();
            assert!(!arm.is_colliding(&q).unwrap());
        }
    }

    #[test]
    fn zero_trials_is_exhausted() {
        let arm = arm();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            random_configuration(&mut rng, arm.lock(), Some(&arm), 0),
            Err(Error::SamplingExhausted { trials: 0, .. })
        ));
        assert!(matches!(
            random_target_configuration(&arm, &mut rng, 0.1, &NoopViewer, 0),
            Err(Error::SamplingExhausted { trials: 0, .. })
        ));
    }

    #[test]
    fn target_configuration_is_close_and_free() {
        let mut arm = arm();
        // a target the arm can reach without collision
        let folded = arm.lock().expand(&[-2.356, 0.0]).unwrap();
        let p = arm.end_effector(&folded).unwrap();
        arm.set_target(Target::new(p.x, p.y));

        let viewer = RecordingViewer::new();
        let mut rng = StdRng::seed_from_u64(4);
        let q = random_target_configuration(&arm, &mut rng, 0.1, &viewer, DEFAULT_MAX_TRIALS)
            .unwrap();
        assert!(arm.distance_to_target(&q).unwrap() < 0.1);
        assert!(!arm.is_colliding(&q).unwrap());
        assert_eq!(viewer.last_frame(), Some(q));
    }

    #[test]
    fn sampled_space() {
        let arm = arm();
        let mut rng = StdRng::seed_from_u64(5);
        let space = sample_space(&arm, &mut rng, 200).unwrap();
        assert_eq!(space.len(), 200);
        // the obstacles cover a good part of the space
        assert!(!space.free.is_empty());
        assert!(!space.colliding.is_empty());
        for s in &space.colliding {
            assert_eq!(s.obstacle_distance, COLLIDING_SAMPLE_DISTANCE);
        }
        for s in &space.free {
            assert!(s.obstacle_distance > -DEFAULT_COLLISION_THRESHOLD);
            assert!(s.target_distance >= 0.0);
        }

        let mut json = Vec::new();
        space.write_json(&mut json).unwrap();
        let parsed: SampledSpace = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed.len(), 200);
    }
}
