use k::nalgebra as na;
use ncollide3d::shape::Compound;
use robolab_viewer::{colors, Marker, MarkerShape, Pose};
use tracing::debug;

use crate::{
    collision::{RobotCollisionDetector, RobotCollisionDetectorConfig},
    errors::*,
    joint_lock::JointLock,
    robot::{load_ur5_with_obstacles, RobotWithObstacles, UR5_END_JOINT},
};

/// Default margin subtracted from the obstacle distance
pub const DEFAULT_COLLISION_THRESHOLD: f64 = 1e-2;

/// Point to reach in the (x, z) plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub position: na::Vector2<f64>,
    pub radius: f64,
}

impl Target {
    pub fn new(x: f64, z: f64) -> Self {
        Self {
            position: na::Vector2::new(x, z),
            radius: 0.05,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Sphere drawn in the plane of the arm, at y = 0
    pub fn to_marker(&self) -> Marker {
        Marker::new(
            "target",
            MarkerShape::Sphere {
                radius: self.radius,
            },
            colors::GREEN,
            Pose::from_translation(self.position.x, 0.0, self.position.y),
        )
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

impl From<&Target> for Marker {
    fn from(target: &Target) -> Self {
        target.to_marker()
    }
}

/// An arm moving in its vertical plane among obstacles
///
/// All the queries take the full configuration of the robot. Use
/// [`JointLock::expand`] to build one from the active joints.
pub struct PlanarArm {
    detector: RobotCollisionDetector<f64>,
    obstacles: Compound<f64>,
    lock: JointLock,
    end_joint_name: String,
    target: Target,
    threshold: f64,
}

impl PlanarArm {
    pub fn new(
        scene: RobotWithObstacles,
        lock: JointLock,
        end_joint_name: &str,
        target: Target,
    ) -> Result<Self> {
        let dof = scene.detector.robot.dof();
        lock.validate()?;
        if lock.dof != dof {
            return Err(Error::DofMismatch(lock.dof, dof));
        }
        if scene.detector.robot.find(end_joint_name).is_none() {
            return Err(Error::NotFound(end_joint_name.to_owned()));
        }
        Ok(Self {
            detector: scene.detector,
            obstacles: scene.obstacles,
            lock,
            end_joint_name: end_joint_name.to_owned(),
            target,
            threshold: DEFAULT_COLLISION_THRESHOLD,
        })
    }

    /// The embedded UR5 with shoulder lift and elbow active
    pub fn ur5(target: Target, config: &RobotCollisionDetectorConfig) -> Result<Self> {
        Self::new(
            load_ur5_with_obstacles(config)?,
            JointLock::default(),
            UR5_END_JOINT,
            target,
        )
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn lock(&self) -> &JointLock {
        &self.lock
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn set_target(&mut self, target: Target) {
        self.target = target;
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn obstacles(&self) -> &Compound<f64> {
        &self.obstacles
    }

    pub fn detector(&self) -> &RobotCollisionDetector<f64> {
        &self.detector
    }

    /// Limits of the active joints
    pub fn active_limits(&self) -> Vec<Option<k::joint::Range<f64>>> {
        let limits: Vec<_> = self.detector.robot.iter_joints().map(|j| j.limits).collect();
        self.lock
            .active
            .iter()
            .map(|&i| limits.get(i).copied().flatten())
            .collect()
    }

    /// Whether every joint of `q` is inside its limits
    pub fn is_within_limits(&self, q: &[f64]) -> bool {
        self.detector
            .robot
            .iter_joints()
            .zip(q)
            .all(|(joint, &v)| match joint.limits {
                Some(range) => range.is_valid(v),
                None => true,
            })
    }

    fn set_configuration(&self, q: &[f64]) -> Result<()> {
        if q.len() != self.lock.dof {
            return Err(Error::DofMismatch(q.len(), self.lock.dof));
        }
        self.detector.robot.set_joint_positions(q)?;
        self.detector.robot.update_transforms();
        Ok(())
    }

    /// (x, z) position of the end joint frame
    pub fn end_effector(&self, q: &[f64]) -> Result<na::Vector2<f64>> {
        self.set_configuration(q)?;
        let node = self
            .detector
            .robot
            .find(&self.end_joint_name)
            .ok_or_else(|| Error::NotFound(self.end_joint_name.clone()))?;
        let pose = node
            .world_transform()
            .ok_or_else(|| Error::Other {
                error: format!("no world transform for {}", self.end_joint_name),
            })?;
        let t = pose.translation.vector;
        Ok(na::Vector2::new(t.x, t.z))
    }

    pub fn distance_to_target(&self, q: &[f64]) -> Result<f64> {
        Ok((self.end_effector(q)? - self.target.position).norm())
    }

    /// Whether any link is within the prediction margin of an obstacle
    pub fn is_colliding(&self, q: &[f64]) -> Result<bool> {
        self.set_configuration(q)?;
        Ok(self.detector.is_env_collision_detected(&self.obstacles))
    }

    pub fn collision_link_names(&self, q: &[f64]) -> Result<Vec<String>> {
        self.set_configuration(q)?;
        Ok(self.detector.env_collision_link_names(&self.obstacles))
    }

    /// Distance to the obstacles minus the threshold, `-threshold` when colliding
    pub fn collision_distance(&self, q: &[f64]) -> Result<f64> {
        if self.is_colliding(q)? {
            return Ok(-self.threshold);
        }
        match self.detector.min_env_distance(&self.obstacles) {
            Some(d) => Ok(d - self.threshold),
            None => {
                debug!("no collision geometry, the obstacle distance is infinite");
                Ok(f64::INFINITY)
            }
        }
    }
}
