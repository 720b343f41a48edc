use k::nalgebra as na;
use na::RealField;
use ncollide3d::shape::{Compound, Shape};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionDetector, EnvCollisionNames, EnvDistances};

pub struct RobotCollisionDetector<N>
where
    N: RealField + Copy + k::SubsetOf<f64>,
{
    /// Robot model instance used for collision detection
    pub robot: k::Chain<N>,
    /// Collision detector
    pub collision_detector: CollisionDetector<N>,
}

/// CollisionDetector holding robot information
impl<N> RobotCollisionDetector<N>
where
    N: RealField + Copy + k::SubsetOf<f64>,
{
    pub fn new(robot: k::Chain<N>, collision_detector: CollisionDetector<N>) -> Self {
        RobotCollisionDetector {
            robot,
            collision_detector,
        }
    }

    /// Detects collisions of the robot with an environmental object and returns names of the colliding links(joints)
    ///
    /// target_shape: shape of the environmental object
    /// target_pose: pose of the environmental object
    pub fn detect_env<'a>(
        &'a self,
        target_shape: &'a dyn Shape<N>,
        target_pose: &'a na::Isometry3<N>,
    ) -> EnvCollisionNames<'a, 'a, N> {
        self.collision_detector
            .detect_env(&self.robot, target_shape, target_pose)
    }

    /// Distances of the links(joints) of the robot to an environmental object
    pub fn env_distances<'a>(
        &'a self,
        target_shape: &'a dyn Shape<N>,
        target_pose: &'a na::Isometry3<N>,
    ) -> EnvDistances<'a, 'a, N> {
        self.collision_detector
            .env_distances(&self.robot, target_shape, target_pose)
    }

    /// Gets names of links colliding with environmental objects
    /// objects: environmental objects
    pub fn env_collision_link_names(&self, objects: &Compound<N>) -> Vec<String> {
        let mut ret = Vec::new();
        for shape in objects.shapes() {
            let mut colliding_names = self.detect_env(&*shape.1, &shape.0).collect();
            ret.append(&mut colliding_names);
        }
        ret.sort();
        ret.dedup();
        ret
    }

    /// Returns whether any collision of the robot with environmental objects is detected or not
    /// objects: environmental objects
    pub fn is_env_collision_detected(&self, objects: &Compound<N>) -> bool {
        objects
            .shapes()
            .iter()
            .any(|shape| self.detect_env(&*shape.1, &shape.0).next().is_some())
    }

    /// Minimal distance between the robot and environmental objects
    ///
    /// Returns `None` if either side has no geometry.
    pub fn min_env_distance(&self, objects: &Compound<N>) -> Option<N> {
        objects
            .shapes()
            .iter()
            .flat_map(|shape| self.env_distances(&*shape.1, &shape.0).map(|(_, d)| d))
            .fold(None, |acc, d| match acc {
                Some(a) if a <= d => Some(a),
                _ => Some(d),
            })
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, JsonSchema)]
#[serde(deny_unknown_fields)]
/// Configuration struct for RobotCollisionDetector
pub struct RobotCollisionDetectorConfig {
    #[serde(default = "default_prediction")]
    pub prediction: f64,
}

fn default_prediction() -> f64 {
    0.001
}

impl RobotCollisionDetectorConfig {
    pub fn new(prediction: f64) -> Self {
        RobotCollisionDetectorConfig { prediction }
    }
}

impl Default for RobotCollisionDetectorConfig {
    fn default() -> Self {
        Self {
            prediction: default_prediction(),
        }
    }
}

/// Creates a RobotCollisionDetector from a parsed URDF
pub fn create_robot_collision_detector(
    urdf_robot: &urdf_rs::Robot,
    config: &RobotCollisionDetectorConfig,
) -> RobotCollisionDetector<f64> {
    let robot = k::Chain::<f64>::from(urdf_robot);
    let collision_detector = CollisionDetector::from_urdf_robot(urdf_robot, config.prediction);
    RobotCollisionDetector::new(robot, collision_detector)
}
