//! Robot and obstacle models of the planar arm exercise.

use ncollide3d::shape::Compound;
use tracing::debug;

use crate::{
    collision::{
        create_robot_collision_detector, FromUrdf, RobotCollisionDetector,
        RobotCollisionDetectorConfig,
    },
    errors::*,
};

/// UR5 arm with capsules on the moving links.
pub const UR5_URDF: &str = include_str!("../assets/ur5_arm.urdf");
/// Three capsules placed in front of, above and below the arm.
pub const OBSTACLES_URDF: &str = include_str!("../assets/ur5_obstacles.urdf");

/// Name of the joint whose frame is used as the end effector.
pub const UR5_END_JOINT: &str = "wrist_3_joint";

/// A robot with the obstacles around it.
pub struct RobotWithObstacles {
    pub detector: RobotCollisionDetector<f64>,
    pub obstacles: Compound<f64>,
}

impl RobotWithObstacles {
    pub fn from_urdf_strs(
        robot: &str,
        obstacles: &str,
        config: &RobotCollisionDetectorConfig,
    ) -> Result<Self> {
        let urdf_robot = urdf_rs::read_from_string(robot)?;
        let obstacles = Compound::from_urdf_str(obstacles)?;
        Ok(Self::new(&urdf_robot, obstacles, config))
    }

    fn new(
        urdf_robot: &urdf_rs::Robot,
        obstacles: Compound<f64>,
        config: &RobotCollisionDetectorConfig,
    ) -> Self {
        let detector = create_robot_collision_detector(urdf_robot, config);
        debug!(
            "robot {} dof={}, {} obstacles",
            urdf_robot.name,
            detector.robot.dof(),
            obstacles.shapes().len()
        );
        Self {
            detector,
            obstacles,
        }
    }
}

/// Loads the embedded UR5 and its obstacles.
pub fn load_ur5_with_obstacles(config: &RobotCollisionDetectorConfig) -> Result<RobotWithObstacles> {
    RobotWithObstacles::from_urdf_strs(UR5_URDF, OBSTACLES_URDF, config)
}
