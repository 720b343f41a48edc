use std::path::{Path, PathBuf};

use robolab_planner::{
    robot::{self, RobotWithObstacles},
    DescentConfig, JointLock, JointPathPlannerConfig, OptimizationConfig, PlanarArm,
    RobotCollisionDetectorConfig, Target, DEFAULT_COLLISION_THRESHOLD, DEFAULT_MAX_TRIALS,
    DEFAULT_TARGET_THRESHOLD,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{utils::resolve_path, Error};

/// Settings of `robolab-path-planning`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PathPlanningConfig {
    /// URDF of the robot, the embedded UR5 if not set
    #[serde(default)]
    pub robot_urdf_path: Option<PathBuf>,
    /// URDF whose collision elements are the obstacles, the embedded ones if not set
    #[serde(default)]
    pub obstacles_urdf_path: Option<PathBuf>,
    /// Joint whose frame is the end effector
    #[serde(default = "default_end_joint")]
    pub end_joint: String,
    /// (x, z) position of the target
    #[serde(default = "default_target")]
    pub target: [f64; 2],
    #[serde(default = "default_target_radius")]
    pub target_radius: f64,
    #[serde(default = "default_collision_threshold")]
    pub collision_threshold: f64,
    /// Distance to the target accepted by the `target` command
    #[serde(default = "default_target_threshold")]
    pub target_threshold: f64,
    #[serde(default = "default_max_trials")]
    pub max_trials: usize,
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,
    /// Restarts of the `optimize --until-success` command
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Sleep between frames for real
    #[serde(default)]
    pub animate: bool,
    // tables come last so that the config can be written as TOML
    #[serde(default)]
    pub joint_lock: JointLock,
    #[serde(default)]
    pub collision_detector: RobotCollisionDetectorConfig,
    #[serde(default)]
    pub descent: DescentConfig,
    #[serde(default)]
    pub optimization: OptimizationConfig,
    #[serde(default)]
    pub path_planner: JointPathPlannerConfig,
}

fn default_end_joint() -> String {
    robot::UR5_END_JOINT.to_owned()
}

fn default_target() -> [f64; 2] {
    [0.5, 0.5]
}

fn default_target_radius() -> f64 {
    0.05
}

fn default_collision_threshold() -> f64 {
    DEFAULT_COLLISION_THRESHOLD
}

fn default_target_threshold() -> f64 {
    DEFAULT_TARGET_THRESHOLD
}

fn default_max_trials() -> usize {
    DEFAULT_MAX_TRIALS
}

fn default_num_samples() -> usize {
    500
}

fn default_max_attempts() -> usize {
    100
}

impl Default for PathPlanningConfig {
    fn default() -> Self {
        Self {
            robot_urdf_path: None,
            obstacles_urdf_path: None,
            end_joint: default_end_joint(),
            joint_lock: JointLock::default(),
            target: default_target(),
            target_radius: default_target_radius(),
            collision_threshold: default_collision_threshold(),
            collision_detector: RobotCollisionDetectorConfig::default(),
            target_threshold: default_target_threshold(),
            max_trials: default_max_trials(),
            num_samples: default_num_samples(),
            descent: DescentConfig::default(),
            optimization: OptimizationConfig::default(),
            max_attempts: default_max_attempts(),
            path_planner: JointPathPlannerConfig::default(),
            animate: false,
        }
    }
}

impl PathPlanningConfig {
    pub fn try_new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_str(
            &std::fs::read_to_string(&path)
                .map_err(|e| Error::NoFile(path.as_ref().to_owned(), e))?,
            &path,
        )
    }

    /// Parses `s`, resolving the URDF paths relative to the directory of `path`
    pub fn from_str<P: AsRef<Path>>(s: &str, path: P) -> Result<Self, Error> {
        let mut config: PathPlanningConfig =
            toml::from_str(s).map_err(|e| Error::TomlParseFailure(path.as_ref().to_owned(), e))?;
        if let Some(robot_path) = &config.robot_urdf_path {
            config.robot_urdf_path = Some(resolve_path(robot_path, path.as_ref())?);
        }
        if let Some(obstacles_path) = &config.obstacles_urdf_path {
            config.obstacles_urdf_path = Some(resolve_path(obstacles_path, path.as_ref())?);
        }
        debug!("{config:?}");
        Ok(config)
    }

    pub fn target(&self) -> Target {
        Target::new(self.target[0], self.target[1]).with_radius(self.target_radius)
    }

    /// Loads the robot and the obstacles, embedded or from the configured URDFs
    pub fn create_arm(&self) -> Result<PlanarArm, Error> {
        let scene = match (&self.robot_urdf_path, &self.obstacles_urdf_path) {
            (None, None) => robot::load_ur5_with_obstacles(&self.collision_detector)?,
            (robot_path, obstacles_path) => {
                let robot_urdf = match robot_path {
                    Some(p) => {
                        std::fs::read_to_string(p).map_err(|e| Error::NoFile(p.to_owned(), e))?
                    }
                    None => robot::UR5_URDF.to_owned(),
                };
                let obstacles_urdf = match obstacles_path {
                    Some(p) => {
                        std::fs::read_to_string(p).map_err(|e| Error::NoFile(p.to_owned(), e))?
                    }
                    None => robot::OBSTACLES_URDF.to_owned(),
                };
                RobotWithObstacles::from_urdf_strs(
                    &robot_urdf,
                    &obstacles_urdf,
                    &self.collision_detector,
                )?
            }
        };
        Ok(PlanarArm::new(scene, self.joint_lock.clone(), &self.end_joint, self.target())?
            .with_threshold(self.collision_threshold))
    }
}
