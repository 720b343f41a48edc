/*
Copyright 2017 Takashi Ogura

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use std::cell::RefCell;

use rand::{rngs::StdRng, SeedableRng};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::*;

use crate::{arm::PlanarArm, errors::*, funcs::*};

/// Collision avoidance path planner over the active joints of a [`PlanarArm`]
pub struct JointPathPlanner {
    arm: PlanarArm,
    /// Unit length for searching
    ///
    /// If the value is large, the path become sparse.
    pub step_length: f64,
    /// Max num of RRT search loop
    pub max_try: usize,
    /// Num of path smoothing trials
    pub num_smoothing: usize,
    rng: RefCell<StdRng>,
}

impl JointPathPlanner {
    /// Create `JointPathPlanner`
    pub fn new(arm: PlanarArm, step_length: f64, max_try: usize, num_smoothing: usize) -> Self {
        JointPathPlanner {
            arm,
            step_length,
            max_try,
            num_smoothing,
            rng: RefCell::new(StdRng::from_entropy()),
        }
    }

    /// Check if the active joint positions are OK
    fn is_feasible(&self, active_positions: &[f64]) -> bool {
        let is_colliding = self
            .arm
            .lock()
            .expand(active_positions)
            .and_then(|q| self.arm.is_colliding(&q));
        match is_colliding {
            Ok(is_colliding) => !is_colliding,
            Err(err) => {
                debug!("is_feasible: {err}");
                false
            }
        }
    }

    fn collision_link_names(&self, active_positions: &[f64]) -> Result<Vec<String>> {
        self.arm
            .collision_link_names(&self.arm.lock().expand(active_positions)?)
    }

    /// Plan the sequence of active joint angles
    ///
    /// # Arguments
    ///
    /// - `start_angles`: initial angles of the active joints.
    /// - `goal_angles`: goal angles of the active joints.
    pub fn plan(&self, start_angles: &[f64], goal_angles: &[f64]) -> Result<Vec<Vec<f64>>> {
        let dof = self.arm.lock().reduced_dof();
        if start_angles.len() != dof {
            return Err(Error::DofMismatch(start_angles.len(), dof));
        }
        if goal_angles.len() != dof {
            return Err(Error::DofMismatch(goal_angles.len(), dof));
        }
        if !self.is_feasible(start_angles) {
            return Err(Error::Collision {
                part: CollisionPart::Start,
                collision_link_names: self.collision_link_names(start_angles)?,
            });
        } else if !self.is_feasible(goal_angles) {
            return Err(Error::Collision {
                part: CollisionPart::Goal,
                collision_link_names: self.collision_link_names(goal_angles)?,
            });
        }

        let limits: Limits<f64> = self.arm.active_limits();
        let mut path = rrt::dual_rrt_connect(
            start_angles,
            goal_angles,
            |angles: &[f64]| self.is_feasible(angles),
            || {
                generate_random_joint_positions_from_limits_with_rng(
                    &limits,
                    &mut *self.rng.borrow_mut(),
                )
            },
            self.step_length,
            self.max_try,
        )
        .map_err(Error::PathPlanFail)?;
        debug!("rrt found a path of {} points", path.len());
        rrt::smooth_path(
            &mut path,
            |angles: &[f64]| self.is_feasible(angles),
            self.step_length,
            self.num_smoothing,
        );
        info!("planned a path of {} points", path.len());
        Ok(path)
    }

    /// Seed the sampler, for reproducible plans
    pub fn seed(&self, seed: u64) {
        *self.rng.borrow_mut() = StdRng::seed_from_u64(seed);
    }

    pub fn arm(&self) -> &PlanarArm {
        &self.arm
    }
}

/// Builder pattern to create `JointPathPlanner`
pub struct JointPathPlannerBuilder {
    arm: PlanarArm,
    step_length: f64,
    max_try: usize,
    num_smoothing: usize,
    seed: Option<u64>,
}

impl JointPathPlannerBuilder {
    pub fn new(arm: PlanarArm) -> Self {
        JointPathPlannerBuilder {
            arm,
            step_length: default_step_length(),
            max_try: default_max_try(),
            num_smoothing: default_num_smoothing(),
            seed: None,
        }
    }

    pub fn step_length(mut self, step_length: f64) -> Self {
        self.step_length = step_length;
        self
    }

    pub fn max_try(mut self, max_try: usize) -> Self {
        self.max_try = max_try;
        self
    }

    pub fn num_smoothing(mut self, num_smoothing: usize) -> Self {
        self.num_smoothing = num_smoothing;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn finalize(self) -> JointPathPlanner {
        let planner =
            JointPathPlanner::new(self.arm, self.step_length, self.max_try, self.num_smoothing);
        if let Some(seed) = self.seed {
            planner.seed(seed);
        }
        planner
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct JointPathPlannerConfig {
    #[serde(default = "default_step_length")]
    pub step_length: f64,
    #[serde(default = "default_max_try")]
    pub max_try: usize,
    #[serde(default = "default_num_smoothing")]
    pub num_smoothing: usize,
}

fn default_step_length() -> f64 {
    0.1
}

fn default_max_try() -> usize {
    5000
}

fn default_num_smoothing() -> usize {
    100
}

impl Default for JointPathPlannerConfig {
    fn default() -> Self {
        Self {
            step_length: default_step_length(),
            max_try: default_max_try(),
            num_smoothing: default_num_smoothing(),
        }
    }
}

/// Create a `JointPathPlanner` with the given config
pub fn create_joint_path_planner(arm: PlanarArm, config: &JointPathPlannerConfig) -> JointPathPlanner {
    JointPathPlannerBuilder::new(arm)
        .step_length(config.step_length)
        .max_try(config.max_try)
        .num_smoothing(config.num_smoothing)
        .finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{arm::Target, collision::RobotCollisionDetectorConfig};

    fn planner() -> JointPathPlanner {
        let arm = PlanarArm::ur5(Target::default(), &RobotCollisionDetectorConfig::default())
            .unwrap();
        create_joint_path_planner(arm, &JointPathPlannerConfig::default())
    }

    #[test]
    fn test_collision_at_start_and_goal() {
        let planner = planner();
        let free = [-2.356, 0.0];
        match planner.plan(&[0.0, 0.0], &free) {
            Err(Error::Collision {
                part,
                collision_link_names,
            }) => {
                assert_eq!(part, CollisionPart::Start);
                assert_eq!(
                    collision_link_names,
                    vec!["elbow_joint", "shoulder_lift_joint"]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            planner.plan(&free, &[0.0, 0.0]),
            Err(Error::Collision {
                part: CollisionPart::Goal,
                ..
            })
        ));
        assert!(matches!(
            planner.plan(&[0.0], &free),
            Err(Error::DofMismatch(1, 2))
        ));
    }

    // RRT-based planning does not succeed every time.
    #[flaky_test::flaky_test]
    fn test_plan_between_free_configurations() {
        let planner = planner();
        let start = [-2.356, 0.0];
        let goal = [-2.3, 0.05];
        assert!(planner.is_feasible(&goal));
        let path = planner.plan(&start, &goal).unwrap();
        assert!(path.len() >= 2);
        assert_eq!(path[0], start.to_vec());
        assert_eq!(path[path.len() - 1], goal.to_vec());
        for q in &path {
            assert!(planner.is_feasible(q));
        }
    }
}
