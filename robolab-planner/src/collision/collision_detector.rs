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
use std::{collections::HashMap, path::Path};

use k::nalgebra as na;
use na::RealField;
use ncollide3d::{
    bounding_volume::BoundingVolume,
    query,
    shape::{Compound, Shape, ShapeHandle},
};
use tracing::debug;

use super::urdf::urdf_geometry_to_shape_handle;

type NameShapeMap<T> = HashMap<String, Vec<(ShapeHandle<T>, na::Isometry3<T>)>>;

/// Lists collisions between a robot and an object
pub struct EnvCollisionNames<'a, 'b, T>
where
    T: RealField + Copy,
{
    detector: &'a CollisionDetector<T>,
    target_shape: &'b dyn Shape<T>,
    target_pose: &'b na::Isometry3<T>,
    joints: Vec<&'b k::Node<T>>,
    index: usize,
}

impl<'a, 'b, T> EnvCollisionNames<'a, 'b, T>
where
    T: RealField + Copy + k::SubsetOf<f64>,
{
    pub fn new(
        detector: &'a CollisionDetector<T>,
        robot: &'b k::Chain<T>,
        target_shape: &'b dyn Shape<T>,
        target_pose: &'b na::Isometry3<T>,
    ) -> Self {
        robot.update_transforms();
        let joints = robot.iter().collect();
        Self {
            detector,
            target_shape,
            target_pose,
            joints,
            index: 0,
        }
    }
}

impl<T> Iterator for EnvCollisionNames<'_, '_, T>
where
    T: RealField + Copy + k::SubsetOf<f64>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let target_aabb = self.target_shape.aabb(self.target_pose);
        while let Some(joint) = self.joints.get(self.index) {
            self.index += 1;
            // the joint guard must be released before `world_transform` locks the node again
            let joint_name = joint.joint().name.clone();
            let Some(obj_vec) = self.detector.name_collision_model_map.get(&joint_name) else {
                continue;
            };
            let Some(joint_pose) = joint.world_transform() else {
                debug!("world transform of {joint_name} is not updated");
                continue;
            };
            for (shape, local_pose) in obj_vec {
                let obj_pose = joint_pose * local_pose;
                // Broad phase: skip pairs whose AABBs are apart by more than the margin
                let aabb = shape.aabb(&obj_pose).loosened(self.detector.prediction);
                if !aabb.intersects(&target_aabb) {
                    continue;
                }
                let dist = query::distance(&obj_pose, &**shape, self.target_pose, self.target_shape);
                if dist < self.detector.prediction {
                    debug!("name: {joint_name}, dist={dist}");
                    return Some(joint_name);
                }
            }
        }
        None
    }
}

/// Lists distances between every robot link and an object
pub struct EnvDistances<'a, 'b, T>
where
    T: RealField + Copy,
{
    detector: &'a CollisionDetector<T>,
    target_shape: &'b dyn Shape<T>,
    target_pose: &'b na::Isometry3<T>,
    joints: Vec<&'b k::Node<T>>,
    index: usize,
}

impl<T> Iterator for EnvDistances<'_, '_, T>
where
    T: RealField + Copy + k::SubsetOf<f64>,
{
    type Item = (String, T);

    fn next(&mut self) -> Option<(String, T)> {
        while let Some(joint) = self.joints.get(self.index) {
            self.index += 1;
            let joint_name = joint.joint().name.clone();
            let (Some(obj_vec), Some(joint_pose)) = (
                self.detector.name_collision_model_map.get(&joint_name),
                joint.world_transform(),
            ) else {
                continue;
            };
            let min = obj_vec
                .iter()
                .map(|(shape, local_pose)| {
                    query::distance(
                        &(joint_pose * local_pose),
                        &**shape,
                        self.target_pose,
                        self.target_shape,
                    )
                })
                .fold(None, |acc: Option<T>, d| match acc {
                    Some(a) if a <= d => Some(a),
                    _ => Some(d),
                });
            if let Some(min) = min {
                return Some((joint_name, min));
            }
        }
        None
    }
}

#[derive(Clone)]
/// Collision detector
pub struct CollisionDetector<T>
where
    T: RealField + Copy,
{
    name_collision_model_map: NameShapeMap<T>,
    /// margin length for collision detection
    pub prediction: T,
}

impl<T> CollisionDetector<T>
where
    T: RealField + Copy + k::SubsetOf<f64>,
{
    /// Create CollisionDetector from HashMap
    pub fn new(name_collision_model_map: NameShapeMap<T>, prediction: T) -> Self {
        CollisionDetector {
            name_collision_model_map,
            prediction,
        }
    }

    /// Create CollisionDetector from urdf_rs::Robot
    ///
    /// The shapes of a link are registered under the name of its parent joint.
    pub fn from_urdf_robot(urdf_robot: &urdf_rs::Robot, prediction: T) -> Self {
        let mut name_collision_model_map = HashMap::new();
        let link_joint_map = k::urdf::link_to_joint_map(urdf_robot);
        for l in &urdf_robot.links {
            let col_pose_vec = l
                .collision
                .iter()
                .filter_map(|collision| {
                    urdf_geometry_to_shape_handle(&collision.geometry).map(|(col, offset)| {
                        (col, k::urdf::isometry_from(&collision.origin) * offset)
                    })
                })
                .collect::<Vec<_>>();
            debug!("name={}, ln={}", l.name, col_pose_vec.len());
            if !col_pose_vec.is_empty() {
                if let Some(joint_name) = link_joint_map.get(&l.name) {
                    name_collision_model_map.insert(joint_name.to_owned(), col_pose_vec);
                }
            }
        }
        CollisionDetector {
            name_collision_model_map,
            prediction,
        }
    }

    /// Detects collisions of a robot with an environmental object and returns the names of the link(joint) names
    ///
    /// robot: robot model
    /// target_shape: shape of the environmental object
    /// target_pose: pose of the environmental object
    pub fn detect_env<'a>(
        &'a self,
        robot: &'a k::Chain<T>,
        target_shape: &'a dyn Shape<T>,
        target_pose: &'a na::Isometry3<T>,
    ) -> EnvCollisionNames<'a, 'a, T> {
        EnvCollisionNames::new(self, robot, target_shape, target_pose)
    }

    /// Computes the distance of each link(joint) to an environmental object
    ///
    /// Penetrating shapes report zero.
    pub fn env_distances<'a>(
        &'a self,
        robot: &'a k::Chain<T>,
        target_shape: &'a dyn Shape<T>,
        target_pose: &'a na::Isometry3<T>,
    ) -> EnvDistances<'a, 'a, T> {
        robot.update_transforms();
        EnvDistances {
            detector: self,
            target_shape,
            target_pose,
            joints: robot.iter().collect(),
            index: 0,
        }
    }
}

/// Convert urdf object into robolab_planner/ncollide3d object
pub trait FromUrdf {
    fn from_urdf_robot(robot: &urdf_rs::Robot) -> Self;
    fn from_urdf_file<P>(path: P) -> ::std::result::Result<Self, urdf_rs::UrdfError>
    where
        Self: ::std::marker::Sized,
        P: AsRef<Path>,
    {
        Ok(Self::from_urdf_robot(&urdf_rs::read_file(path)?))
    }
    fn from_urdf_str(s: &str) -> ::std::result::Result<Self, urdf_rs::UrdfError>
    where
        Self: ::std::marker::Sized,
    {
        Ok(Self::from_urdf_robot(&urdf_rs::read_from_string(s)?))
    }
}

/// Create `ncollide::shape::Compound` from URDF file
///
/// The `<link>` elements are used as obstacles. set the origin/geometry of
/// `<collision>`. You can skip `<inertia>`.
impl FromUrdf for Compound<f64> {
    fn from_urdf_robot(urdf_obstacle: &urdf_rs::Robot) -> Self {
        let compound_data = urdf_obstacle
            .links
            .iter()
            .flat_map(|l| {
                l.collision.iter().filter_map(|collision| {
                    urdf_geometry_to_shape_handle(&collision.geometry).map(|(col, offset)| {
                        (k::urdf::isometry_from(&collision.origin) * offset, col)
                    })
                })
            })
            .collect::<Vec<_>>();
        Compound::new(compound_data)
    }
}
