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
#![allow(clippy::ptr_arg)]

use std::f64::consts::PI;

use k::{nalgebra as na, nalgebra::RealField};
use num_traits::Float;
use rand::Rng;
use trajectory::{CubicSpline, Trajectory};

pub type Limits<T> = Vec<Option<k::joint::Range<T>>>;

/// Draws one angle per joint, uniformly within its range or within [-π, π)
/// when the joint is unlimited
pub fn generate_random_joint_positions_from_limits_with_rng<T, R>(
    limits: &Limits<T>,
    rng: &mut R,
) -> Vec<T>
where
    T: RealField + Copy,
    R: Rng + ?Sized,
{
    limits
        .iter()
        .map(|range| {
            let (min, max) = match range {
                Some(range) => (range.min, range.max),
                None => (na::convert(-PI), na::convert(PI)),
            };
            min + (max - min) * na::convert(rng.gen::<f64>())
        })
        .collect()
}

/// Struct for a point of a trajectory with multiple dimensions.
#[derive(Debug, Clone)]
pub struct TrajectoryPoint<T> {
    pub position: Vec<T>,
    pub velocity: Vec<T>,
    pub acceleration: Vec<T>,
}

impl<T> TrajectoryPoint<T> {
    /// Create trajectory point
    pub fn new(position: Vec<T>, velocity: Vec<T>, acceleration: Vec<T>) -> Self {
        Self {
            position,
            velocity,
            acceleration,
        }
    }
}

/// Interpolate position vectors
///
/// returns vector of (position, velocity, acceleration)
///
/// # Example
///
/// ```
/// let points = robolab_planner::interpolate(&[vec![0.0, 1.0], vec![2.0, 0.0]], 1.0, 0.1).unwrap();
/// assert_eq!(points.len(), 12);
/// assert_eq!(points[0].position[0], 0.0);
/// assert_eq!(points[0].position[1], 1.0);
/// assert_eq!(points[1].position[0], 0.2);
/// assert_eq!(points[1].position[1], 0.9);
/// ```
pub fn interpolate<T>(
    points: &[Vec<T>],
    total_duration: T,
    unit_duration: T,
) -> Option<Vec<TrajectoryPoint<T>>>
where
    T: Float,
{
    if points.len() < 2 {
        return None;
    }
    let key_frame_unit_duration = total_duration / (T::from(points.len())? - T::one());
    let times = (0_usize..points.len())
        .map(|i| T::from(i).map(|i| i * key_frame_unit_duration))
        .collect::<Option<Vec<T>>>()?;

    let spline = CubicSpline::new(times, points.to_vec())?;
    let mut t = T::zero();
    let mut ret = Vec::with_capacity(points.len());
    while t < total_duration {
        ret.push(TrajectoryPoint {
            position: spline.position(t)?,
            velocity: spline.velocity(t)?,
            acceleration: spline.acceleration(t)?,
        });
        t = t + unit_duration;
    }
    // Add final point
    ret.push(TrajectoryPoint {
        position: spline.position(total_duration)?,
        velocity: spline.velocity(total_duration)?,
        acceleration: spline.acceleration(total_duration)?,
    });
    Some(ret)
}
