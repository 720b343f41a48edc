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

//! # Configuration-space planning for a locked-down arm
//!
//! A UR5 arm reduced to two active joints moves in the vertical plane among
//! capsule obstacles. `ncollide3d` answers the collision and distance queries,
//! `k` computes the forward kinematics. On top of this collision oracle the
//! crate provides random sampling, random descent, constrained optimization
//! with `optimization_engine` and RRT path planning.

#![warn(rust_2018_idioms)]

mod errors;

pub mod collision;

mod arm;
mod descent;
mod funcs;
mod joint_lock;
mod optimization;
mod planner;
pub mod robot;
mod sampling;

pub use crate::{
    arm::*,
    collision::{CollisionDetector, FromUrdf, RobotCollisionDetector, RobotCollisionDetectorConfig},
    descent::*,
    errors::*,
    funcs::*,
    joint_lock::*,
    optimization::*,
    planner::*,
    sampling::*,
};
