mod collision_detector;
mod robot_collision_detector;
mod urdf;

pub use self::{collision_detector::*, robot_collision_detector::*};
