use std::ops::{AddAssign, Mul, SubAssign};

use nalgebra as na;

/// Spatial velocity of a rigid body, expressed in its local frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twist {
    pub linear: na::Vector3<f64>,
    pub angular: na::Vector3<f64>,
}

impl Twist {
    pub fn new(linear: na::Vector3<f64>, angular: na::Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    pub fn zero() -> Self {
        Self::new(na::Vector3::zeros(), na::Vector3::zeros())
    }

    pub fn linear(linear: na::Vector3<f64>) -> Self {
        Self::new(linear, na::Vector3::zeros())
    }

    pub fn is_zero(&self) -> bool {
        self.linear == na::Vector3::zeros() && self.angular == na::Vector3::zeros()
    }

    /// Expresses the twist in the parent frame of `frame`.
    ///
    /// `frame` maps coordinates from the frame where `self` is expressed to
    /// the target frame.
    pub fn act(&self, frame: &na::Isometry3<f64>) -> Self {
        let rotation = frame.rotation;
        let angular = rotation * self.angular;
        let linear = rotation * self.linear + frame.translation.vector.cross(&angular);
        Self { linear, angular }
    }
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl AddAssign for Twist {
    fn add_assign(&mut self, other: Self) {
        self.linear += other.linear;
        self.angular += other.angular;
    }
}

impl SubAssign for Twist {
    fn sub_assign(&mut self, other: Self) {
        self.linear -= other.linear;
        self.angular -= other.angular;
    }
}

impl Mul<f64> for Twist {
    type Output = Self;

    fn mul(self, scale: f64) -> Self {
        Self::new(self.linear * scale, self.angular * scale)
    }
}

/// Exponential map from a twist to a rigid displacement
pub fn exp6(twist: &Twist) -> na::Isometry3<f64> {
    let w = twist.angular;
    let theta = w.norm();
    let rotation = na::UnitQuaternion::from_scaled_axis(w);
    let skew = w.cross_matrix();
    let left_jacobian = if theta < 1e-8 {
        na::Matrix3::identity() + skew * 0.5
    } else {
        let theta2 = theta * theta;
        na::Matrix3::identity()
            + skew * ((1.0 - theta.cos()) / theta2)
            + skew * skew * ((theta - theta.sin()) / (theta2 * theta))
    };
    na::Isometry3::from_parts(na::Translation3::from(left_jacobian * twist.linear), rotation)
}

/// Moves `pose` by `twist` during a unit time, the twist being expressed in
/// the local frame of `pose`
pub fn integrate(pose: &na::Isometry3<f64>, twist: &Twist) -> na::Isometry3<f64> {
    pose * exp6(twist)
}
