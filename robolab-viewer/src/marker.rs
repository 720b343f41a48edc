use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::colors::Rgba;

/// Geometry of a decorative object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MarkerShape {
    Sphere { radius: f64 },
    Box { half_extents: [f64; 3] },
    Capsule { radius: f64, half_length: f64 },
    /// Thin disk, used to show contact patches.
    Cylinder { radius: f64, half_length: f64 },
}

/// Pose stored as plain arrays so it can be written out as JSON.
///
/// `rotation` is a quaternion in `[i, j, k, w]` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub translation: [f64; 3],
    pub rotation: [f64; 4],
}

impl Pose {
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            translation: [x, y, z],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn to_isometry(&self) -> na::Isometry3<f64> {
        let [x, y, z] = self.translation;
        let [i, j, k, w] = self.rotation;
        na::Isometry3::from_parts(
            na::Translation3::new(x, y, z),
            na::UnitQuaternion::from_quaternion(na::Quaternion::new(w, i, j, k)),
        )
    }
}

impl From<&na::Isometry3<f64>> for Pose {
    fn from(iso: &na::Isometry3<f64>) -> Self {
        let t = iso.translation.vector;
        let q = iso.rotation.coords;
        Self {
            translation: [t.x, t.y, t.z],
            rotation: [q.x, q.y, q.z, q.w],
        }
    }
}

impl From<na::Isometry3<f64>> for Pose {
    fn from(iso: na::Isometry3<f64>) -> Self {
        Self::from(&iso)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub shape: MarkerShape,
    pub color: Rgba,
    pub pose: Pose,
}

impl Marker {
    pub fn new(name: impl Into<String>, shape: MarkerShape, color: Rgba, pose: Pose) -> Self {
        Self {
            name: name.into(),
            shape,
            color,
            pose,
        }
    }
}
