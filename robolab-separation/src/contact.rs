use std::f64::consts::PI;

use nalgebra as na;
use ncollide3d::query::{self, ClosestPoints};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::*,
    scene::{CollisionPair, Scene},
};

/// How the contacts of a configuration are found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ContactSource {
    /// Closest points of the pairs nearer than the margin
    #[default]
    Distance,
    /// Contact query with the margin as prediction
    Collision,
}

/// A contact between the two geometries of a pair
///
/// Both contact frames share the rotation whose z axis is the normal, from
/// `pair.a` toward `pair.b`. Their origins are the witness points on each
/// geometry. The placements are relative to the frame each geometry is
/// attached to: the body frame, or the world for static geometries.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactModel {
    pub name: String,
    pub pair: CollisionPair,
    pub placement1: na::Isometry3<f64>,
    pub placement2: na::Isometry3<f64>,
}

impl ContactModel {
    /// World poses of both contact frames at `config`
    pub fn world_frames(
        &self,
        scene: &Scene,
        config: &[na::Isometry3<f64>],
    ) -> Result<(na::Isometry3<f64>, na::Isometry3<f64>)> {
        Ok((
            scene.frame_pose(self.pair.a, config)? * self.placement1,
            scene.frame_pose(self.pair.b, config)? * self.placement2,
        ))
    }

    /// Position of the second witness point along the normal of the first frame
    ///
    /// Negative when the geometries penetrate.
    pub fn signed_distance(&self, scene: &Scene, config: &[na::Isometry3<f64>]) -> Result<f64> {
        let (o_m_c1, o_m_c2) = self.world_frames(scene, config)?;
        let p2 = na::Point3::from(o_m_c2.translation.vector);
        Ok(o_m_c1.inverse_transform_point(&p2).z)
    }
}

/// Rotation taking z onto `normal`
pub(crate) fn normal_rotation(normal: &na::Unit<na::Vector3<f64>>) -> na::UnitQuaternion<f64> {
    na::UnitQuaternion::rotation_between(&na::Vector3::z(), normal)
        .unwrap_or_else(|| na::UnitQuaternion::from_axis_angle(&na::Vector3::x_axis(), PI))
}

/// Witness points and normal of a pair, in the world frame
type Witness = (na::Point3<f64>, na::Point3<f64>, na::Unit<na::Vector3<f64>>);

fn penetration_witness(
    m1: &na::Isometry3<f64>,
    g1: &dyn ncollide3d::shape::Shape<f64>,
    m2: &na::Isometry3<f64>,
    g2: &dyn ncollide3d::shape::Shape<f64>,
    prediction: f64,
) -> Option<Witness> {
    query::contact(m1, g1, m2, g2, prediction).map(|c| (c.world1, c.world2, c.normal))
}

fn distance_witness(
    m1: &na::Isometry3<f64>,
    g1: &dyn ncollide3d::shape::Shape<f64>,
    m2: &na::Isometry3<f64>,
    g2: &dyn ncollide3d::shape::Shape<f64>,
    epsilon: f64,
) -> Option<Witness> {
    match query::closest_points(m1, g1, m2, g2, epsilon) {
        ClosestPoints::Intersecting => penetration_witness(m1, g1, m2, g2, 0.0),
        ClosestPoints::WithinMargin(p1, p2) => match na::Unit::try_new(p2 - p1, 1e-12) {
            Some(normal) => Some((p1, p2, normal)),
            // touching, the normal comes from the contact query
            None => penetration_witness(m1, g1, m2, g2, 0.0),
        },
        ClosestPoints::Disjoint => None,
    }
}

/// Contact models of every pair of `scene` closer than `epsilon` at `config`
pub fn compute_contact_models(
    scene: &Scene,
    config: &[na::Isometry3<f64>],
    source: ContactSource,
    epsilon: f64,
) -> Result<Vec<ContactModel>> {
    scene.check_configuration(config)?;
    let mut models = Vec::new();
    for pair in &scene.pairs {
        let m1 = scene.geometry_pose(pair.a, config)?;
        let m2 = scene.geometry_pose(pair.b, config)?;
        let g1 = scene.shape(pair.a)?;
        let g2 = scene.shape(pair.b)?;
        let witness = match source {
            ContactSource::Distance => distance_witness(&m1, g1, &m2, g2, epsilon),
            ContactSource::Collision => penetration_witness(&m1, g1, &m2, g2, epsilon),
        };
        let Some((p1, p2, normal)) = witness else {
            continue;
        };
        let rotation = normal_rotation(&normal);
        let o_m_c1 = na::Isometry3::from_parts(p1.coords.into(), rotation);
        let o_m_c2 = na::Isometry3::from_parts(p2.coords.into(), rotation);
        let name = scene.pair_name(pair)?;
        debug!("contact {name}: depth={}", (p2 - p1).dot(&normal));
        models.push(ContactModel {
            name,
            pair: *pair,
            placement1: scene.frame_pose(pair.a, config)?.inverse() * o_m_c1,
            placement2: scene.frame_pose(pair.b, config)?.inverse() * o_m_c2,
        });
    }
    Ok(models)
}
