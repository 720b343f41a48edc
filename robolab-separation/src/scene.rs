use std::{f64::consts::PI, fmt};

use nalgebra as na;
use ncollide3d::shape::{Ball, Capsule, Cuboid, Shape, ShapeHandle};
use rand::{rngs::StdRng, Rng, SeedableRng};
use robolab_viewer::{colors, Marker, MarkerShape, Pose, Rgba};
use tracing::debug;

use crate::errors::*;

/// Thickness of the walls of [`build_scene_pills_box`]
pub const WALL_THICKNESS: f64 = 0.1;

/// A free-flying rigid body
#[derive(Clone)]
pub struct Body {
    pub name: String,
    pub shape: ShapeHandle<f64>,
    pub marker_shape: MarkerShape,
    pub color: Rgba,
    /// Placement of the geometry in the body frame
    pub placement: na::Isometry3<f64>,
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("name", &self.name)
            .field("marker_shape", &self.marker_shape)
            .field("placement", &self.placement)
            .finish()
    }
}

/// A geometry fixed to the world
#[derive(Clone)]
pub struct StaticGeometry {
    pub name: String,
    pub shape: ShapeHandle<f64>,
    pub marker_shape: MarkerShape,
    pub color: Rgba,
    pub pose: na::Isometry3<f64>,
}

impl fmt::Debug for StaticGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticGeometry")
            .field("name", &self.name)
            .field("marker_shape", &self.marker_shape)
            .field("pose", &self.pose)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryRef {
    Body(usize),
    Static(usize),
}

/// Two geometries whose distance is watched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair {
    pub a: GeometryRef,
    pub b: GeometryRef,
}

/// Box where random translations are drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: na::Vector3<f64>,
    pub upper: na::Vector3<f64>,
}

impl Bounds {
    pub fn cube(half_size: f64) -> Self {
        Self {
            lower: na::Vector3::repeat(-half_size),
            upper: na::Vector3::repeat(half_size),
        }
    }

    pub fn contains(&self, p: &na::Vector3<f64>) -> bool {
        (0..3).all(|i| self.lower[i] <= p[i] && p[i] <= self.upper[i])
    }
}

/// One pose per body
pub type Configuration = Vec<na::Isometry3<f64>>;

#[derive(Debug, Clone)]
pub struct Scene {
    pub bodies: Vec<Body>,
    pub statics: Vec<StaticGeometry>,
    pub pairs: Vec<CollisionPair>,
    pub bounds: Bounds,
}

impl Scene {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bodies: Vec::new(),
            statics: Vec::new(),
            pairs: Vec::new(),
            bounds,
        }
    }

    pub fn add_body(
        &mut self,
        name: impl Into<String>,
        shape: ShapeHandle<f64>,
        marker_shape: MarkerShape,
        color: Rgba,
    ) -> GeometryRef {
        self.bodies.push(Body {
            name: name.into(),
            shape,
            marker_shape,
            color,
            placement: na::Isometry3::identity(),
        });
        GeometryRef::Body(self.bodies.len() - 1)
    }

    pub fn add_static(
        &mut self,
        name: impl Into<String>,
        shape: ShapeHandle<f64>,
        marker_shape: MarkerShape,
        color: Rgba,
        pose: na::Isometry3<f64>,
    ) -> GeometryRef {
        self.statics.push(StaticGeometry {
            name: name.into(),
            shape,
            marker_shape,
            color,
            pose,
        });
        GeometryRef::Static(self.statics.len() - 1)
    }

    pub fn add_pair(&mut self, a: GeometryRef, b: GeometryRef) -> Result<()> {
        self.name(a)?;
        self.name(b)?;
        let pair = CollisionPair { a, b };
        if a == b || matches!((a, b), (GeometryRef::Static(_), GeometryRef::Static(_))) {
            return Err(Error::InvalidPair(format!("{a:?}-{b:?}")));
        }
        self.pairs.push(pair);
        Ok(())
    }

    /// Watches every pair of bodies
    pub fn add_all_body_pairs(&mut self) {
        let n = self.bodies.len();
        for i in 0..n {
            for j in i + 1..n {
                self.pairs.push(CollisionPair {
                    a: GeometryRef::Body(i),
                    b: GeometryRef::Body(j),
                });
            }
        }
    }

    pub fn name(&self, geometry: GeometryRef) -> Result<&str> {
        match geometry {
            GeometryRef::Body(i) => self.bodies.get(i).map(|b| b.name.as_str()),
            GeometryRef::Static(i) => self.statics.get(i).map(|s| s.name.as_str()),
        }
        .ok_or_else(|| Error::MissingGeometry(format!("{geometry:?}")))
    }

    /// `"{a}-{b}"`
    pub fn pair_name(&self, pair: &CollisionPair) -> Result<String> {
        Ok(format!("{}-{}", self.name(pair.a)?, self.name(pair.b)?))
    }

    pub fn shape(&self, geometry: GeometryRef) -> Result<&dyn Shape<f64>> {
        match geometry {
            GeometryRef::Body(i) => self.bodies.get(i).map(|b| &*b.shape),
            GeometryRef::Static(i) => self.statics.get(i).map(|s| &*s.shape),
        }
        .ok_or_else(|| Error::MissingGeometry(format!("{geometry:?}")))
    }

    /// World pose of the frame the geometry is attached to
    ///
    /// Identity for statics.
    pub fn frame_pose(
        &self,
        geometry: GeometryRef,
        config: &[na::Isometry3<f64>],
    ) -> Result<na::Isometry3<f64>> {
        match geometry {
            GeometryRef::Body(i) => config
                .get(i)
                .copied()
                .ok_or_else(|| Error::MissingGeometry(format!("{geometry:?}"))),
            GeometryRef::Static(_) => Ok(na::Isometry3::identity()),
        }
    }

    /// World pose of the geometry itself
    pub fn geometry_pose(
        &self,
        geometry: GeometryRef,
        config: &[na::Isometry3<f64>],
    ) -> Result<na::Isometry3<f64>> {
        match geometry {
            GeometryRef::Body(i) => {
                let body = self
                    .bodies
                    .get(i)
                    .ok_or_else(|| Error::MissingGeometry(format!("{geometry:?}")))?;
                Ok(self.frame_pose(geometry, config)? * body.placement)
            }
            GeometryRef::Static(i) => self
                .statics
                .get(i)
                .map(|s| s.pose)
                .ok_or_else(|| Error::MissingGeometry(format!("{geometry:?}"))),
        }
    }

    pub fn check_configuration(&self, config: &[na::Isometry3<f64>]) -> Result<()> {
        if config.len() != self.bodies.len() {
            return Err(Error::ConfigurationMismatch(config.len(), self.bodies.len()));
        }
        Ok(())
    }

    /// Markers of every geometry at `config`, statics first
    pub fn markers(&self, config: &[na::Isometry3<f64>]) -> Result<Vec<Marker>> {
        self.check_configuration(config)?;
        let statics = self.statics.iter().map(|s| {
            Marker::new(s.name.clone(), s.marker_shape.clone(), s.color, Pose::from(&s.pose))
        });
        let bodies = self.bodies.iter().zip(config).map(|(b, pose)| {
            Marker::new(
                b.name.clone(),
                b.marker_shape.clone(),
                b.color,
                Pose::from(pose * b.placement),
            )
        });
        Ok(statics.chain(bodies).collect())
    }
}

/// Uniformly random rotation (Shoemake)
pub fn random_rotation<R>(rng: &mut R) -> na::UnitQuaternion<f64>
where
    R: Rng + ?Sized,
{
    let u1: f64 = rng.gen();
    let u2: f64 = rng.gen::<f64>() * 2.0 * PI;
    let u3: f64 = rng.gen::<f64>() * 2.0 * PI;
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    na::UnitQuaternion::new_normalize(na::Quaternion::new(
        b * u3.cos(),
        a * u2.sin(),
        a * u2.cos(),
        b * u3.sin(),
    ))
}

/// Draws translations within the scene bounds and uniform rotations
pub fn random_configuration<R>(scene: &Scene, rng: &mut R) -> Configuration
where
    R: Rng + ?Sized,
{
    let bounds = &scene.bounds;
    scene
        .bodies
        .iter()
        .map(|_| {
            let translation = na::Vector3::from_fn(|i, _| {
                if bounds.upper[i] > bounds.lower[i] {
                    rng.gen_range(bounds.lower[i]..bounds.upper[i])
                } else {
                    bounds.lower[i]
                }
            });
            na::Isometry3::from_parts(translation.into(), random_rotation(rng))
        })
        .collect()
}

/// A sphere, a box and a capsule, all watched against each other
pub fn build_scene_three_bodies(size: f64) -> Result<Scene> {
    if size <= 0.0 {
        return Err(Error::InvalidParameter(format!("size={size}")));
    }
    let mut scene = Scene::new(Bounds::cube(1.0));
    let radius = size / 2.0;
    scene.add_body(
        "sphere",
        ShapeHandle::new(Ball::new(radius)),
        MarkerShape::Sphere { radius },
        colors::RED,
    );
    let half_extents = [size / 2.0, size / 3.0, size / 4.0];
    scene.add_body(
        "box",
        ShapeHandle::new(Cuboid::new(na::Vector3::from(half_extents))),
        MarkerShape::Box { half_extents },
        colors::GREEN,
    );
    let (radius, half_length) = (size / 4.0, size / 2.0);
    scene.add_body(
        "capsule",
        ShapeHandle::new(Capsule::new(half_length, radius)),
        MarkerShape::Capsule {
            radius,
            half_length,
        },
        colors::BLUE,
    );
    scene.add_all_body_pairs();
    Ok(scene)
}

/// `nobj` capsules of random sizes in a closed box of side `wall_size`
///
/// Pills are watched against each other and against every wall. Capsules
/// are aligned with y, as ncollide3d builds them.
pub fn build_scene_pills_box(nobj: usize, wall_size: f64, seed: u64) -> Result<Scene> {
    if wall_size <= 4.0 * WALL_THICKNESS {
        return Err(Error::InvalidParameter(format!("wall_size={wall_size}")));
    }
    let half = wall_size / 2.0;
    let mut scene = Scene::new(Bounds::cube(half - 2.0 * WALL_THICKNESS));
    let mut rng = StdRng::seed_from_u64(seed);

    let walls = (0..3).flat_map(|axis| [-1.0, 1.0].map(|side| (axis, side)));
    let mut wall_refs = Vec::with_capacity(6);
    for (axis, side) in walls {
        let mut half_extents = [half; 3];
        half_extents[axis] = WALL_THICKNESS / 2.0;
        let mut center = na::Vector3::zeros();
        center[axis] = side * (half + WALL_THICKNESS / 2.0);
        let name = format!("wall_{}{}", if side < 0.0 { "-" } else { "+" }, ["x", "y", "z"][axis]);
        wall_refs.push(scene.add_static(
            name,
            ShapeHandle::new(Cuboid::new(na::Vector3::from(half_extents))),
            MarkerShape::Box { half_extents },
            colors::GREY.with_alpha(0.3),
            na::Isometry3::translation(center.x, center.y, center.z),
        ));
    }

    for i in 0..nobj {
        let radius = rng.gen_range(0.1..0.25);
        let half_length = rng.gen_range(0.1..0.4);
        let color = Rgba::new(rng.gen(), rng.gen(), rng.gen(), 1.0);
        scene.add_body(
            format!("pill_{i}"),
            ShapeHandle::new(Capsule::new(half_length, radius)),
            MarkerShape::Capsule {
                radius,
                half_length,
            },
            color,
        );
    }
    scene.add_all_body_pairs();
    for i in 0..nobj {
        for wall in &wall_refs {
            scene.pairs.push(CollisionPair {
                a: GeometryRef::Body(i),
                b: *wall,
            });
        }
    }
    debug!(
        "pills box: {} bodies, {} walls, {} pairs",
        scene.bodies.len(),
        scene.statics.len(),
        scene.pairs.len()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn three_bodies() {
        let scene = build_scene_three_bodies(0.5).unwrap();
        assert_eq!(scene.bodies.len(), 3);
        assert!(scene.statics.is_empty());
        let names: Vec<_> = scene
            .pairs
            .iter()
            .map(|p| scene.pair_name(p).unwrap())
            .collect();
        assert_eq!(names, vec!["sphere-box", "sphere-capsule", "box-capsule"]);
        assert!(build_scene_three_bodies(0.0).is_err());
    }

    #[test]
    fn pills_box() {
        let scene = build_scene_pills_box(5, 4.0, 0).unwrap();
        assert_eq!(scene.bodies.len(), 5);
        assert_eq!(scene.statics.len(), 6);
        // 10 pill-pill pairs and 6 walls per pill
        assert_eq!(scene.pairs.len(), 10 + 30);
        assert!(scene.pairs.iter().all(|p| matches!(p.a, GeometryRef::Body(_))));
        for wall in &scene.statics {
            let c = wall.pose.translation.vector;
            assert_approx_eq!(c.amax(), 2.05);
        }
        // same seed, same pills
        let again = build_scene_pills_box(5, 4.0, 0).unwrap();
        for (a, b) in scene.bodies.iter().zip(&again.bodies) {
            assert_eq!(a.marker_shape, b.marker_shape);
        }
    }

    #[test]
    fn random_configuration_in_bounds() {
        let scene = build_scene_pills_box(30, 4.0, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let config = random_configuration(&scene, &mut rng);
        assert_eq!(config.len(), 30);
        for pose in &config {
            assert!(scene.bounds.contains(&pose.translation.vector));
            assert_approx_eq!(pose.rotation.quaternion().norm(), 1.0);
        }
    }

    #[test]
    fn pairs_are_validated() {
        let mut scene = build_scene_three_bodies(0.5).unwrap();
        assert!(scene
            .add_pair(GeometryRef::Body(0), GeometryRef::Body(0))
            .is_err());
        assert!(scene
            .add_pair(GeometryRef::Body(0), GeometryRef::Body(7))
            .is_err());
        assert!(scene
            .add_pair(GeometryRef::Body(2), GeometryRef::Body(0))
            .is_ok());
    }

    #[test]
    fn markers_follow_configuration() {
        let scene = build_scene_three_bodies(0.5).unwrap();
        let config = vec![na::Isometry3::translation(0.1, 0.2, 0.3); 3];
        let markers = scene.markers(&config).unwrap();
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].name, "sphere");
        assert_approx_eq!(markers[0].pose.translation[2], 0.3);
        assert!(scene.markers(&config[..2]).is_err());
    }
}
