use std::f64::consts::FRAC_PI_2;

use k::{nalgebra as na, RealField, Vector3};
use ncollide3d::{
    procedural::IndexBuffer::{Split, Unified},
    shape::{Ball, Capsule, Cuboid, Cylinder, ShapeHandle, TriMesh},
    transformation::ToTriMesh,
};
use tracing::*;

/// A shape with the correction to apply after the URDF `<origin>`.
pub(crate) type ShapeWithOffset<T> = (ShapeHandle<T>, na::Isometry3<T>);

/// Converts a URDF geometry into a ncollide3d shape.
///
/// ncollide3d capsules are aligned with y while URDF ones are aligned with z,
/// so capsules come with a rotation around x.
pub(crate) fn urdf_geometry_to_shape_handle<T>(
    collision_geometry: &urdf_rs::Geometry,
) -> Option<ShapeWithOffset<T>>
where
    T: RealField + Copy,
{
    match *collision_geometry {
        urdf_rs::Geometry::Box { ref size } => {
            let cube = Cuboid::new(Vector3::new(
                na::convert(size[0] * 0.5),
                na::convert(size[1] * 0.5),
                na::convert(size[2] * 0.5),
            ));
            Some((ShapeHandle::new(cube), na::Isometry3::identity()))
        }
        urdf_rs::Geometry::Cylinder { radius, length } => {
            let y_cylinder = Cylinder::new(na::convert(length * 0.5), na::convert(radius));
            let tri_mesh = ncollide3d::transformation::convex_hull(
                &y_cylinder
                    .to_trimesh(30)
                    .coords
                    .iter()
                    .map(|point| point.xzy())
                    .collect::<Vec<_>>(),
            );
            let ind = match tri_mesh.indices {
                Unified(ind) => ind
                    .into_iter()
                    .map(|p| na::Point3::new(p[0] as usize, p[1] as usize, p[2] as usize))
                    .collect(),
                Split(_) => {
                    error!("unexpected split index buffer from convex_hull");
                    return None;
                }
            };
            Some((
                ShapeHandle::new(TriMesh::new(tri_mesh.coords, ind, tri_mesh.uvs)),
                na::Isometry3::identity(),
            ))
        }
        urdf_rs::Geometry::Capsule { radius, length } => {
            let y_capsule = Capsule::new(na::convert(length * 0.5), na::convert(radius));
            Some((ShapeHandle::new(y_capsule), z_from_y()))
        }
        urdf_rs::Geometry::Sphere { radius } => Some((
            ShapeHandle::new(Ball::new(na::convert(radius))),
            na::Isometry3::identity(),
        )),
        urdf_rs::Geometry::Mesh { ref filename, .. } => {
            warn!("mesh collision geometry is not supported, {filename} is ignored");
            None
        }
    }
}

/// Rotation taking the y axis onto the z axis.
fn z_from_y<T>() -> na::Isometry3<T>
where
    T: RealField + Copy,
{
    na::Isometry3::rotation(Vector3::x() * na::convert::<f64, T>(FRAC_PI_2))
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use ncollide3d::query;

    use super::*;

    #[test]
    fn capsule_is_z_aligned() {
        let geometry = urdf_rs::Geometry::Capsule {
            radius: 0.1,
            length: 1.0,
        };
        let (shape, offset) = urdf_geometry_to_shape_handle::<f64>(&geometry).unwrap();
        let ball = Ball::new(0.1);
        // tip of the capsule is at z = 0.6
        let dist = query::distance(
            &offset,
            &*shape,
            &na::Isometry3::translation(0.0, 0.0, 1.0),
            &ball,
        );
        assert_approx_eq!(dist, 0.3, 1e-4);
        let side = query::distance(
            &offset,
            &*shape,
            &na::Isometry3::translation(1.0, 0.0, 0.0),
            &ball,
        );
        assert_approx_eq!(side, 0.8, 1e-4);
    }

    #[test]
    fn box_half_extents() {
        let geometry = urdf_rs::Geometry::Box {
            size: urdf_rs::Vec3([2.0, 2.0, 2.0]),
        };
        let (shape, _) = urdf_geometry_to_shape_handle::<f64>(&geometry).unwrap();
        let dist = query::distance(
            &na::Isometry3::identity(),
            &*shape,
            &na::Isometry3::translation(3.0, 0.0, 0.0),
            &Ball::new(0.5),
        );
        assert_approx_eq!(dist, 1.5, 1e-4);
    }

    #[test]
    fn mesh_is_skipped() {
        let geometry = urdf_rs::Geometry::Mesh {
            filename: "arm.stl".to_owned(),
            scale: None,
        };
        assert!(urdf_geometry_to_shape_handle::<f64>(&geometry).is_none());
    }
}
