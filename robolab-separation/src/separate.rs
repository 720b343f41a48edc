use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use nalgebra as na;
use robolab_viewer::{colors, Marker, MarkerShape, Pose, Viewer};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    contact::{compute_contact_models, ContactModel, ContactSource},
    errors::*,
    motion::{integrate, Twist},
    scene::{Configuration, GeometryRef, Scene},
};

/// Radius of the disks showing contact points
const PATCH_RADIUS: f64 = 0.05;

/// Hyper-parameters of [`separate`]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SeparationConfig {
    /// Gain between the signed distance and the push velocity
    #[serde(default = "default_push_factor")]
    pub push_factor: f64,
    /// Distance the pairs should keep
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default)]
    pub source: ContactSource,
    /// Show the configuration every this many iterations, never if zero
    #[serde(default = "default_display_every")]
    pub display_every: usize,
}

fn default_push_factor() -> f64 {
    0.1
}

fn default_epsilon() -> f64 {
    0.1
}

fn default_iterations() -> usize {
    100
}

fn default_display_every() -> usize {
    10
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            push_factor: default_push_factor(),
            epsilon: default_epsilon(),
            iterations: default_iterations(),
            source: ContactSource::default(),
            display_every: default_display_every(),
        }
    }
}

/// Signed distance of every pair that was active at least once, per iteration
///
/// Iterations where a pair was inactive hold zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistanceHistory {
    distances: BTreeMap<String, Vec<f64>>,
}

impl DistanceHistory {
    pub fn record(&mut self, name: &str, iteration: usize, iterations: usize, distance: f64) {
        let values = self
            .distances
            .entry(name.to_owned())
            .or_insert_with(|| vec![0.0; iterations]);
        if let Some(v) = values.get_mut(iteration) {
            *v = distance;
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.distances.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.distances.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.distances
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_json(&mut writer)?;
        writer.flush()?;
        debug!("saved distance history to {:?}", path.as_ref());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SeparationReport {
    pub config: Configuration,
    pub history: DistanceHistory,
    /// Contacts found at the last iteration
    pub last_contacts: usize,
}

fn twist_mut(twists: &mut [Twist], geometry: GeometryRef) -> Option<&mut Twist> {
    match geometry {
        GeometryRef::Body(i) => twists.get_mut(i),
        GeometryRef::Static(_) => None,
    }
}

/// Shows the contact points as thin disks, hiding the ones which disappeared
fn show_contacts<V>(
    scene: &Scene,
    config: &[na::Isometry3<f64>],
    models: &[ContactModel],
    shown: &mut BTreeSet<String>,
    viewer: &V,
) -> Result<()>
where
    V: Viewer<[Pose]> + ?Sized,
{
    let patch = MarkerShape::Cylinder {
        radius: PATCH_RADIUS,
        half_length: 0.002,
    };
    let mut active = BTreeSet::new();
    for model in models {
        let (o_m_c1, o_m_c2) = model.world_frames(scene, config)?;
        for (suffix, frame, color) in [("1", o_m_c1, colors::RED), ("2", o_m_c2, colors::BLUE)] {
            let name = format!("{}/{suffix}", model.name);
            viewer.place_marker(&Marker::new(name.clone(), patch.clone(), color, Pose::from(frame)));
            active.insert(name);
        }
    }
    for name in shown.difference(&active) {
        viewer.place_marker(&Marker::new(
            name.clone(),
            patch.clone(),
            colors::WHITE.with_alpha(0.0),
            Pose::from_translation(0.0, 0.0, 0.0),
        ));
    }
    *shown = active;
    Ok(())
}

/// Pushes apart the geometries of every pair closer than `config.epsilon`
///
/// Each contact moves both of its bodies along the normal, proportionally to
/// the signed distance minus epsilon. Static geometries never move and bodies
/// without contact keep their pose.
pub fn separate<V>(
    scene: &Scene,
    q0: Configuration,
    config: &SeparationConfig,
    viewer: &V,
) -> Result<SeparationReport>
where
    V: Viewer<[Pose]> + ?Sized,
{
    scene.check_configuration(&q0)?;
    for marker in scene.markers(&q0)? {
        viewer.place_marker(&marker);
    }
    let mut q = q0;
    let mut history = DistanceHistory::default();
    let mut shown = BTreeSet::new();
    let mut last_contacts = 0;

    for i in 0..config.iterations {
        let mut dq = vec![Twist::zero(); scene.bodies.len()];
        let models = compute_contact_models(scene, &q, config.source, config.epsilon)?;
        for model in &models {
            let dist = model.signed_distance(scene, &q)? - config.epsilon;
            let c_v = Twist::linear(na::Vector3::new(0.0, 0.0, dist)) * config.push_factor;
            if let Some(twist) = twist_mut(&mut dq, model.pair.a) {
                *twist += c_v.act(&model.placement1);
            }
            if let Some(twist) = twist_mut(&mut dq, model.pair.b) {
                *twist -= c_v.act(&model.placement2);
            }
            history.record(&model.name, i, config.iterations, dist);
        }
        for (pose, twist) in q.iter_mut().zip(&dq) {
            if !twist.is_zero() {
                *pose = integrate(pose, twist);
            }
        }
        last_contacts = models.len();
        debug!("iteration {i}: {} contacts", models.len());

        if config.display_every != 0 && i % config.display_every == 0 {
            show_contacts(scene, &q, &models, &mut shown, viewer)?;
            let poses: Vec<Pose> = q.iter().map(Pose::from).collect();
            viewer.display(&poses);
        }
    }
    info!(
        "separation done: {} pairs were active, {last_contacts} contacts remain",
        history.len()
    );
    Ok(SeparationReport {
        config: q,
        history,
        last_contacts,
    })
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use ncollide3d::shape::{Ball, ShapeHandle};
    use robolab_viewer::{NoopViewer, RecordingViewer};

    use super::*;
    use crate::scene::Bounds;

    fn balls(n: usize) -> Scene {
        let mut scene = Scene::new(Bounds::cube(1.0));
        for i in 0..n {
            scene.add_body(
                format!("ball_{i}"),
                ShapeHandle::new(Ball::new(0.5)),
                MarkerShape::Sphere { radius: 0.5 },
                colors::RED,
            );
        }
        scene.add_all_body_pairs();
        scene
    }

    #[test]
    fn first_step_is_symmetric() {
        let scene = balls(2);
        let q0 = vec![
            na::Isometry3::translation(0.0, 0.0, 0.0),
            na::Isometry3::translation(0.8, 0.0, 0.0),
        ];
        let config = SeparationConfig {
            iterations: 1,
            ..Default::default()
        };
        let report = separate(&scene, q0, &config, &NoopViewer).unwrap();
        // dist = -0.2 - 0.1, each ball moves by 0.1 * 0.3
        assert_approx_eq!(report.config[0].translation.vector.x, -0.03, 1e-6);
        assert_approx_eq!(report.config[1].translation.vector.x, 0.83, 1e-6);
        assert_approx_eq!(report.history.get("ball_0-ball_1").unwrap()[0], -0.3, 1e-6);
    }

    #[test]
    fn pushes_apart_to_epsilon() {
        let scene = balls(2);
        let q0 = vec![
            na::Isometry3::translation(0.0, 0.0, 0.0),
            na::Isometry3::translation(0.8, 0.0, 0.0),
        ];
        let viewer = RecordingViewer::new();
        let report = separate(&scene, q0, &SeparationConfig::default(), &viewer).unwrap();
        let gap = report.config[1].translation.vector.x - report.config[0].translation.vector.x - 1.0;
        // the gap converges geometrically to epsilon
        assert!(gap > 0.09, "{gap}");
        let history = report.history.get("ball_0-ball_1").unwrap();
        assert_eq!(history.len(), 100);
        assert!(history[0] < history[99]);
        assert_eq!(viewer.num_frames(), 10);
        // 2 balls and 2 patches
        assert_eq!(viewer.markers().len(), 4);
    }

    #[test]
    fn far_bodies_do_not_move() {
        let scene = balls(3);
        let q0 = vec![
            na::Isometry3::translation(0.0, 0.0, 0.0),
            na::Isometry3::translation(0.9, 0.0, 0.0),
            na::Isometry3::new(na::Vector3::new(0.0, 5.0, 0.0), na::Vector3::new(0.3, 0.2, 0.1)),
        ];
        let report = separate(&scene, q0.clone(), &SeparationConfig::default(), &NoopViewer).unwrap();
        assert_eq!(report.config[2], q0[2]);
        assert_eq!(report.history.names().collect::<Vec<_>>(), vec!["ball_0-ball_1"]);
    }

    #[test]
    fn history_json() {
        let mut history = DistanceHistory::default();
        history.record("a-b", 1, 3, -0.5);
        let mut json = Vec::new();
        history.write_json(&mut json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["a-b"], serde_json::json!([0.0, -0.5, 0.0]));
    }

    #[test]
    fn wrong_configuration_size() {
        let scene = balls(2);
        assert!(matches!(
            separate(&scene, vec![], &SeparationConfig::default(), &NoopViewer),
            Err(Error::ConfigurationMismatch(0, 2))
        ));
    }
}
