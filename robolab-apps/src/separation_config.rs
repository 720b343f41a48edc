use std::path::{Path, PathBuf};

use robolab_separation::{build_scene_pills_box, build_scene_three_bodies, Scene, SeparationConfig};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{utils::resolve_path, Error};

/// Scenes `robolab-separate-objects` can build
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SceneKind {
    /// A sphere, a box and a capsule
    ThreeBodies,
    /// Pills in a closed box
    #[default]
    PillsBox,
}

/// Settings of `robolab-separate-objects`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SeparationAppConfig {
    #[serde(default)]
    pub scene: SceneKind,
    /// Number of pills of the `pills-box` scene
    #[serde(default = "default_nobj")]
    pub nobj: usize,
    /// Side of the `pills-box` scene
    #[serde(default = "default_wall_size")]
    pub wall_size: f64,
    /// Size of the `three-bodies` scene
    #[serde(default = "default_body_size")]
    pub body_size: f64,
    /// Seed of the pill sizes and colors
    #[serde(default)]
    pub scene_seed: u64,
    /// Where the signed distances are written as JSON
    #[serde(default)]
    pub history_output: Option<PathBuf>,
    /// Where the displayed frames are written as JSON
    #[serde(default)]
    pub recording_output: Option<PathBuf>,
    #[serde(default)]
    pub animate: bool,
    #[serde(default)]
    pub separation: SeparationConfig,
}

fn default_nobj() -> usize {
    30
}

fn default_wall_size() -> f64 {
    4.0
}

fn default_body_size() -> f64 {
    0.5
}

impl Default for SeparationAppConfig {
    fn default() -> Self {
        Self {
            scene: SceneKind::default(),
            nobj: default_nobj(),
            wall_size: default_wall_size(),
            body_size: default_body_size(),
            scene_seed: 0,
            history_output: None,
            recording_output: None,
            animate: false,
            separation: SeparationConfig::default(),
        }
    }
}

impl SeparationAppConfig {
    pub fn try_new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_str(
            &std::fs::read_to_string(&path)
                .map_err(|e| Error::NoFile(path.as_ref().to_owned(), e))?,
            &path,
        )
    }

    /// Parses `s`, resolving the output paths relative to the directory of `path`
    pub fn from_str<P: AsRef<Path>>(s: &str, path: P) -> Result<Self, Error> {
        let mut config: SeparationAppConfig =
            toml::from_str(s).map_err(|e| Error::TomlParseFailure(path.as_ref().to_owned(), e))?;
        if let Some(p) = &config.history_output {
            config.history_output = Some(resolve_path(p, path.as_ref())?);
        }
        if let Some(p) = &config.recording_output {
            config.recording_output = Some(resolve_path(p, path.as_ref())?);
        }
        debug!("{config:?}");
        Ok(config)
    }

    pub fn build_scene(&self) -> Result<Scene, Error> {
        Ok(match self.scene {
            SceneKind::ThreeBodies => build_scene_three_bodies(self.body_size)?,
            SceneKind::PillsBox => build_scene_pills_box(self.nobj, self.wall_size, self.scene_seed)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use robolab_separation::ContactSource;

    use super::*;

    #[test]
    fn default_scene() {
        let config = SeparationAppConfig::from_str("", "a.toml").unwrap();
        assert_eq!(config.scene, SceneKind::PillsBox);
        let scene = config.build_scene().unwrap();
        assert_eq!(scene.bodies.len(), 30);
        assert_eq!(scene.statics.len(), 6);
    }

    #[test]
    fn three_bodies_from_toml() {
        let s = r#"
scene = "three-bodies"
history_output = "out/history.json"

[separation]
source = "collision"
iterations = 20
"#;
        let config = SeparationAppConfig::from_str(s, "config/sep.toml").unwrap();
        assert_eq!(config.separation.source, ContactSource::Collision);
        assert_eq!(config.separation.iterations, 20);
        assert_eq!(
            config.history_output,
            Some(PathBuf::from("config/out/history.json"))
        );
        assert_eq!(config.build_scene().unwrap().bodies.len(), 3);
    }

    #[test]
    fn invalid_wall_size() {
        let config = SeparationAppConfig {
            wall_size: 0.2,
            ..Default::default()
        };
        assert!(matches!(config.build_scene(), Err(Error::Separation(..))));
    }
}
