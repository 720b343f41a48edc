use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("robolab-apps: No command is specified.")]
    NoCommand,
    #[error("robolab-apps: Failed to parse {:?} as toml ({}).", .0, .1)]
    TomlParseFailure(PathBuf, #[source] toml::de::Error),
    #[error("robolab-apps: No File {:?} is found ({}).", .0, .1)]
    NoFile(PathBuf, #[source] std::io::Error),
    #[error("robolab-apps: No ParentDirectory {:?} is found.", .0)]
    NoParentDirectory(PathBuf),
    #[error("robolab-apps: robolab-planner: {}", .0)]
    Planner(#[from] robolab_planner::Error),
    #[error("robolab-apps: robolab-separation: {}", .0)]
    Separation(#[from] robolab_separation::Error),
    #[error("robolab-apps: robolab-viewer: {}", .0)]
    Viewer(#[from] robolab_viewer::Error),
    #[error("robolab-apps: IO error {:?}", .0)]
    Io(#[from] std::io::Error),
    #[error("robolab-apps: JSON error {}", .0)]
    Json(#[from] serde_json::Error),
}
