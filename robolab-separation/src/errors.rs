use std::io;

use thiserror::Error;

/// Error for `robolab_separation`
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("robolab-separation: {} refers to a missing geometry", .0)]
    MissingGeometry(String),
    #[error("robolab-separation: a pair needs two different geometries, got {}", .0)]
    InvalidPair(String),
    #[error("robolab-separation: configuration has {} poses but the scene has {} bodies", .0, .1)]
    ConfigurationMismatch(usize, usize),
    #[error("robolab-separation: invalid parameter {}", .0)]
    InvalidParameter(String),
    #[error("robolab-separation: IO error {:?}", source)]
    Io {
        #[from]
        source: io::Error,
    },
    #[error("robolab-separation: JSON error {}", .0)]
    Json(#[from] serde_json::Error),
}

/// Result for `robolab_separation`
pub type Result<T, E = Error> = std::result::Result<T, E>;
