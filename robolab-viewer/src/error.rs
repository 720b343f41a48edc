use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("robolab-viewer: IO error {:?}", source)]
    Io {
        #[from]
        source: io::Error,
    },
    #[error("robolab-viewer: failed to serialize frames ({})", .0)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
