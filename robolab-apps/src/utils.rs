use std::path::{Path, PathBuf};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::Error;

const ROBOLAB_APPS_CONFIG_ENV_NAME: &str = "ROBOLAB_APPS_CONFIG_PATH";

/// Get config path from input or env ROBOLAB_APPS_CONFIG_PATH
pub fn get_apps_config(config: Option<PathBuf>) -> Option<PathBuf> {
    if config.is_some() {
        config
    } else {
        std::env::var(ROBOLAB_APPS_CONFIG_ENV_NAME)
            .map(|s| {
                warn!("### ENV VAR {s} is used ###");
                PathBuf::from(s)
            })
            .ok()
    }
}

/// Logs to stderr, filtered by `RUST_LOG` (`info` if unset)
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

/// Seeded rng if a seed is given, random otherwise
pub fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            info!("seed: {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}

/// Resolves `path` relative to the directory of `config_path`
pub(crate) fn resolve_path(path: &Path, config_path: &Path) -> Result<PathBuf, Error> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }
    let parent = config_path
        .parent()
        .ok_or_else(|| Error::NoParentDirectory(config_path.to_owned()))?;
    Ok(parent.join(path))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_apps_config() {
        let path = get_apps_config(Some(PathBuf::from("a.toml")));
        assert_eq!(path, Some(PathBuf::from("a.toml")));

        std::env::set_var(ROBOLAB_APPS_CONFIG_ENV_NAME, "b.toml");
        let path = get_apps_config(Some(PathBuf::from("a.toml")));
        assert_eq!(path, Some(PathBuf::from("a.toml")));
        let path = get_apps_config(None);
        assert_eq!(path, Some(PathBuf::from("b.toml")));
        std::env::remove_var(ROBOLAB_APPS_CONFIG_ENV_NAME);

        let path = get_apps_config(None);
        assert!(path.is_none());
    }

    #[test]
    fn test_resolve_path() {
        let config = Path::new("config/path_planning.toml");
        assert_eq!(
            resolve_path(Path::new("../robot.urdf"), config).unwrap(),
            PathBuf::from("config/../robot.urdf")
        );
        assert_eq!(
            resolve_path(Path::new("/tmp/robot.urdf"), config).unwrap(),
            PathBuf::from("/tmp/robot.urdf")
        );
    }

    #[test]
    fn test_create_rng() {
        use rand::Rng;
        let a: u64 = create_rng(Some(3)).gen();
        let b: u64 = create_rng(Some(3)).gen();
        assert_eq!(a, b);
    }
}
