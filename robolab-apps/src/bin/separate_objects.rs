use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use robolab_apps::{
    utils::{create_rng, get_apps_config, init_tracing},
    AppViewer, SceneKind, SeparationAppConfig,
};
use robolab_separation::{random_configuration, separate};
use robolab_viewer::Pose;
use tracing::info;

/// Pushes apart overlapping rigid bodies until every pair keeps a margin.
#[derive(Parser, Debug)]
#[command(name = env!("CARGO_BIN_NAME"))]
struct SeparateObjectsArgs {
    /// Path to the setting file.
    #[arg(short, long)]
    config_path: Option<PathBuf>,
    /// Scene to build, overrides the setting file.
    #[arg(long, value_enum)]
    scene: Option<SceneKind>,
    /// Number of pills, overrides the setting file.
    #[arg(long)]
    nobj: Option<usize>,
    /// Writes the signed distance of every pair to this JSON file.
    #[arg(long)]
    history_output: Option<PathBuf>,
    /// Writes every displayed frame to this JSON file.
    #[arg(long)]
    recording_output: Option<PathBuf>,
    /// Seed of the initial configuration, random if not set.
    #[arg(long)]
    seed: Option<u64>,
    /// Prints the default setting as TOML.
    #[arg(long)]
    show_default_config: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = SeparateObjectsArgs::parse();
    info!("ParsedArgs {args:?}");

    if args.show_default_config {
        print!("{}", toml::to_string(&SeparationAppConfig::default())?);
        return Ok(());
    }

    let mut config = match get_apps_config(args.config_path) {
        Some(path) => SeparationAppConfig::try_new(path)?,
        None => SeparationAppConfig::default(),
    };
    if let Some(scene) = args.scene {
        config.scene = scene;
    }
    if let Some(nobj) = args.nobj {
        config.nobj = nobj;
    }
    if args.history_output.is_some() {
        config.history_output = args.history_output;
    }
    if args.recording_output.is_some() {
        config.recording_output = args.recording_output;
    }

    let scene = config.build_scene()?;
    let mut rng = create_rng(args.seed);
    let q0 = random_configuration(&scene, &mut rng);
    let viewer = AppViewer::<Pose>::new(env!("CARGO_BIN_NAME"), config.animate);
    let report = separate(&scene, q0, &config.separation, &viewer)?;

    for (name, distances) in report.history.iter() {
        if let Some(last) = distances.last() {
            info!("{name}: {last}");
        }
    }
    if let Some(path) = &config.history_output {
        report.history.save(path)?;
        info!("history of {} pairs written to {path:?}", report.history.len());
    }
    if let Some(path) = &config.recording_output {
        viewer.save(path)?;
        info!("{} frames written to {path:?}", viewer.num_frames());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args() {
        let bin = env!("CARGO_BIN_NAME");
        assert!(SeparateObjectsArgs::try_parse_from([bin]).is_ok());
        assert!(SeparateObjectsArgs::try_parse_from([bin, "--show-default-config"]).is_ok());
        let args = SeparateObjectsArgs::try_parse_from([
            bin,
            "--scene",
            "three-bodies",
            "--nobj",
            "5",
            "--history-output",
            "h.json",
        ])
        .unwrap();
        assert_eq!(args.scene, Some(SceneKind::ThreeBodies));
        assert_eq!(args.nobj, Some(5));
        assert!(SeparateObjectsArgs::try_parse_from([bin, "--scene", "box"]).is_err());
    }
}
