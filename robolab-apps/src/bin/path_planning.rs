use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use robolab_apps::{
    utils::{create_rng, get_apps_config, init_tracing},
    AppViewer, Error, PathPlanningConfig,
};
use robolab_planner::{
    create_joint_path_planner, interpolate, optimize, optimize_until_success, random_configuration,
    random_descent, random_target_configuration, sample_space, PlanarArm,
};
use robolab_viewer::Viewer;
use tracing::info;

/// Path planning demos of a UR5 arm moving in the xz plane.
#[derive(Parser, Debug)]
#[command(name = env!("CARGO_BIN_NAME"))]
struct PathPlanningArgs {
    /// Path to the setting file.
    #[arg(short, long, global = true)]
    config_path: Option<PathBuf>,
    /// Seed of the random generator, random if not set.
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Writes every displayed frame to this JSON file.
    #[arg(long, global = true)]
    recording_output: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<PathPlanningCommand>,
    /// Prints the default setting as TOML.
    #[arg(long)]
    show_default_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum PathPlanningCommand {
    /// Samples random configurations until one reaches the target.
    Target,
    /// Crawls toward the target with random collision free steps.
    Descent,
    /// Samples the active joint space and writes it as JSON.
    Sample {
        #[arg(short, long, default_value = "sampled_space.json")]
        output: PathBuf,
    },
    /// Reaches the target by constrained optimization.
    Optimize {
        /// Restarts from random configurations until the target is reached.
        #[arg(long)]
        until_success: bool,
    },
    /// Plans a collision free path from a random configuration to the target.
    Plan,
    /// Runs every demo in order.
    All,
}

fn run_target(
    arm: &PlanarArm,
    config: &PathPlanningConfig,
    rng: &mut StdRng,
    viewer: &AppViewer<f64>,
) -> Result<()> {
    let q = random_target_configuration(arm, rng, config.target_threshold, viewer, config.max_trials)?;
    info!("target reached at {q:?}, distance={}", arm.distance_to_target(&q)?);
    Ok(())
}

fn run_descent(
    arm: &PlanarArm,
    config: &PathPlanningConfig,
    rng: &mut StdRng,
    viewer: &AppViewer<f64>,
) -> Result<()> {
    let report = random_descent(arm, rng, &config.descent, viewer)?;
    info!(
        "descent from {:?} to {:?}, distance {} -> {}",
        report.start, report.last, report.start_distance, report.final_distance
    );
    Ok(())
}

fn run_sample(
    arm: &PlanarArm,
    config: &PathPlanningConfig,
    rng: &mut StdRng,
    output: &Path,
) -> Result<()> {
    let space = sample_space(arm, rng, config.num_samples)?;
    space.save(output)?;
    info!(
        "{} free and {} colliding samples written to {output:?}",
        space.free.len(),
        space.colliding.len()
    );
    Ok(())
}

fn run_optimize(
    arm: &PlanarArm,
    config: &PathPlanningConfig,
    rng: &mut StdRng,
    viewer: &AppViewer<f64>,
    until_success: bool,
) -> Result<()> {
    let report = if until_success {
        optimize_until_success(arm, rng, &config.optimization, viewer, config.max_attempts)?
    } else {
        let start = random_configuration(rng, arm.lock(), Some(arm), config.max_trials)?;
        optimize(arm, &arm.lock().reduce(&start)?, &config.optimization, viewer)?
    };
    info!(
        "optimum {:?}, cost={}, converged={}, {:?}",
        report.x, report.cost, report.converged, report.solve_time
    );
    Ok(())
}

fn run_plan(
    arm: PlanarArm,
    config: &PathPlanningConfig,
    rng: &mut StdRng,
    viewer: &AppViewer<f64>,
    seed: Option<u64>,
) -> Result<()> {
    let start = random_configuration(rng, arm.lock(), Some(&arm), config.max_trials)?;
    let goal =
        random_target_configuration(&arm, rng, config.target_threshold, viewer, config.max_trials)?;
    let planner = create_joint_path_planner(arm, &config.path_planner);
    if let Some(seed) = seed {
        planner.seed(seed);
    }
    let lock = planner.arm().lock();
    let path = planner.plan(&lock.reduce(&start)?, &lock.reduce(&goal)?)?;
    let points = interpolate(&path, 5.0, 0.1).context("failed to interpolate the path")?;
    info!("showing {} interpolated points", points.len());
    for point in &points {
        viewer.display(&lock.expand(&point.position)?);
        viewer.sleep(Duration::from_millis(100));
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let args = PathPlanningArgs::parse();
    info!("ParsedArgs {args:?}");

    if args.show_default_config {
        print!("{}", toml::to_string(&PathPlanningConfig::default())?);
        return Ok(());
    }

    let command = args.command.clone().ok_or(Error::NoCommand)?;
    let config = match get_apps_config(args.config_path.clone()) {
        Some(path) => PathPlanningConfig::try_new(path)?,
        None => PathPlanningConfig::default(),
    };
    let arm = config.create_arm()?;
    let mut rng = create_rng(args.seed);
    let viewer = AppViewer::<f64>::new(env!("CARGO_BIN_NAME"), config.animate);
    viewer.place_marker(&arm.target().to_marker());

    match command {
        PathPlanningCommand::Target => run_target(&arm, &config, &mut rng, &viewer)?,
        PathPlanningCommand::Descent => run_descent(&arm, &config, &mut rng, &viewer)?,
        PathPlanningCommand::Sample { output } => run_sample(&arm, &config, &mut rng, &output)?,
        PathPlanningCommand::Optimize { until_success } => {
            run_optimize(&arm, &config, &mut rng, &viewer, until_success)?
        }
        PathPlanningCommand::Plan => run_plan(arm, &config, &mut rng, &viewer, args.seed)?,
        PathPlanningCommand::All => {
            run_target(&arm, &config, &mut rng, &viewer)?;
            run_descent(&arm, &config, &mut rng, &viewer)?;
            run_sample(&arm, &config, &mut rng, Path::new("sampled_space.json"))?;
            run_optimize(&arm, &config, &mut rng, &viewer, true)?;
            run_plan(arm, &config, &mut rng, &viewer, args.seed)?;
        }
    }

    if let Some(path) = &args.recording_output {
        viewer.save(path)?;
        info!("{} frames written to {path:?}", viewer.num_frames());
    }
    Ok(())
}
