use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use vision_reconstruction::prelude::*;

/// Estimate oriented vertex normals for a reconstructed point cloud.
#[derive(Debug, Parser)]
#[command(author, version, about = "Robust vertex normal estimation")]
struct Args {
    /// Path to a JSON ReconstructionStore.
    #[arg(long)]
    input: PathBuf,

    /// Optional path to a JSON NormalsConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the normals export here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the store with its updated normals here.
    #[arg(long)]
    store_output: Option<PathBuf>,

    /// Neighborhood size, overrides the config.
    #[arg(short, long)]
    k: Option<usize>,

    /// Spread per-vertex work over all cores.
    #[arg(long)]
    parallel: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}

fn write_json_file<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Run one normals session from files; returns the export as JSON.
fn run_normals_from_files(args: &Args) -> Result<String> {
    let store: ReconstructionStore = load_json_file(&args.input)?;
    let config = match &args.config {
        Some(path) => load_json_file::<NormalsConfig>(path)?,
        None => NormalsConfig::default(),
    };
    log::info!(
        "loaded {} vertices, {} shots from {}",
        store.num_vertices(),
        store.num_shots(),
        args.input.display()
    );

    let mut session = ReconstructionSession::<NormalEstimationProblem>::with_input(store)?;
    session.set_config(config)?;
    step_compute_normals(
        &mut session,
        Some(ComputeNormalsOptions {
            k: args.k,
            parallel: args.parallel.then_some(true),
            ..ComputeNormalsOptions::default()
        }),
    )?;
    let export = session.export()?;

    if let Some(path) = &args.store_output {
        write_json_file(session.require_input()?, path)?;
    }
    Ok(serde_json::to_string_pretty(&export)?)
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    if let Err(err) = builder.try_init() {
        eprintln!("failed to initialize logger: {err}");
    }
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);
    let json = run_normals_from_files(&args)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use vision_reconstruction::synthetic::{SceneBuilder, UniformPointNoise, grid_on_plane, jittered};

    fn synthetic_store() -> ReconstructionStore {
        let mut scene = SceneBuilder::new();
        let shot = scene
            .shot(Shot::calibrated(640, 480, Vec3::new(0.0, 0.0, -3.0)))
            .unwrap();
        let grid = grid_on_plane(&Plane::new(Vec3::z(), 0.0), &Pt3::origin(), 6, 6, 0.1);
        let points = jittered(&grid, &UniformPointNoise::new(8, 1e-6));
        scene.reconstructed_points(&points, &[shot]).unwrap();
        scene.build()
    }

    fn args_for(input: &Path) -> Args {
        Args::parse_from(["recon-normals", "--input", input.to_str().unwrap()])
    }

    #[test]
    fn cli_flags_parse() {
        let args = Args::parse_from([
            "recon-normals",
            "--input",
            "cloud.json",
            "--config",
            "normals.json",
            "-k",
            "32",
            "--parallel",
            "-vv",
        ]);
        assert_eq!(args.input, PathBuf::from("cloud.json"));
        assert_eq!(args.config, Some(PathBuf::from("normals.json")));
        assert_eq!(args.k, Some(32));
        assert!(args.parallel);
        assert_eq!(args.verbose, 2);
        assert!(args.output.is_none());
    }

    #[test]
    fn estimates_normals_from_files() {
        let input = NamedTempFile::new().unwrap();
        let config = NamedTempFile::new().unwrap();
        let store_out = NamedTempFile::new().unwrap();
        write_json_file(&synthetic_store(), input.path()).unwrap();
        write_json_file(
            &NormalsConfig {
                k: 12,
                ..NormalsConfig::default()
            },
            config.path(),
        )
        .unwrap();

        let mut args = args_for(input.path());
        args.config = Some(config.path().to_path_buf());
        args.store_output = Some(store_out.path().to_path_buf());
        args.parallel = true;

        let json = run_normals_from_files(&args).unwrap();
        let export: NormalsExport = serde_json::from_str(&json).unwrap();
        assert_eq!(export.summary.oriented, 36);
        for record in &export.normals {
            assert!((record.normal + Vec3::z()).norm() < 1e-3);
        }

        let updated: ReconstructionStore = load_json_file(store_out.path()).unwrap();
        assert!(updated.vertices().all(|(_, v)| v.normal.is_some()));
    }

    #[test]
    fn reports_missing_input() {
        let args = args_for(Path::new("/nonexistent/cloud.json"));
        let err = run_normals_from_files(&args).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }

    #[test]
    fn rejects_invalid_override() {
        let input = NamedTempFile::new().unwrap();
        write_json_file(&synthetic_store(), input.path()).unwrap();
        let mut args = args_for(input.path());
        args.k = Some(1);
        assert!(run_normals_from_files(&args).is_err());
    }
}
