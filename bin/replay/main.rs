use octocover::core::glam::Vec3A;
use octocover::map::{encode_map, MapKind, SpatialMap};
use octocover::{
    ConfigError, CoverageConfig, CoverageService, CoveredPercentage, Pose, PoseRecord, SnapshotError, Vector3Record,
};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const USAGE: &str = "usage: coverage-replay <config.ron> <environment.snap|environment.ron> <poses.ron> [coverage.snap]";

#[derive(Debug, Error)]
enum ReplayError {
    #[error("{0}")]
    Usage(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Ron { path: PathBuf, source: ron::Error },
    #[error("no environment was loaded, so no coverage was computed")]
    NoCoverage,
}

/// A hand-written environment: the centers of its occupied voxels.
#[derive(Deserialize)]
struct VoxelList {
    resolution: f32,
    occupied: Vec<Vector3Record>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ReplayError> {
    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let config_path = args.next().ok_or(ReplayError::Usage(USAGE))?;
    let environment_path = args.next().ok_or(ReplayError::Usage(USAGE))?;
    let poses_path = args.next().ok_or(ReplayError::Usage(USAGE))?;
    let output_path = args.next();

    let config = CoverageConfig::read_file(&config_path)?;
    let mut service = CoverageService::new(&config)?;

    let environment = read_environment(&environment_path)?;
    let summary = service.on_environment_snapshot(&environment)?;
    log::info!(
        "Loaded {} voxels at resolution {} with obstacle volume {} m^3",
        summary.voxel_count,
        summary.resolution,
        summary.total_volume
    );

    let poses: Vec<PoseRecord> = read_ron(&poses_path)?;
    let mut last = None;
    for (i, record) in poses.into_iter().enumerate() {
        let pose = Pose::from(record);
        if let Some(update) = service.on_pose_update(&pose) {
            match update.covered_percentage.data {
                CoveredPercentage::Defined(p) => log::info!(
                    "Pose {}: covered {} m^3 ({:.2}%)",
                    i,
                    update.covered_volume.data,
                    p
                ),
                CoveredPercentage::Undefined => {
                    log::info!("Pose {}: covered {} m^3", i, update.covered_volume.data)
                }
            }
            last = Some(update);
        }
    }
    let last = last.ok_or(ReplayError::NoCoverage)?;

    if let Some(path) = output_path {
        std::fs::write(&path, &last.coverage_snapshot.data).map_err(|source| ReplayError::Io { path, source })?;
    }
    Ok(())
}

/// Reads an encoded snapshot, or a RON [`VoxelList`] if the file has a `.ron` extension.
fn read_environment(path: &Path) -> Result<Vec<u8>, ReplayError> {
    if path.extension().map_or(false, |e| e == "ron") {
        let list: VoxelList = read_ron(path)?;
        let mut map = SpatialMap::new(list.resolution).map_err(SnapshotError::from)?;
        for p in list.occupied {
            let key = map.key_of(Vec3A::from(p));
            map.mark_occupied(key);
        }
        return Ok(encode_map(&map, MapKind::Occupancy)?);
    }

    std::fs::read(path).map_err(|source| ReplayError::Io {
        path: path.to_owned(),
        source,
    })
}

fn read_ron<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ReplayError> {
    let reader = std::fs::File::open(path).map_err(|source| ReplayError::Io {
        path: path.to_owned(),
        source,
    })?;

    ron::de::from_reader(reader).map_err(|source| ReplayError::Ron {
        path: path.to_owned(),
        source,
    })
}
