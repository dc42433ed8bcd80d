use thiserror::Error;

pub use octocover_map::SnapshotError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Ron(#[from] ron::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
