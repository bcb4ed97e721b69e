use ambient::error::RegistryError;
use ambient::kind::UnknownKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    UnknownKind(#[from] UnknownKind),

    #[error("could not determine the data directory")]
    NoDataDir,

    #[error("invalid argument: {0}")]
    Args(String),
}
