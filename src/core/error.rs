use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no widget instance with id {0:?}")]
    UnknownInstance(String),

    /// Canonical instances are toggled off with `deactivate`, not removed.
    #[error("widget instance {0:?} is canonical and cannot be removed")]
    NotRemovable(String),

    /// The instance is mid-step (called back into the registry from a tick).
    #[error("widget instance {0:?} is busy")]
    Busy(String),
}
