use thiserror::Error;

#[derive(Debug, Error)]
pub enum NorthfallError {
    #[error("not initialized: run 'winter init'")]
    NotInitialized,

    #[error("command not found: {0}")]
    UnknownCommand(String),

    #[error("unknown backend command: {0}")]
    UnknownBackendCommand(String),

    #[error("unknown socket data kind: {0}")]
    UnknownSocketDataKind(String),

    #[error("invalid job payload: {0}")]
    InvalidPayload(String),

    #[error("tab not found: {0}")]
    TabNotFound(String),

    #[error("cannot close the last terminal tab")]
    LastTab,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NorthfallError>;
