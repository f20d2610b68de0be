use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to create storage directory {path}: {source}", path = path.display())]
    StorageDirCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read stored key: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write stored key: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize clinic state: {0}")]
    Serialization(serde_json::Error),
    #[error("stored value for '{key}' is not valid: {source}")]
    CorruptState {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored counter '{key}' is not a positive integer: {value:?}")]
    CorruptCounter { key: String, value: String },
    #[error("no ids left after the largest value tracked by '{key}'")]
    CounterExhausted { key: String },
    #[error("a report needs both a start and an end date")]
    IncompleteRange,
    #[error(transparent)]
    Types(#[from] clinic_types::TypesError),
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
