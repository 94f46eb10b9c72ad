//! Error types for the roll-call registry and CLI.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A person or entry was asked for and is not there. Never fatal.
    #[error("not found: {0}")]
    LookupMiss(String),

    /// The backing key-value store could not be read or written.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Login name or admin credentials did not match the directory.
    #[error("{0}")]
    InvalidCredential(String),

    /// The person already has a record for today.
    #[error("Registro já realizado para hoje: {0}")]
    AlreadyRecorded(String),

    /// A member submission must be either present or justified.
    #[error("{0}")]
    InvalidSubmission(String),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("xlsx: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors the registry recovers from locally instead of failing the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::LookupMiss(_) | Error::StoreUnavailable(_))
    }
}
