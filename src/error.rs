use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("forbidden")]
    Forbidden,
}

impl Error {
    /// True for failures the caller can fix by changing the request.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::NotFound | Error::AlreadyExists | Error::Forbidden
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
