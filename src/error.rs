use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Employer must have a name")]
    MissingName,

    #[error("An employer with the name '{0}' already exists.")]
    DuplicateName(String),

    #[error("Employer '{0}' not found.")]
    EmployerNotFound(String),

    #[error("Job with ID '{0}' not found.")]
    JobNotFound(String),

    #[error("store operation failed: {0}")]
    Operation(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Operation(e.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
