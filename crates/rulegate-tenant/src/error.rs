use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
