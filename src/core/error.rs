use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Instance '{0}' not found")]
    InstanceNotFound(Uuid),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid qualified name: {0}")]
    InvalidName(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Context is not bound to an instance")]
    InstanceNotBound,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::InstanceNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
