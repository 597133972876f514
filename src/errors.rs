use axum::http::StatusCode;
use thiserror::Error;

use crate::repositories::StorageError;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product with id {0} was not found")]
    NotFound(i64),

    // Driver detail is logged where the failure is caught and stays out of responses.
    #[error("Internal storage error")]
    Storage(#[from] StorageError),
}

impl ProductError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProductError::NotFound(_) => StatusCode::NOT_FOUND,
            ProductError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
