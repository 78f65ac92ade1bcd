use thiserror::Error;

use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

/// Top-level application error for startup and background paths. Request
/// handlers never surface this directly; they answer with the structured
/// API error body instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
