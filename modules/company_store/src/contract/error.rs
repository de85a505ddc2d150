use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompanyStoreError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Invalid recipient")]
    InvalidRecipient,

    #[error("Internal error")]
    Internal,
}

impl CompanyStoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}

impl From<crate::domain::error::DomainError> for CompanyStoreError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            Validation { field, message } => Self::validation(format!("{field}: {message}")),
            Unauthorized | InvalidToken { .. } => Self::Unauthorized,
            UserNotFound { user } => Self::not_found(format!("user {user}")),
            RecipientNotFound { username } => Self::not_found(format!("recipient '{username}'")),
            MerchNotFound { name } => Self::not_found(format!("merch '{name}'")),
            InvalidRecipient => Self::InvalidRecipient,
            InsufficientFunds { .. } => Self::InsufficientFunds,
            Timeout { .. } | Database { .. } => Self::Internal,
        }
    }
}
