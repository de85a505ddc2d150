use std::time::Duration;

use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid username or password")]
    Unauthorized,

    #[error("Invalid token: {reason}")]
    InvalidToken { reason: String },

    #[error("User not found: {user}")]
    UserNotFound { user: String },

    #[error("Recipient '{username}' not found")]
    RecipientNotFound { username: String },

    #[error("Cannot send coins to yourself")]
    InvalidRecipient,

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: i64, available: i64 },

    #[error("Merch '{name}' not found")]
    MerchNotFound { name: String },

    #[error("Operation timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }

    pub fn user_not_found(user: impl ToString) -> Self {
        Self::UserNotFound {
            user: user.to_string(),
        }
    }

    pub fn recipient_not_found(username: impl Into<String>) -> Self {
        Self::RecipientNotFound {
            username: username.into(),
        }
    }

    pub fn insufficient_funds(requested: i64, available: i64) -> Self {
        Self::InsufficientFunds {
            requested,
            available,
        }
    }

    pub fn merch_not_found(name: impl Into<String>) -> Self {
        Self::MerchNotFound { name: name.into() }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::Timeout { after }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
