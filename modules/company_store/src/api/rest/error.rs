use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::domain::error::DomainError;

pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    ProblemResponse(
        Problem::new(status, code, title)
            .detail(detail)
            .at(instance)
            .traced(),
    )
}

pub fn unauthorized(detail: impl Into<String>, instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::UNAUTHORIZED,
        "STORE_UNAUTHORIZED",
        "Unauthorized",
        detail,
        instance,
    )
}

/// Status, code and title for each domain failure.
fn classify(e: &DomainError) -> (StatusCode, &'static str, &'static str) {
    use DomainError::*;
    match e {
        Validation { .. } => (StatusCode::BAD_REQUEST, "STORE_VALIDATION", "Validation error"),
        Unauthorized => (StatusCode::UNAUTHORIZED, "STORE_UNAUTHORIZED", "Unauthorized"),
        InvalidToken { .. } => (StatusCode::UNAUTHORIZED, "STORE_INVALID_TOKEN", "Invalid token"),
        UserNotFound { .. } => (StatusCode::NOT_FOUND, "STORE_USER_NOT_FOUND", "User not found"),
        RecipientNotFound { .. } => (
            StatusCode::BAD_REQUEST,
            "STORE_RECIPIENT_NOT_FOUND",
            "Recipient not found",
        ),
        InvalidRecipient => (
            StatusCode::BAD_REQUEST,
            "STORE_INVALID_RECIPIENT",
            "Invalid recipient",
        ),
        InsufficientFunds { .. } => (
            StatusCode::BAD_REQUEST,
            "STORE_INSUFFICIENT_FUNDS",
            "Insufficient funds",
        ),
        MerchNotFound { .. } => (StatusCode::BAD_REQUEST, "STORE_MERCH_NOT_FOUND", "Merch not found"),
        Timeout { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_TIMEOUT", "Internal error"),
        Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_DB", "Internal error"),
    }
}

/// Client errors echo the domain message; server errors are logged here
/// and answered with a generic detail.
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    let (status, code, title) = classify(e);
    let detail = match e {
        DomainError::Timeout { .. } => {
            tracing::error!(error = ?e, path = instance, "ledger transaction timed out");
            "The operation did not complete in time".to_string()
        }
        DomainError::Database { .. } => {
            tracing::error!(error = ?e, path = instance, "database error");
            "An internal database error occurred".to_string()
        }
        _ => e.to_string(),
    };
    from_parts(status, code, title, detail, instance)
}

/// Routes acting on the authenticated caller. The caller's own row going
/// missing mid-request is a server fault there, so `UserNotFound` is a 500.
pub fn map_caller_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::UserNotFound { .. } => {
            tracing::error!(error = ?e, path = instance, "authenticated user vanished");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal error",
                "An internal error occurred",
                instance,
            )
        }
        _ => map_domain_error(e, instance),
    }
}

pub fn json_rejection(rejection: JsonRejection, instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::BAD_REQUEST,
        "STORE_BAD_REQUEST",
        "Invalid request body",
        rejection.body_text(),
        instance,
    )
}
