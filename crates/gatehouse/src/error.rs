//! Unified error type for Gatehouse, and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gatehouse_authz::AuthzError;
use gatehouse_protocol::ProtocolError;
use gatehouse_session::CredentialError;
use gatehouse_store::StoreError;

use crate::config::ConfigError;
use crate::directory::DirectoryError;

/// Top-level error that wraps all crate-specific errors.
///
/// Returned by setup code (config loading, store connection, serving).
/// Request handlers return [`ApiError`] instead, which decides what the
/// client gets to see.
#[derive(Debug, thiserror::Error)]
pub enum GatehouseError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Binding or serving the listener failed.
    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// An error as the client sees it.
///
/// Bodies are opaque (`{"error": "<kind>"}`). Internal causes are logged
/// with `tracing` where the conversion happens and never sent back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    /// No credential, or one that does not resolve (401).
    Unauthorized,
    /// Valid credential, insufficient privilege (403).
    Forbidden,
    /// The addressed resource does not exist (404).
    NotFound,
    /// The request body or path was malformed (400).
    BadRequest,
    /// Rate limit hit (429).
    TooManyRequests,
    /// Anything the client cannot fix: store outage, corrupted record,
    /// directory failure (500).
    Internal,
}

impl ApiError {
    pub fn status(self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::TooManyRequests => "too_many_requests",
            Self::Internal => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.kind() }));
        (self.status(), body).into_response()
    }
}

impl From<CredentialError> for ApiError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::NotFound => Self::Unauthorized,
            other => {
                tracing::error!(error = %other, "credential layer failed");
                Self::Internal
            }
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(e: AuthzError) -> Self {
        match e {
            AuthzError::Forbidden => Self::Forbidden,
            other => {
                tracing::error!(error = %other, "authorization check failed");
                Self::Internal
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!(error = %e, retryable = e.is_retryable(), "credential store failed");
        Self::Internal
    }
}

impl From<DirectoryError> for ApiError {
    fn from(e: DirectoryError) -> Self {
        tracing::error!(error = %e, "user directory failed");
        Self::Internal
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gatehouse_authz::MembershipError;

    use super::*;

    #[test]
    fn test_credential_not_found_is_unauthorized() {
        assert_eq!(ApiError::from(CredentialError::NotFound), ApiError::Unauthorized);
    }

    #[test]
    fn test_corrupted_record_is_internal_not_unauthorized() {
        let err = CredentialError::Decode(ProtocolError::UnknownRole(9));
        assert_eq!(ApiError::from(err), ApiError::Internal);
    }

    #[test]
    fn test_store_timeout_is_internal() {
        let err = CredentialError::Store(StoreError::Timeout {
            op: "GET",
            after: Duration::from_millis(250),
        });
        assert_eq!(ApiError::from(err), ApiError::Internal);
    }

    #[test]
    fn test_membership_failure_is_internal_not_allowed() {
        let err = AuthzError::Membership(MembershipError("down".into()));
        assert_eq!(ApiError::from(err), ApiError::Internal);
        assert_eq!(ApiError::from(AuthzError::Forbidden), ApiError::Forbidden);
    }

    #[test]
    fn test_from_store_error() {
        let err = StoreError::Unavailable("refused".into());
        let gatehouse_err: GatehouseError = err.into();
        assert!(matches!(gatehouse_err, GatehouseError::Store(_)));
        assert!(gatehouse_err.to_string().contains("refused"));
    }

    #[test]
    fn test_from_credential_error() {
        let gatehouse_err: GatehouseError = CredentialError::NotFound.into();
        assert!(matches!(gatehouse_err, GatehouseError::Credential(_)));
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::TooManyRequests.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ApiError::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
