//! HTTP error mapping.
//!
//! Every failure leaves the server as a structured body
//! `{"ok": false, "detail": …, "code": …}` with a status drawn from the
//! protocol taxonomy. Lifecycle violations are client errors — the
//! recovery is always "request a fresh challenge and restart capture" —
//! while a capability timeout is the gateway's fault and says so.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use facegate_liveness::{DirectoryError, IssueError, VerifyError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid API key")]
    InvalidApiKey,

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Issue(#[from] IssueError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("{detail}")]
    BadRequest {
        code: &'static str,
        detail: String,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn bad_request(code: &'static str, detail: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Self::Directory(e) => match e {
                DirectoryError::MissingHeader(_) => StatusCode::BAD_REQUEST,
                DirectoryError::UnknownBranch(_) => StatusCode::NOT_FOUND,
                DirectoryError::DeviceNotRegistered(_) | DirectoryError::DeviceInactive(_) => {
                    StatusCode::UNAUTHORIZED
                }
            },
            Self::Issue(IssueError::InvalidContext(_)) => StatusCode::BAD_REQUEST,
            Self::Verify(e) => match e {
                VerifyError::ChallengeNotFound => StatusCode::NOT_FOUND,
                VerifyError::ChallengeExpired => StatusCode::GONE,
                VerifyError::ChallengeAlreadyConsumed => StatusCode::CONFLICT,
                VerifyError::TenantMismatch => StatusCode::FORBIDDEN,
                VerifyError::FrameOutOfWindow(_) => StatusCode::BAD_REQUEST,
                VerifyError::ActionNotDetected { .. } | VerifyError::NoFaceMatch => {
                    StatusCode::UNAUTHORIZED
                }
                VerifyError::VerificationTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                VerifyError::Capability(_) => StatusCode::BAD_GATEWAY,
            },
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidApiKey => "invalid_api_key",
            Self::Directory(e) => e.code(),
            Self::Issue(e) => e.code(),
            Self::Verify(e) => e.code(),
            Self::BadRequest { code, .. } => code,
            Self::Config(_) => "config_error",
            Self::Server(_) => "server_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    detail: String,
    code: &'static str,
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            ok: false,
            detail: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_violations_map_to_client_errors() {
        assert_eq!(
            RpcError::from(VerifyError::ChallengeAlreadyConsumed).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            RpcError::from(VerifyError::ChallengeExpired).status(),
            StatusCode::GONE
        );
        assert_eq!(
            RpcError::from(VerifyError::TenantMismatch).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn timeout_is_not_a_merit_failure_status() {
        let timeout = RpcError::from(VerifyError::VerificationTimeout { stage: "action" });
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.code(), "verification_timeout");

        let merit = RpcError::from(VerifyError::NoFaceMatch);
        assert_eq!(merit.status(), StatusCode::UNAUTHORIZED);
    }
}
