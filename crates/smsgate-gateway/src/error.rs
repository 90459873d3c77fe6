// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`SmsgateError`] to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use smsgate_core::SmsgateError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// Handler error. Wraps the core error so it can be returned from axum handlers.
#[derive(Debug)]
pub struct ApiError(pub SmsgateError);

impl From<SmsgateError> for ApiError {
    fn from(e: SmsgateError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SmsgateError::AuthFailure => StatusCode::UNAUTHORIZED,
            SmsgateError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            SmsgateError::Validation(_) => StatusCode::BAD_REQUEST,
            SmsgateError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Infrastructure detail stays in the logs.
    fn message(&self) -> String {
        match &self.0 {
            SmsgateError::AuthFailure
            | SmsgateError::QuotaExceeded { .. }
            | SmsgateError::Validation(_)
            | SmsgateError::NotFound { .. } => self.0.to_string(),
            SmsgateError::PublishFailure { .. } => "failed to publish message".to_string(),
            _ => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                success: false,
                message: self.message(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (SmsgateError::AuthFailure, StatusCode::UNAUTHORIZED),
            (SmsgateError::QuotaExceeded { limit: 2 }, StatusCode::TOO_MANY_REQUESTS),
            (SmsgateError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                SmsgateError::NotFound {
                    kind: "message",
                    id: "t1".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                SmsgateError::PublishFailure {
                    source: "queue down".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (SmsgateError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ApiError(SmsgateError::Storage {
            source: "disk I/O error at /var/lib/smsgate".into(),
        });
        assert_eq!(err.message(), "internal server error");
        let err = ApiError(SmsgateError::QuotaExceeded { limit: 2 });
        assert_eq!(err.message(), "daily quota of 2 exceeded");
    }

    #[test]
    fn error_body_shape() {
        let err = ApiError(SmsgateError::AuthFailure);
        let body = ErrorResponse {
            success: false,
            message: err.message(),
        };
        insta::assert_json_snapshot!(body, @r###"
        {
          "success": false,
          "message": "invalid api key"
        }
        "###);
    }
}
