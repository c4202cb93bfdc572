//! Error-to-response mapping.

use {
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    serde_json::json,
    tracing::error,
};

use crate::submission::SubmitError;

/// An error already shaped for the wire: a status code and a message that is
/// safe to show to clients.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<skillery_github::Error> for ApiError {
    fn from(err: skillery_github::Error) -> Self {
        use skillery_github::Error;
        let status = match &err {
            Error::InvalidRepoReference(_) => StatusCode::BAD_REQUEST,
            Error::SkillFolderNotFound(_) => StatusCode::NOT_FOUND,
            Error::RemoteApi { .. } | Error::TreeTruncated | Error::Http(_) => {
                StatusCode::BAD_GATEWAY
            },
            Error::Decode(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: err.to_string() }
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Github(e) => e.into(),
            SubmitError::Storage(e) => Self::internal(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_errors_map_to_expected_statuses() {
        use skillery_github::Error;

        let cases = [
            (Error::InvalidRepoReference("x".into()), StatusCode::BAD_REQUEST),
            (Error::SkillFolderNotFound("skills/x".into()), StatusCode::NOT_FOUND),
            (Error::RemoteApi { status: 500, path: "/repos".into() }, StatusCode::BAD_GATEWAY),
            (Error::TreeTruncated, StatusCode::BAD_GATEWAY),
            (Error::Decode("bad base64".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }

    #[test]
    fn storage_errors_are_internal() {
        let err = SubmitError::Storage(anyhow::anyhow!("disk full"));
        let api: ApiError = err.into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api.message.contains("disk full"));
    }
}
