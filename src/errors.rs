use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// The lead endpoint only accepts `POST`.
    MethodNotAllowed,
    /// The request body could not be buffered (e.g. over the size limit).
    BodyRejected { status: StatusCode, reason: String },
    /// Required Mailchimp settings are absent (names of the missing variables).
    MissingConfiguration(Vec<&'static str>),
    /// Mailchimp refused the member upsert; status and body are passed through.
    UpsertRejected {
        status: StatusCode,
        details: Value,
    },
    /// Anything else: network faults, unreadable replies, bad URLs.
    Unhandled(String),
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MethodNotAllowed => write!(f, "Method not allowed"),
            AppError::BodyRejected { status, reason } => write!(f, "{}: {}", status, reason),
            AppError::MissingConfiguration(missing) => {
                write!(f, "Missing Mailchimp configuration: {}", missing.join(", "))
            }
            AppError::UpsertRejected { status, details } => {
                write!(f, "Mailchimp upsert failed with {}: {}", status, details)
            }
            AppError::Unhandled(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Each variant maps to the status code and JSON body the lead form expects.
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed" }),
            ),
            AppError::BodyRejected { status, reason } => {
                tracing::warn!("Rejected lead body: {}", reason);
                (status, json!({ "error": reason }))
            }
            AppError::MissingConfiguration(missing) => {
                tracing::error!("Missing Mailchimp configuration: {}", missing.join(", "));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Missing Mailchimp env configuration" }),
                )
            }
            AppError::UpsertRejected { status, details } => (
                status,
                json!({ "error": "Mailchimp upsert failed", "details": details }),
            ),
            AppError::Unhandled(msg) => {
                tracing::error!("Unhandled error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Unhandled error", "details": msg }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    fn from(err: reqwest::Error) -> Self {
        AppError::Unhandled(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Unhandled(format!("Invalid Mailchimp URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_method_not_allowed_response() {
        let response = AppError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Method not allowed" })
        );
    }

    #[tokio::test]
    async fn test_upsert_rejection_keeps_remote_status() {
        let response = AppError::UpsertRejected {
            status: StatusCode::BAD_REQUEST,
            details: json!({ "title": "Invalid Resource" }),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({
                "error": "Mailchimp upsert failed",
                "details": { "title": "Invalid Resource" }
            })
        );
    }

    #[tokio::test]
    async fn test_body_rejection_is_json() {
        let response = AppError::BodyRejected {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            reason: "length limit exceeded".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "length limit exceeded" })
        );
    }

    #[tokio::test]
    async fn test_missing_configuration_hides_variable_names() {
        let response = AppError::MissingConfiguration(vec!["MAILCHIMP_API_KEY"]).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Missing Mailchimp env configuration" })
        );
    }

    #[tokio::test]
    async fn test_unhandled_error_carries_details() {
        let response = AppError::Unhandled("connection reset".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Unhandled error", "details": "connection reset" })
        );
    }
}
