use axum::{http::StatusCode, response::IntoResponse, Json};
use primitives::{ad::IntakeError, targeting::InvalidParameter};
use serde_json::json;

use crate::db::RepositoryError;

/// The error surface of the REST API.
///
/// Every variant renders as `{"error": <message>}` with the matching status
/// code. Parameter and intake failures are detected before any storage
/// interaction; a storage failure is surfaced immediately, no retries.
#[derive(Debug, PartialEq, Eq)]
pub enum ResponseError {
    NotFound,
    /// 400, `invalid <field> parameter`
    InvalidParameter(InvalidParameter),
    /// 400, the intake payload did not bind to an advertisement
    MalformedPayload,
    /// 400, the intake payload binds but lacks required fields
    MissingRequiredField,
    /// 500, the storage collaborator failed
    BackendUnavailable(String),
}

impl IntoResponse for ResponseError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ResponseError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ResponseError::InvalidParameter(parameter) => {
                (StatusCode::BAD_REQUEST, parameter.to_string())
            }
            ResponseError::MalformedPayload => {
                (StatusCode::BAD_REQUEST, "Failed binding data".to_string())
            }
            ResponseError::MissingRequiredField => {
                (StatusCode::BAD_REQUEST, "Missing required fields".to_string())
            }
            ResponseError::BackendUnavailable(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<InvalidParameter> for ResponseError {
    fn from(parameter: InvalidParameter) -> Self {
        ResponseError::InvalidParameter(parameter)
    }
}

impl From<IntakeError> for ResponseError {
    fn from(_: IntakeError) -> Self {
        ResponseError::MissingRequiredField
    }
}

impl From<RepositoryError> for ResponseError {
    fn from(error: RepositoryError) -> Self {
        ResponseError::BackendUnavailable(error.to_string())
    }
}

/// Fallback handler for unmatched routes.
pub async fn not_found() -> ResponseError {
    ResponseError::NotFound
}
