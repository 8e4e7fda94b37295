use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::{error, warn};

#[derive(Debug, ThisError)]
pub enum TrackerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Item not found with id: {0}")]
    ItemNotFound(i64),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),
}

impl TrackerError {
    pub fn status(&self) -> StatusCode {
        match self {
            TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            TrackerError::ItemNotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error_body = match self {
            TrackerError::Validation(message) => {
                warn!(%message, "rejected invalid item payload");
                ApiErrorBody {
                    code: "VALIDATION_ERROR".to_string(),
                    message,
                }
            }
            TrackerError::ItemNotFound(id) => {
                warn!(id, "item not found");
                ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: format!("Item not found with id: {id}"),
                }
            }
            TrackerError::DatabaseError(e) => {
                error!(error = %e, "store operation failed");
                ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                }
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
