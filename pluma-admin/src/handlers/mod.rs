pub mod health;
pub mod plugins;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use pluma_core::error::PlumaError;

/// Registry failure rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(pub PlumaError);

impl From<PlumaError> for ApiError {
    fn from(e: PlumaError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Admin request failed");
        }
        (status, Json(self.0.to_json_body())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
