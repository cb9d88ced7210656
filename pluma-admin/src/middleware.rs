use crate::server::AdminState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use pluma_core::plugin::Caller;
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const USER_HEADER: &str = "x-pluma-user";
pub const DEFAULT_USER: &str = "admin";

/// Admin API key authentication middleware.
///
/// With no key configured every request passes.
pub async fn api_key_auth(
    State(state): State<Arc<AdminState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    if presented == Some(expected) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request with missing or bad API key");
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Identity the request acts as.
pub fn caller_from(headers: &HeaderMap) -> Caller {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(Caller::new)
        .unwrap_or_else(|| Caller::new(DEFAULT_USER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn caller_defaults_to_admin() {
        assert_eq!(caller_from(&HeaderMap::new()).name, "admin");
    }

    #[test]
    fn caller_read_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static(" alice "));
        assert_eq!(caller_from(&headers).name, "alice");
    }

    #[test]
    fn blank_header_falls_back_to_default() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static("  "));
        assert_eq!(caller_from(&headers).name, "admin");
    }
}
