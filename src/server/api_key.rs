use super::errors::ErrorResponse;
use super::state::ServerState;

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

pub const HEADER_API_KEY: &str = "X-API-Key";

/// Proof that the request carried the configured API key.
#[derive(Debug, PartialEq, Eq)]
pub struct ApiKey;

#[derive(Debug, PartialEq, Eq)]
pub enum ApiKeyRejection {
    Missing,
    Invalid,
    NotConfigured,
}

impl IntoResponse for ApiKeyRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiKeyRejection::Missing => (StatusCode::UNAUTHORIZED, "Missing API key"),
            ApiKeyRejection::Invalid => (StatusCode::UNAUTHORIZED, "Invalid API key"),
            ApiKeyRejection::NotConfigured => {
                (StatusCode::INTERNAL_SERVER_ERROR, "API key not configured")
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

fn extract_api_key_from_headers(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(HEADER_API_KEY)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Compares without short-circuiting on the first differing byte.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        return false;
    }
    provided
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn check_api_key(provided: Option<&str>, expected: Option<&str>) -> Result<ApiKey, ApiKeyRejection> {
    let Some(expected) = expected else {
        error!("Rejecting request: no API key configured on the server");
        return Err(ApiKeyRejection::NotConfigured);
    };
    let Some(provided) = provided else {
        debug!("No {} header in request", HEADER_API_KEY);
        return Err(ApiKeyRejection::Missing);
    };
    if keys_match(provided, expected) {
        Ok(ApiKey)
    } else {
        debug!("Wrong API key");
        Err(ApiKeyRejection::Invalid)
    }
}

impl FromRequestParts<ServerState> for ApiKey {
    type Rejection = ApiKeyRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let provided = extract_api_key_from_headers(parts);
        check_api_key(provided.as_deref(), ctx.config.api_key.as_deref())
    }
}

/// Guards every route of the router it is layered on, static files included.
pub async fn require_api_key(_api_key: ApiKey, request: Request, next: Next) -> Response {
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_key() {
        assert_eq!(check_api_key(Some("s3cret"), Some("s3cret")), Ok(ApiKey));
    }

    #[test]
    fn rejects_missing_or_wrong_key() {
        assert_eq!(
            check_api_key(None, Some("s3cret")),
            Err(ApiKeyRejection::Missing)
        );
        assert_eq!(
            check_api_key(Some("s3cre"), Some("s3cret")),
            Err(ApiKeyRejection::Invalid)
        );
        assert_eq!(
            check_api_key(Some("S3CRET"), Some("s3cret")),
            Err(ApiKeyRejection::Invalid)
        );
    }

    #[test]
    fn unconfigured_key_rejects_everything() {
        assert_eq!(
            check_api_key(Some("anything"), None),
            Err(ApiKeyRejection::NotConfigured)
        );
        assert_eq!(check_api_key(None, None), Err(ApiKeyRejection::NotConfigured));
    }

    #[test]
    fn rejection_statuses() {
        assert_eq!(
            ApiKeyRejection::Missing.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiKeyRejection::Invalid.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiKeyRejection::NotConfigured.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
