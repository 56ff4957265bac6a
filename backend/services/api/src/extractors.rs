use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Bearer credential from the `Authorization` header.
///
/// Only presence and shape are checked here; the token itself is verified
/// by the gateway in front of this service.
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))?;

        let value = header
            .to_str()
            .map_err(|_| ApiError::unauthorized("invalid Authorization header value"))?;

        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Authorization header must be 'Bearer <token>'"))?;

        Ok(BearerToken(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(header: Option<&str>) -> Result<BearerToken, ApiError> {
        let mut builder = Request::post("/check-alerts");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        BearerToken::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn accepts_bearer_token() {
        let BearerToken(token) = extract(Some("Bearer abc.def")).await.ok().unwrap();
        assert_eq!(token, "abc.def");
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        let err = extract(None).await.err().unwrap();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_other_schemes_and_empty_tokens() {
        for value in ["Basic dXNlcjpwYXNz", "Bearer ", "Bearer    "] {
            let err = extract(Some(value)).await.err().unwrap();
            assert_eq!(err.status, StatusCode::UNAUTHORIZED, "{value}");
        }
    }
}
