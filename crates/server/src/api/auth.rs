//! Bearer token extractor for protected resources.

use crate::error::ValidationError;
use crate::oauth2::{OAuth2State, ValidatedToken};
use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error type for authentication failures
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthError {
    /// Error code (e.g., "invalid_token", "insufficient_scope")
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl AuthError {
    pub fn invalid_token(description: impl Into<String>) -> Self {
        Self {
            error: "invalid_token".to_string(),
            error_description: Some(description.into()),
        }
    }

    pub fn insufficient_scope(required_scope: &str) -> Self {
        Self {
            error: "insufficient_scope".to_string(),
            error_description: Some(format!("Token requires '{}' scope", required_scope)),
        }
    }

    pub fn temporarily_unavailable() -> Self {
        Self {
            error: "temporarily_unavailable".to_string(),
            error_description: None,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self.error.as_str() {
            "invalid_token" => StatusCode::UNAUTHORIZED,
            "insufficient_scope" => StatusCode::FORBIDDEN,
            "temporarily_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let challenge = match status {
            StatusCode::UNAUTHORIZED => Some("Bearer error=\"invalid_token\""),
            StatusCode::FORBIDDEN => Some("Bearer error=\"insufficient_scope\""),
            _ => None,
        };
        let mut response = (status, Json(self)).into_response();
        if let Some(challenge) = challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        }
        response
    }
}

/// Axum extractor that validates `Authorization: Bearer <token>`.
///
/// # Example
///
/// ```ignore
/// async fn handler(BearerAuth(principal): BearerAuth) -> impl IntoResponse {
///     format!("Hello, {}", principal.account_name)
/// }
/// ```
pub struct BearerAuth(pub ValidatedToken);

impl BearerAuth {
    pub fn require_scope(&self, scope: &str) -> Result<(), AuthError> {
        if self.0.has_scope(scope) {
            Ok(())
        } else {
            Err(AuthError::insufficient_scope(scope))
        }
    }
}

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    OAuth2State: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = OAuth2State::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let access_token = match auth_header {
            Some(header) => match header.split_once(' ') {
                Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
                _ => {
                    return Err(AuthError::invalid_token(
                        "Authorization header must use Bearer scheme",
                    ));
                }
            },
            None => {
                return Err(AuthError::invalid_token("Missing Authorization header"));
            }
        };

        match state.validator.validate(access_token).await {
            Ok(principal) => Ok(BearerAuth(principal)),
            Err(ValidationError::Unauthorized) => {
                Err(AuthError::invalid_token("Invalid or expired access token"))
            }
            Err(ValidationError::Unavailable(e)) => {
                tracing::error!(error = %e, "Token store unavailable during bearer validation");
                Err(AuthError::temporarily_unavailable())
            }
        }
    }
}
