//! Sample protected resource.

use crate::api::auth::{AuthError, BearerAuth};
use crate::oauth2::OAuth2State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Tag for OpenAPI documentation.
pub const RESOURCE_TAG: &str = "Resource";

/// Scope required to read the caller's principal.
pub const SCOPE_READ: &str = "read";

pub fn router(state: OAuth2State) -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(me)).with_state(state)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrincipalResponse {
    pub account_name: String,
    pub authorities: Vec<String>,
    pub scope: String,
    pub client_id: String,
    /// Expiry as seconds since the Unix epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Describe the principal behind the presented access token.
#[tracing::instrument(skip_all, fields(account = %auth.0.account_name))]
#[utoipa::path(
    get,
    path = "/me",
    tag = RESOURCE_TAG,
    operation_id = "Current Principal",
    summary = "Who am I",
    description = "Returns the account, authorities and scopes of the access token presented as \
                   `Authorization: Bearer <token>`. Requires the `read` scope.",
    security(("bearer_auth" = ["read"])),
    responses(
        (status = 200, description = "The validated principal", body = PrincipalResponse),
        (status = 401, description = "Missing, unknown or expired access token", body = AuthError),
        (status = 403, description = "Token lacks the `read` scope", body = AuthError),
        (status = 503, description = "Token storage temporarily unavailable", body = AuthError),
    )
)]
pub async fn me(auth: BearerAuth) -> Result<Json<PrincipalResponse>, AuthError> {
    auth.require_scope(SCOPE_READ)?;
    let BearerAuth(principal) = auth;
    Ok(Json(PrincipalResponse {
        account_name: principal.account_name,
        authorities: principal.authorities.into_iter().collect(),
        scope: principal.scopes.to_string(),
        client_id: principal.client_id,
        expires_at: principal.expires_at.map(|t| t.unix_timestamp()),
    }))
}
