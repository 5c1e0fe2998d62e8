//! OAuth2 HTTP endpoints.
//!
//! - `GET /authorize` - Authorization endpoint
//! - `POST /token` - Token endpoint
//! - `POST /check_token` - Token introspection
//! - `POST /revoke` - Token revocation (RFC 7009)

use crate::config::CheckTokenAccess;
use crate::error::{ClientError, GrantError, TokenError, ValidationError};
use crate::oauth2::grant::{AuthorizeRequest, ClientCredentials, TokenRequest};
use crate::oauth2::types::IssuedTokens;
use crate::oauth2::{OAUTH2_TAG, state::OAuth2State};
use axum::{
    Form, Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Creates the OAuth2 router.
pub fn router(state: OAuth2State) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(authorize))
        .routes(routes!(token))
        .routes(routes!(check_token))
        .routes(routes!(revoke))
        .with_state(state)
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// OAuth2 authorization request parameters.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthorizeQuery {
    /// Must be "code"
    pub response_type: Option<String>,
    pub client_id: Option<String>,
    /// Must match a registered redirect URI
    pub redirect_uri: Option<String>,
    /// Space-separated list of requested scopes
    pub scope: Option<String>,
    /// Opaque value returned unchanged in the redirect
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    /// "S256" or "plain"
    pub code_challenge_method: Option<String>,
}

impl From<AuthorizeQuery> for AuthorizeRequest {
    fn from(query: AuthorizeQuery) -> Self {
        Self {
            response_type: query.response_type,
            client_id: query.client_id,
            redirect_uri: query.redirect_uri,
            scope: query.scope,
            state: query.state,
            code_challenge: query.code_challenge,
            code_challenge_method: query.code_challenge_method,
        }
    }
}

#[derive(Default, Deserialize, ToSchema)]
pub struct TokenForm {
    pub grant_type: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

impl TokenForm {
    fn into_request(self, basic: Option<ClientCredentials>) -> TokenRequest {
        let client = basic.or(match (self.client_id, self.client_secret) {
            (Some(client_id), Some(client_secret)) => Some(ClientCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        });
        TokenRequest {
            grant_type: self.grant_type,
            client,
            username: self.username,
            password: self.password,
            code: self.code,
            redirect_uri: self.redirect_uri,
            code_verifier: self.code_verifier,
            refresh_token: self.refresh_token,
            scope: self.scope,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub scope: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, description: Option<String>) -> Self {
        Self {
            error: error.to_string(),
            error_description: description,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckTokenForm {
    pub token: Option<String>,
}

/// Token introspection result. Only `active` is set for invalid tokens.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CheckTokenResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Expiry as seconds since the Unix epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RevokeForm {
    pub token: Option<String>,
    pub token_type_hint: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

// =============================================================================
// Endpoints
// =============================================================================

/// OAuth2 Authorization endpoint.
///
/// The resource owner authenticates with HTTP Basic; approval is implicit.
#[tracing::instrument(skip(state, headers))]
#[utoipa::path(
    get,
    path = "/authorize",
    tag = OAUTH2_TAG,
    operation_id = "OAuth2 Authorize",
    summary = "Obtain an authorization code",
    description = "Starts the Authorization Code flow. The resource owner authenticates with HTTP Basic \
                   credentials; without them the endpoint answers 401 with a `WWW-Authenticate` challenge. \
                   On success the user agent is redirected to the client's redirect URI with `code` and `state`.\n\n\
                   Errors detected before the redirect URI is validated are returned as JSON; later errors \
                   are delivered through the redirect.\n\n\
                   **PKCE:** `code_challenge_method` may be `S256` or `plain` (default).",
    params(
        ("response_type" = String, Query, description = "Must be `code`."),
        ("client_id" = String, Query, description = "The client identifier."),
        ("redirect_uri" = Option<String>, Query, description = "Must match a registered redirect URI. May be omitted when exactly one is registered."),
        ("scope" = Option<String>, Query, description = "Space-separated list of requested scopes. Defaults to every scope of the client."),
        ("state" = Option<String>, Query, description = "Opaque value returned unchanged in the redirect."),
        ("code_challenge" = Option<String>, Query, description = "PKCE code challenge."),
        ("code_challenge_method" = Option<String>, Query, description = "`S256` or `plain`."),
    ),
    security(("basic_auth" = [])),
    responses(
        (status = 303, description = "Redirect back to the client with an authorization code or an error"),
        (status = 400, description = "Unknown client or invalid redirect URI", body = ErrorResponse),
        (status = 401, description = "Resource owner credentials missing or wrong", body = ErrorResponse),
        (status = 503, description = "Storage temporarily unavailable", body = ErrorResponse),
    )
)]
pub async fn authorize(
    State(state): State<OAuth2State>,
    headers: HeaderMap,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    let request = AuthorizeRequest::from(query);
    let target = match state.grants.validate_authorize_request(&request).await {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected authorization request");
            let status = if matches!(e, GrantError::Unavailable(_)) {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::BAD_REQUEST
            };
            return (
                status,
                Json(ErrorResponse::new(e.error_code(), e.public_description())),
            )
                .into_response();
        }
    };

    let Some(owner) = basic_credentials(&headers) else {
        return owner_challenge();
    };
    let account = match state
        .grants
        .authenticate_owner(&owner.client_id, &owner.client_secret)
        .await
    {
        Ok(account) => account,
        Err(e @ GrantError::Unavailable(_)) => return grant_error_response(&e),
        Err(e) => {
            tracing::info!(error = %e, "Resource owner authentication failed");
            return owner_challenge();
        }
    };

    match state.grants.issue_code(&target, &request, &account).await {
        Ok(code) => {
            let mut url = target.redirect_uri;
            url.query_pairs_mut().append_pair("code", &code.code);
            if let Some(s) = request.state.as_deref() {
                url.query_pairs_mut().append_pair("state", s);
            }
            Redirect::to(url.as_str()).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Authorization request refused");
            error_redirect(target.redirect_uri, request.state.as_deref(), &e)
        }
    }
}

/// OAuth2 Token endpoint.
#[tracing::instrument(skip(state, headers, form))]
#[utoipa::path(
    post,
    path = "/token",
    tag = OAUTH2_TAG,
    operation_id = "OAuth2 Token",
    summary = "Obtain an access token",
    description = "Issues tokens for a grant.\n\n\
                   **Supported grant types:**\n\
                   - `password`: exchange resource owner credentials for an access and refresh token\n\
                   - `authorization_code`: exchange an authorization code for tokens\n\
                   - `refresh_token`: obtain a new access token, optionally for a subset of the original scopes\n\n\
                   **Client authentication:** HTTP Basic or `client_id`/`client_secret` in the body.\n\n\
                   Responses carry `Cache-Control: no-store`.",
    request_body(
        content = TokenForm,
        content_type = "application/x-www-form-urlencoded",
        description = "Token request parameters"
    ),
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Tokens issued", body = TokenResponse),
        (status = 400, description = "Invalid request, grant or scope", body = ErrorResponse),
        (status = 401, description = "Client authentication failed", body = ErrorResponse),
        (status = 503, description = "Storage temporarily unavailable", body = ErrorResponse),
    )
)]
pub async fn token(
    State(state): State<OAuth2State>,
    headers: HeaderMap,
    Form(form): Form<TokenForm>,
) -> Response {
    let request = form.into_request(basic_credentials(&headers));
    match state.grants.process(&request).await {
        Ok(issued) => token_response(issued),
        Err(e) => grant_error_response(&e),
    }
}

/// Token introspection endpoint.
#[tracing::instrument(skip(state, headers, form))]
#[utoipa::path(
    post,
    path = "/check_token",
    tag = OAUTH2_TAG,
    operation_id = "OAuth2 Check Token",
    summary = "Introspect an access token",
    description = "Reports whether an access token is active and, if so, who it was issued to.\n\n\
                   Who may call this endpoint depends on `oauth2.check_token_access`: `deny_all`, \
                   `client_authenticated` (HTTP Basic client credentials, the default) or `permit_all`.",
    request_body(
        content = CheckTokenForm,
        content_type = "application/x-www-form-urlencoded",
        description = "Token to introspect"
    ),
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Introspection result", body = CheckTokenResponse),
        (status = 400, description = "Missing token parameter", body = ErrorResponse),
        (status = 401, description = "Client authentication failed", body = ErrorResponse),
        (status = 403, description = "Introspection is disabled", body = ErrorResponse),
        (status = 503, description = "Storage temporarily unavailable", body = ErrorResponse),
    )
)]
pub async fn check_token(
    State(state): State<OAuth2State>,
    headers: HeaderMap,
    Form(form): Form<CheckTokenForm>,
) -> Response {
    match state.check_token_access {
        CheckTokenAccess::DenyAll => {
            return (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::new(
                    "access_denied",
                    Some("Token introspection is disabled".to_string()),
                )),
            )
                .into_response();
        }
        CheckTokenAccess::ClientAuthenticated => {
            if let Err(e) = authenticate_client(&state, basic_credentials(&headers)).await {
                return grant_error_response(&e);
            }
        }
        CheckTokenAccess::PermitAll => {}
    }

    let Some(value) = form.token.filter(|t| !t.is_empty()) else {
        return grant_error_response(&GrantError::InvalidRequest("Missing token".to_string()));
    };

    let body = match state.validator.validate(&value).await {
        Ok(principal) => CheckTokenResponse {
            active: true,
            user_name: Some(principal.account_name),
            authorities: Some(principal.authorities.into_iter().collect()),
            scope: Some(principal.scopes.to_string()),
            client_id: Some(principal.client_id),
            exp: principal.expires_at.map(OffsetDateTime::unix_timestamp),
        },
        Err(ValidationError::Unauthorized) => CheckTokenResponse::default(),
        Err(ValidationError::Unavailable(e)) => {
            return grant_error_response(&GrantError::Unavailable(e));
        }
    };
    Json(body).into_response()
}

/// Token revocation endpoint (RFC 7009).
#[tracing::instrument(skip(state, headers, form))]
#[utoipa::path(
    post,
    path = "/revoke",
    tag = OAUTH2_TAG,
    operation_id = "OAuth2 Revoke Token",
    summary = "Revoke an access or refresh token",
    description = "Revokes a token issued to the calling client. Implements RFC 7009.\n\n\
                   **Behavior:**\n\
                   - Returns 200 OK even if the token does not exist or belongs to another client\n\
                   - `token_type_hint` is accepted and ignored\n\
                   - Revoking a refresh token also revokes the access tokens minted from it",
    request_body(
        content = RevokeForm,
        content_type = "application/x-www-form-urlencoded",
        description = "Token revocation request"
    ),
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Token revoked (or was already invalid)"),
        (status = 400, description = "Missing token parameter", body = ErrorResponse),
        (status = 401, description = "Client authentication failed", body = ErrorResponse),
        (status = 503, description = "Storage temporarily unavailable", body = ErrorResponse),
    )
)]
pub async fn revoke(
    State(state): State<OAuth2State>,
    headers: HeaderMap,
    Form(form): Form<RevokeForm>,
) -> Response {
    let presented = basic_credentials(&headers).or(match (form.client_id, form.client_secret) {
        (Some(client_id), Some(client_secret)) => Some(ClientCredentials {
            client_id,
            client_secret,
        }),
        _ => None,
    });
    let client_id = match authenticate_client(&state, presented).await {
        Ok(client_id) => client_id,
        Err(e) => return grant_error_response(&e),
    };
    let Some(value) = form.token.filter(|t| !t.is_empty()) else {
        return grant_error_response(&GrantError::InvalidRequest("Missing token".to_string()));
    };
    if let Some(hint) = form.token_type_hint.as_deref() {
        tracing::debug!(hint, "Ignoring token_type_hint");
    }

    match state.tokens.resolve(&value).await {
        Ok(token) if token.client_id == client_id => {
            if let Err(e) = state.tokens.revoke(&value).await {
                return grant_error_response(&GrantError::Unavailable(e));
            }
            tracing::info!(client_id = %client_id, account = %token.account_name, "Token revoked");
        }
        Ok(_) => {
            tracing::warn!(client_id = %client_id, "Client tried to revoke a token issued to another client");
        }
        Err(TokenError::NotFound | TokenError::Expired) => {}
        Err(TokenError::Store(e)) => return grant_error_response(&GrantError::Unavailable(e)),
    }

    StatusCode::OK.into_response()
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Decode `Authorization: Basic` credentials.
pub(crate) fn basic_credentials(headers: &HeaderMap) -> Option<ClientCredentials> {
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        && let Ok(decoded) =
            base64::Engine::decode(&base64::engine::general_purpose::STANDARD, auth.trim())
        && let Ok(creds) = String::from_utf8(decoded)
        && let Some((id, secret)) = creds.split_once(':')
    {
        return Some(ClientCredentials {
            client_id: id.to_string(),
            client_secret: secret.to_string(),
        });
    }
    None
}

async fn authenticate_client(
    state: &OAuth2State,
    presented: Option<ClientCredentials>,
) -> Result<String, GrantError> {
    let presented = presented.ok_or(GrantError::InvalidClient)?;
    match state
        .clients
        .authenticate_client(&presented.client_id, &presented.client_secret)
        .await
    {
        Ok(client) => Ok(client.client_id),
        Err(e @ ClientError::Store(_)) => Err(e.into()),
        Err(e) => {
            tracing::info!(client_id = %presented.client_id, error = %e, "Client authentication failed");
            Err(GrantError::InvalidClient)
        }
    }
}

fn no_store(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

fn token_response(issued: IssuedTokens) -> Response {
    let now = OffsetDateTime::now_utc();
    let body = TokenResponse {
        expires_in: issued.access.expires_in(now).unwrap_or(0),
        scope: issued.access.scopes.to_string(),
        access_token: issued.access.value,
        token_type: "bearer".to_string(),
        refresh_token: issued.refresh.map(|r| r.value),
    };
    no_store(Json(body).into_response())
}

fn grant_error_response(error: &GrantError) -> Response {
    let status = match error {
        GrantError::InvalidClient => StatusCode::UNAUTHORIZED,
        GrantError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_REQUEST,
    };
    let mut response = (
        status,
        Json(ErrorResponse::new(
            error.error_code(),
            error.public_description(),
        )),
    )
        .into_response();
    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Basic realm=\"oauth2/client\""),
        );
    }
    no_store(response)
}

fn owner_challenge() -> Response {
    let mut response = (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(
            "unauthorized",
            Some("Full authentication is required to access this resource".to_string()),
        )),
    )
        .into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"oauth2\""),
    );
    response
}

fn error_redirect(mut redirect_uri: Url, state: Option<&str>, error: &GrantError) -> Response {
    {
        let mut query = redirect_uri.query_pairs_mut();
        query.append_pair("error", error.error_code());
        if let Some(description) = error.public_description() {
            query.append_pair("error_description", &description);
        }
        if let Some(s) = state {
            query.append_pair("state", s);
        }
    }
    Redirect::to(redirect_uri.as_str()).into_response()
}
