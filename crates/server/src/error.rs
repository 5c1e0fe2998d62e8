use thiserror::Error;

/// Failure of a backing store (database, in-memory map, RNG).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),
    #[error("Lifetime {0} puts the expiry out of range")]
    LifetimeOutOfRange(time::Duration),
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<getrandom::Error> for StoreError {
    fn from(err: getrandom::Error) -> Self {
        StoreError::Unavailable(format!("random source failed: {err}"))
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Account not found")]
    AccountNotFound,
    #[error("Account is disabled")]
    AccountDisabled,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Client authentication failed")]
    InvalidClient,
    #[error("Grant type {0} is not allowed for this client")]
    UnauthorizedGrantType(String),
    #[error("Scope {0} is not allowed for this client")]
    InvalidScope(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token not found")]
    NotFound,
    #[error("Token expired")]
    Expired,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Sub-reasons collapsed into `invalid_grant` on the wire.
#[derive(Debug, Error)]
pub enum InvalidGrantReason {
    #[error("Resource owner authentication failed: {0}")]
    Credentials(CredentialError),
    #[error("Authorization code not found")]
    CodeNotFound,
    #[error("Authorization code expired")]
    CodeExpired,
    #[error("Authorization code was issued to another client")]
    CodeClientMismatch,
    #[error("Redirect URI does not match the authorization request")]
    RedirectUriMismatch,
    #[error("PKCE verification failed")]
    PkceVerificationFailed,
    #[error("Refresh token not found")]
    RefreshTokenNotFound,
    #[error("Refresh token expired")]
    RefreshTokenExpired,
    #[error("Refresh token was issued to another client")]
    RefreshTokenClientMismatch,
    #[error("Presented token is not a refresh token")]
    NotARefreshToken,
    #[error("Account behind the grant is missing or disabled")]
    AccountUnavailable,
}

#[derive(Debug, Error)]
pub enum GrantError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Client authentication failed")]
    InvalidClient,
    #[error("Grant type {0} is not allowed for this client")]
    UnauthorizedGrantType(String),
    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),
    #[error("Invalid scope: {0}")]
    InvalidScope(String),
    #[error("Invalid grant: {0}")]
    InvalidGrant(InvalidGrantReason),
    #[error("Token storage unavailable: {0}")]
    Unavailable(StoreError),
}

impl GrantError {
    /// OAuth2 error code rendered in the `error` field of the response.
    pub fn error_code(&self) -> &'static str {
        match self {
            GrantError::InvalidRequest(_) => "invalid_request",
            GrantError::InvalidClient => "invalid_client",
            GrantError::UnauthorizedGrantType(_) => "unauthorized_client",
            GrantError::UnsupportedGrantType(_) => "unsupported_grant_type",
            GrantError::InvalidScope(_) => "invalid_scope",
            GrantError::InvalidGrant(_) => "invalid_grant",
            GrantError::Unavailable(_) => "temporarily_unavailable",
        }
    }

    /// Description safe to hand to the caller. Never distinguishes between
    /// unknown accounts, disabled accounts and wrong passwords.
    pub fn public_description(&self) -> Option<String> {
        match self {
            GrantError::InvalidRequest(detail) => Some(detail.clone()),
            GrantError::InvalidClient => Some("Bad client credentials".to_string()),
            GrantError::UnauthorizedGrantType(grant_type) => Some(format!(
                "Unauthorized grant type: {grant_type}"
            )),
            GrantError::UnsupportedGrantType(grant_type) => Some(format!(
                "Unsupported grant type: {grant_type}"
            )),
            GrantError::InvalidScope(scope) => Some(format!("Invalid scope: {scope}")),
            GrantError::InvalidGrant(InvalidGrantReason::Credentials(_))
            | GrantError::InvalidGrant(InvalidGrantReason::AccountUnavailable) => {
                Some("Bad credentials".to_string())
            }
            GrantError::InvalidGrant(InvalidGrantReason::CodeNotFound)
            | GrantError::InvalidGrant(InvalidGrantReason::CodeExpired)
            | GrantError::InvalidGrant(InvalidGrantReason::CodeClientMismatch)
            | GrantError::InvalidGrant(InvalidGrantReason::RedirectUriMismatch)
            | GrantError::InvalidGrant(InvalidGrantReason::PkceVerificationFailed) => {
                Some("Invalid authorization code".to_string())
            }
            GrantError::InvalidGrant(_) => Some("Invalid refresh token".to_string()),
            GrantError::Unavailable(_) => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, GrantError::Unavailable(StoreError::Unavailable(_)))
    }
}

impl From<ClientError> for GrantError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidClient => GrantError::InvalidClient,
            ClientError::UnauthorizedGrantType(grant_type) => {
                GrantError::UnauthorizedGrantType(grant_type)
            }
            ClientError::InvalidScope(scope) => GrantError::InvalidScope(scope),
            ClientError::Store(e) => GrantError::Unavailable(e),
        }
    }
}

impl From<CredentialError> for GrantError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Store(e) => GrantError::Unavailable(e),
            other => GrantError::InvalidGrant(InvalidGrantReason::Credentials(other)),
        }
    }
}

impl From<StoreError> for GrantError {
    fn from(err: StoreError) -> Self {
        GrantError::Unavailable(err)
    }
}

impl From<InvalidGrantReason> for GrantError {
    fn from(reason: InvalidGrantReason) -> Self {
        GrantError::InvalidGrant(reason)
    }
}

/// Outcome of bearer token validation as seen by protected resources.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Token storage unavailable: {0}")]
    Unavailable(StoreError),
}

impl From<TokenError> for ValidationError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::NotFound | TokenError::Expired => ValidationError::Unauthorized,
            TokenError::Store(e) => ValidationError::Unavailable(e),
        }
    }
}
