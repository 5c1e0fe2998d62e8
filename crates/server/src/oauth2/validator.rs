//! Bearer token validation for protected resources.

use crate::error::ValidationError;
use crate::oauth2::scope::Scopes;
use crate::oauth2::token_store::TokenStore;
use crate::oauth2::types::TokenKind;
use std::collections::BTreeSet;
use std::sync::Arc;
use time::OffsetDateTime;

/// Principal behind a valid access token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedToken {
    pub account_name: String,
    pub authorities: BTreeSet<String>,
    pub scopes: Scopes,
    pub client_id: String,
    pub expires_at: Option<OffsetDateTime>,
}

impl ValidatedToken {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}

#[derive(Clone)]
pub struct TokenValidator {
    tokens: Arc<dyn TokenStore>,
}

impl TokenValidator {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens }
    }

    /// Resolve an access token presented as a bearer credential.
    ///
    /// Unknown, expired and refresh tokens are all reported as
    /// [`ValidationError::Unauthorized`].
    #[tracing::instrument(skip_all)]
    pub async fn validate(&self, value: &str) -> Result<ValidatedToken, ValidationError> {
        let token = self.tokens.resolve(value).await.map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            ValidationError::from(e)
        })?;
        if token.kind != TokenKind::Access {
            tracing::debug!("Refresh token presented as bearer token");
            return Err(ValidationError::Unauthorized);
        }
        Ok(ValidatedToken {
            account_name: token.account_name,
            authorities: token.authorities,
            scopes: token.scopes,
            client_id: token.client_id,
            expires_at: token.expires_at,
        })
    }
}
