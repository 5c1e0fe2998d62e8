//! Token endpoint grant handling.
//!
//! A [`GrantProcessor`] turns one token request into tokens or a
//! [`GrantError`]. It is stateless between requests; all state lives in the
//! stores it is built from.

use crate::config::OAuth2Config;
use crate::error::{GrantError, InvalidGrantReason, StoreError, TokenError};
use crate::oauth2::credentials::CredentialStore;
use crate::oauth2::password::generate_token;
use crate::oauth2::registrar::ClientRegistry;
use crate::oauth2::scope::Scopes;
use crate::oauth2::token_store::TokenStore;
use crate::oauth2::types::{
    Account, AuthorizationCode, Client, CodeExchange, GrantType, IssueOptions, IssuedTokens,
    PkceMethod, TokenGrant, TokenKind, expires_after,
};
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

/// Client id and secret as presented by the caller.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// A token request after transport decoding.
#[derive(Clone, Default)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub client: Option<ClientCredentials>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Progress of a single token request. Logged when the request is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantStage {
    ReceivedRequest,
    ClientAuthenticated,
    OwnerAuthenticated,
    CodeConsumed,
    RefreshValidated,
    TokenIssued,
}

impl GrantStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantStage::ReceivedRequest => "received_request",
            GrantStage::ClientAuthenticated => "client_authenticated",
            GrantStage::OwnerAuthenticated => "owner_authenticated",
            GrantStage::CodeConsumed => "code_consumed",
            GrantStage::RefreshValidated => "refresh_validated",
            GrantStage::TokenIssued => "token_issued",
        }
    }
}

impl fmt::Display for GrantStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query of an authorization request (`GET /oauth/authorize`).
#[derive(Clone, Debug, Default)]
pub struct AuthorizeRequest {
    pub response_type: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

/// Client and redirect URI of an authorization request that checked out.
/// Errors after this point go back to the client through the redirect.
#[derive(Clone, Debug)]
pub struct AuthorizeTarget {
    pub client: Client,
    pub redirect_uri: Url,
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, GrantError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GrantError::InvalidRequest(format!("Missing {name}")))
}

pub struct GrantProcessor {
    credentials: Arc<dyn CredentialStore>,
    clients: Arc<dyn ClientRegistry>,
    tokens: Arc<dyn TokenStore>,
    config: OAuth2Config,
}

impl GrantProcessor {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        clients: Arc<dyn ClientRegistry>,
        tokens: Arc<dyn TokenStore>,
        config: OAuth2Config,
    ) -> Self {
        Self {
            credentials,
            clients,
            tokens,
            config,
        }
    }

    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    fn issue_options(&self, client: &Client) -> IssueOptions {
        IssueOptions {
            access_ttl: self.config.access_token_ttl(),
            refresh_ttl: self.config.refresh_token_ttl(),
            issue_refresh: client.is_grant_type_allowed(GrantType::RefreshToken),
        }
    }

    /// Handle one token request.
    #[tracing::instrument(
        skip_all,
        fields(
            grant_type = request.grant_type.as_deref().unwrap_or(""),
            client_id = request.client.as_ref().map(|c| c.client_id.as_str()).unwrap_or("")
        )
    )]
    pub async fn process(&self, request: &TokenRequest) -> Result<IssuedTokens, GrantError> {
        let mut stage = GrantStage::ReceivedRequest;
        let result = self.run(request, &mut stage).await;
        match &result {
            Ok(_) => tracing::info!(stage = %stage, "Token issued"),
            Err(e) if e.is_retryable() => {
                tracing::error!(stage = %stage, error = %e, "Token request failed")
            }
            Err(e) => tracing::warn!(stage = %stage, error = %e, "Token request rejected"),
        }
        result
    }

    async fn run(
        &self,
        request: &TokenRequest,
        stage: &mut GrantStage,
    ) -> Result<IssuedTokens, GrantError> {
        let raw_grant_type = required(&request.grant_type, "grant_type")?;
        let credentials = request.client.as_ref().ok_or(GrantError::InvalidClient)?;
        let client = self
            .clients
            .authenticate_client(&credentials.client_id, &credentials.client_secret)
            .await?;
        *stage = GrantStage::ClientAuthenticated;

        let grant_type: GrantType = raw_grant_type
            .parse()
            .map_err(GrantError::UnsupportedGrantType)?;
        self.clients.authorize_grant(&client, grant_type)?;

        let issued = match grant_type {
            GrantType::Password => self.password_grant(&client, request, stage).await?,
            GrantType::AuthorizationCode => self.code_grant(&client, request, stage).await?,
            GrantType::RefreshToken => self.refresh_grant(&client, request, stage).await?,
            GrantType::ClientCredentials => {
                return Err(GrantError::UnsupportedGrantType(grant_type.to_string()));
            }
        };
        *stage = GrantStage::TokenIssued;
        Ok(issued)
    }

    async fn password_grant(
        &self,
        client: &Client,
        request: &TokenRequest,
        stage: &mut GrantStage,
    ) -> Result<IssuedTokens, GrantError> {
        let username = required(&request.username, "username")?;
        let password = required(&request.password, "password")?;
        let account = self.credentials.authenticate(username, password).await?;
        *stage = GrantStage::OwnerAuthenticated;

        let scopes = self
            .clients
            .authorize_scopes(client, &Scopes::parse(request.scope.as_deref()))?;
        let grant = TokenGrant::new(client, &account, scopes);
        Ok(self
            .tokens
            .issue_tokens(&grant, self.issue_options(client))
            .await?)
    }

    async fn code_grant(
        &self,
        client: &Client,
        request: &TokenRequest,
        stage: &mut GrantStage,
    ) -> Result<IssuedTokens, GrantError> {
        let code = required(&request.code, "code")?;
        let exchange = CodeExchange {
            client_id: client.client_id.clone(),
            redirect_uri: request.redirect_uri.clone(),
            code_verifier: request.code_verifier.clone(),
            options: self.issue_options(client),
        };
        let issued = self
            .tokens
            .exchange_authorization_code(code, &exchange)
            .await?;
        *stage = GrantStage::CodeConsumed;

        // The owner may have been disabled or removed since the code was issued.
        let account = self.credentials.find_account(&issued.access.account_name).await;
        match account {
            Ok(Some(account)) if account.enabled => Ok(issued),
            other => {
                self.discard(&issued).await;
                match other {
                    Err(e) => Err(e.into()),
                    _ => Err(InvalidGrantReason::AccountUnavailable.into()),
                }
            }
        }
    }

    /// Revoke a pair that must not reach the caller.
    async fn discard(&self, issued: &IssuedTokens) {
        let values = issued
            .refresh
            .iter()
            .chain(std::iter::once(&issued.access))
            .map(|t| t.value.as_str());
        for value in values {
            if let Err(e) = self.tokens.revoke(value).await {
                tracing::error!(error = %e, "Failed to revoke discarded token");
            }
        }
    }

    async fn refresh_grant(
        &self,
        client: &Client,
        request: &TokenRequest,
        stage: &mut GrantStage,
    ) -> Result<IssuedTokens, GrantError> {
        let value = required(&request.refresh_token, "refresh_token")?;
        let refresh = self.tokens.resolve(value).await.map_err(|e| match e {
            TokenError::NotFound => {
                GrantError::InvalidGrant(InvalidGrantReason::RefreshTokenNotFound)
            }
            TokenError::Expired => GrantError::InvalidGrant(InvalidGrantReason::RefreshTokenExpired),
            TokenError::Store(e) => GrantError::Unavailable(e),
        })?;
        if refresh.kind != TokenKind::Refresh {
            return Err(InvalidGrantReason::NotARefreshToken.into());
        }
        if refresh.client_id != client.client_id {
            return Err(InvalidGrantReason::RefreshTokenClientMismatch.into());
        }

        let requested = Scopes::parse(request.scope.as_deref());
        let scopes = if requested.is_empty() {
            refresh.scopes.clone()
        } else if let Some(outside) = requested.first_outside(&refresh.scopes) {
            return Err(GrantError::InvalidScope(outside.to_string()));
        } else {
            requested
        };

        let account = self
            .credentials
            .find_account(&refresh.account_name)
            .await?
            .filter(|a| a.enabled)
            .ok_or(InvalidGrantReason::AccountUnavailable)?;
        *stage = GrantStage::RefreshValidated;

        let access_grant = TokenGrant::new(client, &account, scopes);
        let options = self.issue_options(client);
        if !self.config.reuse_refresh_tokens {
            return self
                .tokens
                .rotate_refresh_token(&refresh.value, &access_grant, options)
                .await;
        }
        let access = self
            .tokens
            .issue_access_token(&access_grant, options.access_ttl, Some(&refresh.value))
            .await
            .map_err(|e| match e {
                TokenError::Store(e) => GrantError::Unavailable(e),
                _ => GrantError::InvalidGrant(InvalidGrantReason::RefreshTokenNotFound),
            })?;
        Ok(IssuedTokens {
            access,
            refresh: Some(refresh),
        })
    }

    /// Verify the resource owner on the authorization endpoint.
    pub async fn authenticate_owner(
        &self,
        account_name: &str,
        password: &str,
    ) -> Result<Account, GrantError> {
        Ok(self.credentials.authenticate(account_name, password).await?)
    }

    /// Checks that must pass before the redirect URI can be trusted.
    pub async fn validate_authorize_request(
        &self,
        request: &AuthorizeRequest,
    ) -> Result<AuthorizeTarget, GrantError> {
        let client_id = required(&request.client_id, "client_id")?;
        let client = self
            .clients
            .find_client(client_id)
            .await?
            .ok_or(GrantError::InvalidClient)?;
        let redirect_uri = client
            .resolve_redirect_uri(request.redirect_uri.as_deref())
            .ok_or_else(|| GrantError::InvalidRequest("Invalid redirect_uri".to_string()))?;
        let redirect_uri = Url::parse(&redirect_uri)
            .map_err(|_| GrantError::InvalidRequest("Invalid redirect_uri".to_string()))?;
        Ok(AuthorizeTarget {
            client,
            redirect_uri,
        })
    }

    /// Issue an authorization code for an approved request.
    #[tracing::instrument(
        skip_all,
        fields(client_id = %target.client.client_id, account = %account.account_name)
    )]
    pub async fn issue_code(
        &self,
        target: &AuthorizeTarget,
        request: &AuthorizeRequest,
        account: &Account,
    ) -> Result<AuthorizationCode, GrantError> {
        if request.response_type.as_deref() != Some("code") {
            return Err(GrantError::InvalidRequest(
                "Unsupported response_type".to_string(),
            ));
        }
        let client = &target.client;
        self.clients
            .authorize_grant(client, GrantType::AuthorizationCode)?;
        let scopes = self
            .clients
            .authorize_scopes(client, &Scopes::parse(request.scope.as_deref()))?;

        let code_challenge_method = match (&request.code_challenge, &request.code_challenge_method)
        {
            (Some(_), Some(method)) => Some(method.parse::<PkceMethod>().map_err(|m| {
                GrantError::InvalidRequest(format!("Unsupported code_challenge_method {m}"))
            })?),
            (Some(_), None) => Some(PkceMethod::Plain),
            (None, Some(_)) => {
                return Err(GrantError::InvalidRequest(
                    "code_challenge_method without code_challenge".to_string(),
                ));
            }
            (None, None) => None,
        };

        let code = AuthorizationCode {
            code: generate_token().map_err(StoreError::from)?,
            client_id: client.client_id.clone(),
            account_name: account.account_name.clone(),
            authorities: account.authorities.clone(),
            scopes,
            redirect_uri: request.redirect_uri.clone(),
            code_challenge: request.code_challenge.clone(),
            code_challenge_method,
            expires_at: expires_after(
                OffsetDateTime::now_utc(),
                self.config.authorization_code_ttl(),
            )?,
        };
        self.tokens.save_authorization_code(code.clone()).await?;
        tracing::info!("Authorization code issued");
        Ok(code)
    }

    /// Validate an authorization request and issue its code in one go.
    pub async fn authorize(
        &self,
        request: &AuthorizeRequest,
        account: &Account,
    ) -> Result<AuthorizationCode, GrantError> {
        let target = self.validate_authorize_request(request).await?;
        self.issue_code(&target, request, account).await
    }
}
