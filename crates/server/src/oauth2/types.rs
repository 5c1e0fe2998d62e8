//! Core records of the authorization server: accounts, clients,
//! authorization codes and tokens.

use crate::error::{ClientError, InvalidGrantReason, StoreError};
use crate::oauth2::scope::Scopes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

// ---------------------------------------------------------------------------
// Grant types
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    Password,
    AuthorizationCode,
    RefreshToken,
    ClientCredentials,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::Password => "password",
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::RefreshToken => "refresh_token",
            GrantType::ClientCredentials => "client_credentials",
        }
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(GrantType::Password),
            "authorization_code" => Ok(GrantType::AuthorizationCode),
            "refresh_token" => Ok(GrantType::RefreshToken),
            "client_credentials" => Ok(GrantType::ClientCredentials),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Accounts and clients
// ---------------------------------------------------------------------------

/// A resource owner. Administered outside the server; read-only here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub account_name: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub enabled: bool,
    pub authorities: BTreeSet<String>,
}

/// A registered OAuth2 client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Client {
    pub client_id: String,
    /// Argon2 PHC string
    pub secret_hash: String,
    pub grant_types: BTreeSet<GrantType>,
    pub scopes: Scopes,
    pub redirect_uris: Vec<String>,
}

impl Client {
    pub fn is_grant_type_allowed(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains(&grant_type)
    }

    pub fn authorize_grant(&self, grant_type: GrantType) -> Result<(), ClientError> {
        if self.is_grant_type_allowed(grant_type) {
            Ok(())
        } else {
            Err(ClientError::UnauthorizedGrantType(grant_type.to_string()))
        }
    }

    /// Grant `requested ∩ allowed`. Unknown scopes are rejected rather than
    /// dropped; an empty request grants every allowed scope.
    pub fn authorize_scopes(&self, requested: &Scopes) -> Result<Scopes, ClientError> {
        if requested.is_empty() {
            return Ok(self.scopes.clone());
        }
        if let Some(unknown) = requested.first_outside(&self.scopes) {
            return Err(ClientError::InvalidScope(unknown.to_string()));
        }
        Ok(requested.intersection(&self.scopes))
    }

    /// Pick the redirect URI for an authorization request.
    ///
    /// Requested URIs must match a registered one exactly; without a request
    /// the single registered URI is used. A client with no registered URI
    /// cannot use the authorization endpoint.
    pub fn resolve_redirect_uri(&self, requested: Option<&str>) -> Option<String> {
        match requested {
            Some(uri) => self
                .redirect_uris
                .iter()
                .find(|allowed| allowed.as_str() == uri)
                .cloned(),
            None if self.redirect_uris.len() == 1 => self.redirect_uris.first().cloned(),
            None => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Authorization codes
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceMethod {
    S256,
    Plain,
}

impl FromStr for PkceMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S256" => Ok(PkceMethod::S256),
            "plain" => Ok(PkceMethod::Plain),
            other => Err(other.to_string()),
        }
    }
}

/// Single-use code handed to the client after the resource owner approved it.
#[derive(Clone, Debug)]
pub struct AuthorizationCode {
    pub code: String,
    pub client_id: String,
    pub account_name: String,
    pub authorities: BTreeSet<String>,
    pub scopes: Scopes,
    /// Set when the authorization request named a redirect URI explicitly;
    /// the token request must then repeat it.
    pub redirect_uri: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<PkceMethod>,
    pub expires_at: OffsetDateTime,
}

impl AuthorizationCode {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    /// Verify a PKCE code verifier against the stored challenge.
    pub fn verify_pkce(&self, code_verifier: &str) -> bool {
        match (&self.code_challenge, self.code_challenge_method) {
            (Some(challenge), Some(PkceMethod::S256)) => {
                use base64::Engine;
                use sha2::{Digest, Sha256};
                let hash = Sha256::digest(code_verifier.as_bytes());
                base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hash) == *challenge
            }
            (Some(challenge), Some(PkceMethod::Plain)) => code_verifier == challenge,
            (None, None) => true,
            _ => false,
        }
    }

    /// Check this code against the token request redeeming it.
    pub fn check_exchange(
        &self,
        exchange: &CodeExchange,
        now: OffsetDateTime,
    ) -> Result<(), InvalidGrantReason> {
        if self.client_id != exchange.client_id {
            return Err(InvalidGrantReason::CodeClientMismatch);
        }
        if self.is_expired(now) {
            return Err(InvalidGrantReason::CodeExpired);
        }
        if let Some(expected) = &self.redirect_uri
            && exchange.redirect_uri.as_deref() != Some(expected.as_str())
        {
            return Err(InvalidGrantReason::RedirectUriMismatch);
        }
        if self.code_challenge.is_some() {
            match exchange.code_verifier.as_deref() {
                Some(verifier) if self.verify_pkce(verifier) => {}
                _ => return Err(InvalidGrantReason::PkceVerificationFailed),
            }
        }
        Ok(())
    }

    pub fn token_grant(&self) -> TokenGrant {
        TokenGrant {
            client_id: self.client_id.clone(),
            account_name: self.account_name.clone(),
            authorities: self.authorities.clone(),
            scopes: self.scopes.clone(),
        }
    }
}

/// Parameters of a token request redeeming an authorization code.
#[derive(Clone, Debug)]
pub struct CodeExchange {
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
    pub options: IssueOptions,
}

/// Lifetimes of the tokens minted by one grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IssueOptions {
    pub access_ttl: time::Duration,
    /// `None` mints a non-expiring refresh token
    pub refresh_ttl: Option<time::Duration>,
    /// Clients not allowed the refresh_token grant get no refresh token
    pub issue_refresh: bool,
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// `now + ttl`, refusing lifetimes that overflow the calendar.
pub fn expires_after(
    now: OffsetDateTime,
    ttl: time::Duration,
) -> Result<OffsetDateTime, StoreError> {
    now.checked_add(ttl)
        .ok_or(StoreError::LifetimeOutOfRange(ttl))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Who a token is issued to and what it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
    pub client_id: String,
    pub account_name: String,
    pub authorities: BTreeSet<String>,
    pub scopes: Scopes,
}

impl TokenGrant {
    pub fn new(client: &Client, account: &Account, scopes: Scopes) -> Self {
        Self {
            client_id: client.client_id.clone(),
            account_name: account.account_name.clone(),
            authorities: account.authorities.clone(),
            scopes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
    pub client_id: String,
    pub account_name: String,
    pub authorities: BTreeSet<String>,
    pub scopes: Scopes,
    pub issued_at: OffsetDateTime,
    /// `None` only for non-expiring refresh tokens
    pub expires_at: Option<OffsetDateTime>,
    /// Refresh token an access token was minted from
    pub parent_refresh_token: Option<String>,
}

impl Token {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Seconds until expiry, clamped at zero.
    pub fn expires_in(&self, now: OffsetDateTime) -> Option<i64> {
        self.expires_at
            .map(|expires_at| (expires_at - now).whole_seconds().max(0))
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    pub fn grant(&self) -> TokenGrant {
        TokenGrant {
            client_id: self.client_id.clone(),
            account_name: self.account_name.clone(),
            authorities: self.authorities.clone(),
            scopes: self.scopes.clone(),
        }
    }
}

/// Result of a successful grant.
#[derive(Clone, Debug)]
pub struct IssuedTokens {
    pub access: Token,
    pub refresh: Option<Token>,
}
