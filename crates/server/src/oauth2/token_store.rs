//! Issued tokens and pending authorization codes.
//!
//! Everything here lives in memory. Each operation that has to be atomic
//! (consuming a code, rotating a refresh token) runs without an `.await`
//! between its check and its effect, so a cancelled request can never leave
//! a code consumed without tokens or tokens minted from a reused code.

use crate::error::{GrantError, InvalidGrantReason, StoreError, TokenError};
use crate::oauth2::password::generate_token;
use crate::oauth2::types::{
    AuthorizationCode, CodeExchange, IssueOptions, IssuedTokens, Token, TokenGrant, TokenKind,
    expires_after,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Mint an access token. With `parent_refresh_token` set, the token dies
    /// together with that refresh token.
    async fn issue_access_token(
        &self,
        grant: &TokenGrant,
        ttl: time::Duration,
        parent_refresh_token: Option<&str>,
    ) -> Result<Token, TokenError>;

    async fn issue_refresh_token(
        &self,
        grant: &TokenGrant,
        ttl: Option<time::Duration>,
    ) -> Result<Token, StoreError>;

    /// Mint an access token and, if requested, its refresh token as one unit.
    async fn issue_tokens(
        &self,
        grant: &TokenGrant,
        options: IssueOptions,
    ) -> Result<IssuedTokens, StoreError>;

    /// Look a token up. Expired tokens are dropped on the way out.
    async fn resolve(&self, value: &str) -> Result<Token, TokenError>;

    /// Forget a token. Unknown values are ignored.
    async fn revoke(&self, value: &str) -> Result<(), StoreError>;

    async fn save_authorization_code(&self, code: AuthorizationCode) -> Result<(), StoreError>;

    /// Consume a code and mint the tokens it stands for.
    ///
    /// The code is gone after this call whatever the outcome.
    async fn exchange_authorization_code(
        &self,
        code: &str,
        exchange: &CodeExchange,
    ) -> Result<IssuedTokens, GrantError>;

    /// Retire a refresh token and mint a fresh pair in its place.
    async fn rotate_refresh_token(
        &self,
        value: &str,
        access_grant: &TokenGrant,
        options: IssueOptions,
    ) -> Result<IssuedTokens, GrantError>;

    /// Drop every expired token and code. Returns how many were removed.
    async fn sweep_expired(&self) -> Result<usize, StoreError>;
}

#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: DashMap<String, Token>,
    codes: DashMap<String, AuthorizationCode>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn code_count(&self) -> usize {
        self.codes.len()
    }

    /// Insert a token under a fresh random value, retrying on collision.
    fn mint(
        &self,
        kind: TokenKind,
        grant: &TokenGrant,
        ttl: Option<time::Duration>,
        parent_refresh_token: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Token, StoreError> {
        let expires_at = ttl.map(|ttl| expires_after(now, ttl)).transpose()?;
        loop {
            let value = generate_token()?;
            if let Entry::Vacant(slot) = self.tokens.entry(value.clone()) {
                let token = Token {
                    value,
                    kind,
                    client_id: grant.client_id.clone(),
                    account_name: grant.account_name.clone(),
                    authorities: grant.authorities.clone(),
                    scopes: grant.scopes.clone(),
                    issued_at: now,
                    expires_at,
                    parent_refresh_token: parent_refresh_token.map(String::from),
                };
                slot.insert(token.clone());
                return Ok(token);
            }
            tracing::warn!("Token value collision, regenerating");
        }
    }

    fn mint_tokens(
        &self,
        access_grant: &TokenGrant,
        refresh_grant: &TokenGrant,
        options: IssueOptions,
        now: OffsetDateTime,
    ) -> Result<IssuedTokens, StoreError> {
        let refresh = if options.issue_refresh {
            Some(self.mint(
                TokenKind::Refresh,
                refresh_grant,
                options.refresh_ttl,
                None,
                now,
            )?)
        } else {
            None
        };
        let access = self.mint(
            TokenKind::Access,
            access_grant,
            Some(options.access_ttl),
            refresh.as_ref().map(|r| r.value.as_str()),
            now,
        );
        match access {
            Ok(access) => Ok(IssuedTokens { access, refresh }),
            Err(e) => {
                if let Some(refresh) = refresh {
                    self.tokens.remove(&refresh.value);
                }
                Err(e)
            }
        }
    }

    fn revoke_children(&self, refresh_value: &str) {
        self.tokens
            .retain(|_, t| t.parent_refresh_token.as_deref() != Some(refresh_value));
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn issue_access_token(
        &self,
        grant: &TokenGrant,
        ttl: time::Duration,
        parent_refresh_token: Option<&str>,
    ) -> Result<Token, TokenError> {
        let now = OffsetDateTime::now_utc();
        let token = self.mint(TokenKind::Access, grant, Some(ttl), parent_refresh_token, now)?;
        // A concurrent revoke of the parent may already have swept its
        // children; do not let this token outlive it.
        if let Some(parent) = parent_refresh_token
            && !self.tokens.contains_key(parent)
        {
            self.tokens.remove(&token.value);
            return Err(TokenError::NotFound);
        }
        Ok(token)
    }

    async fn issue_refresh_token(
        &self,
        grant: &TokenGrant,
        ttl: Option<time::Duration>,
    ) -> Result<Token, StoreError> {
        self.mint(TokenKind::Refresh, grant, ttl, None, OffsetDateTime::now_utc())
    }

    async fn issue_tokens(
        &self,
        grant: &TokenGrant,
        options: IssueOptions,
    ) -> Result<IssuedTokens, StoreError> {
        self.mint_tokens(grant, grant, options, OffsetDateTime::now_utc())
    }

    async fn resolve(&self, value: &str) -> Result<Token, TokenError> {
        let now = OffsetDateTime::now_utc();
        let token = self
            .tokens
            .get(value)
            .map(|t| t.value().clone())
            .ok_or(TokenError::NotFound)?;
        if token.is_expired(now) {
            self.tokens.remove_if(value, |_, t| t.is_expired(now));
            if token.kind == TokenKind::Refresh {
                self.revoke_children(value);
            }
            return Err(TokenError::Expired);
        }
        Ok(token)
    }

    async fn revoke(&self, value: &str) -> Result<(), StoreError> {
        if let Some((_, token)) = self.tokens.remove(value)
            && token.kind == TokenKind::Refresh
        {
            self.revoke_children(value);
        }
        Ok(())
    }

    async fn save_authorization_code(&self, code: AuthorizationCode) -> Result<(), StoreError> {
        match self.codes.entry(code.code.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(code);
                Ok(())
            }
            Entry::Occupied(_) => Err(StoreError::Unavailable(
                "authorization code already exists".to_string(),
            )),
        }
    }

    async fn exchange_authorization_code(
        &self,
        code: &str,
        exchange: &CodeExchange,
    ) -> Result<IssuedTokens, GrantError> {
        let now = OffsetDateTime::now_utc();
        let (_, code) = self
            .codes
            .remove(code)
            .ok_or(InvalidGrantReason::CodeNotFound)?;
        code.check_exchange(exchange, now)?;
        let grant = code.token_grant();
        Ok(self.mint_tokens(&grant, &grant, exchange.options, now)?)
    }

    async fn rotate_refresh_token(
        &self,
        value: &str,
        access_grant: &TokenGrant,
        options: IssueOptions,
    ) -> Result<IssuedTokens, GrantError> {
        let now = OffsetDateTime::now_utc();
        let (_, old) = self
            .tokens
            .remove_if(value, |_, t| {
                t.kind == TokenKind::Refresh && t.client_id == access_grant.client_id
            })
            .ok_or(InvalidGrantReason::RefreshTokenNotFound)?;
        self.revoke_children(value);
        if old.is_expired(now) {
            return Err(InvalidGrantReason::RefreshTokenExpired.into());
        }
        let refresh_grant = TokenGrant {
            scopes: old.scopes,
            ..access_grant.clone()
        };
        let options = IssueOptions {
            issue_refresh: true,
            ..options
        };
        Ok(self.mint_tokens(access_grant, &refresh_grant, options, now)?)
    }

    async fn sweep_expired(&self) -> Result<usize, StoreError> {
        let now = OffsetDateTime::now_utc();
        let mut expired_refresh = HashSet::new();
        let mut removed = 0;
        self.tokens.retain(|value, t| {
            if !t.is_expired(now) {
                return true;
            }
            if t.kind == TokenKind::Refresh {
                expired_refresh.insert(value.clone());
            }
            removed += 1;
            false
        });
        if !expired_refresh.is_empty() {
            self.tokens.retain(|_, t| {
                let orphaned = t
                    .parent_refresh_token
                    .as_ref()
                    .is_some_and(|parent| expired_refresh.contains(parent));
                if orphaned {
                    removed += 1;
                }
                !orphaned
            });
        }
        self.codes.retain(|_, c| {
            let keep = !c.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}

/// Spawn a background task that periodically drops expired tokens and codes.
#[tracing::instrument(skip(store))]
pub fn spawn_sweep_task(store: Arc<dyn TokenStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match store.sweep_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Swept expired tokens"),
                Err(e) => tracing::warn!(error = %e, "Token sweep failed"),
            }
        }
    })
}
