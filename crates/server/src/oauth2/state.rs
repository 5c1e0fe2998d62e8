//! OAuth2 state management.
//!
//! [`OAuth2State`] is built once at startup and shared by every handler.

use crate::config::{AppConfig, CheckTokenAccess, ConfigError, OAuth2Config};
use crate::oauth2::credentials::{CredentialStore, DbCredentialStore, InMemoryCredentialStore};
use crate::oauth2::grant::GrantProcessor;
use crate::oauth2::registrar::{ClientRegistry, DbClientRegistry, InMemoryClientRegistry};
use crate::oauth2::token_store::{InMemoryTokenStore, TokenStore};
use crate::oauth2::validator::TokenValidator;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// OAuth2 state containing all components needed for the authorization server.
#[derive(Clone)]
pub struct OAuth2State {
    pub grants: Arc<GrantProcessor>,
    pub validator: TokenValidator,
    pub clients: Arc<dyn ClientRegistry>,
    pub tokens: Arc<dyn TokenStore>,
    pub check_token_access: CheckTokenAccess,
}

impl OAuth2State {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        clients: Arc<dyn ClientRegistry>,
        tokens: Arc<dyn TokenStore>,
        config: OAuth2Config,
    ) -> Self {
        let check_token_access = config.check_token_access;
        Self {
            grants: Arc::new(GrantProcessor::new(
                credentials,
                clients.clone(),
                tokens.clone(),
                config,
            )),
            validator: TokenValidator::new(tokens.clone()),
            clients,
            tokens,
            check_token_access,
        }
    }

    /// Wire the stores described by the configuration.
    ///
    /// With a database connection, accounts and clients are read from it and
    /// the `accounts`/`clients` sections are ignored.
    pub fn from_config(
        config: &AppConfig,
        db: Option<Arc<DatabaseConnection>>,
    ) -> Result<Self, ConfigError> {
        let (credentials, clients): (Arc<dyn CredentialStore>, Arc<dyn ClientRegistry>) = match db
        {
            Some(db) => {
                tracing::info!("Reading accounts and clients from the database");
                (
                    Arc::new(DbCredentialStore::new(db.clone())),
                    Arc::new(DbClientRegistry::new(db)),
                )
            }
            None => {
                let accounts = config
                    .accounts
                    .iter()
                    .map(|a| a.to_account())
                    .collect::<Result<Vec<_>, _>>()?;
                let registered = config
                    .clients
                    .iter()
                    .map(|c| c.to_client())
                    .collect::<Result<Vec<_>, _>>()?;
                tracing::info!(
                    accounts = accounts.len(),
                    clients = registered.len(),
                    "Loaded accounts and clients from configuration"
                );
                (
                    Arc::new(InMemoryCredentialStore::new(accounts)),
                    Arc::new(InMemoryClientRegistry::new(registered)),
                )
            }
        };
        Ok(Self::new(
            credentials,
            clients,
            Arc::new(InMemoryTokenStore::new()),
            config.oauth2.clone(),
        ))
    }
}
