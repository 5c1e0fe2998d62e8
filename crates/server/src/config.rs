use crate::oauth2::password::hash_password;
use crate::oauth2::scope::Scopes;
use crate::oauth2::types::{Account, Client, GrantType};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Who may call the token introspection endpoint.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckTokenAccess {
    DenyAll,
    #[default]
    ClientAuthenticated,
    /// Anyone holding a token value can introspect it. Insecure.
    PermitAll,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OAuth2Config {
    /// Access token lifetime in seconds
    #[serde(default = "default_access_token_lifetime")]
    pub access_token_lifetime: i64,
    /// Refresh token lifetime in seconds; absent means refresh tokens never expire
    #[serde(default)]
    pub refresh_token_lifetime: Option<i64>,
    /// Authorization code lifetime in seconds
    #[serde(default = "default_authorization_code_lifetime")]
    pub authorization_code_lifetime: i64,
    /// When false every refresh retires the presented refresh token and issues a new one
    #[serde(default = "default_true")]
    pub reuse_refresh_tokens: bool,
    /// Seconds between expired-token sweeps; 0 disables the sweep
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: u64,
    #[serde(default)]
    pub check_token_access: CheckTokenAccess,
}

impl Default for OAuth2Config {
    fn default() -> Self {
        Self {
            access_token_lifetime: default_access_token_lifetime(),
            refresh_token_lifetime: None,
            authorization_code_lifetime: default_authorization_code_lifetime(),
            reuse_refresh_tokens: true,
            sweep_interval: default_sweep_interval(),
            check_token_access: CheckTokenAccess::default(),
        }
    }
}

impl OAuth2Config {
    pub fn access_token_ttl(&self) -> time::Duration {
        time::Duration::seconds(self.access_token_lifetime)
    }

    pub fn refresh_token_ttl(&self) -> Option<time::Duration> {
        self.refresh_token_lifetime.map(time::Duration::seconds)
    }

    pub fn authorization_code_ttl(&self) -> time::Duration {
        time::Duration::seconds(self.authorization_code_lifetime)
    }
}

fn default_access_token_lifetime() -> i64 {
    43200 // 12 hours
}

fn default_authorization_code_lifetime() -> i64 {
    300
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

/// A client registered through the configuration file.
#[derive(Clone, Debug, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    /// Plain-text secret, hashed when the registry is built
    #[serde(default)]
    pub secret: Option<String>,
    /// Argon2 PHC hash of the secret
    #[serde(default)]
    pub secret_hash: Option<String>,
    pub grant_types: Vec<GrantType>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ClientConfig {
    pub fn to_client(&self) -> Result<Client, ConfigError> {
        let secret_hash = match (&self.secret_hash, &self.secret) {
            (Some(hash), _) => hash.clone(),
            (None, Some(secret)) => hash_password(secret).map_err(|e| {
                ConfigError::Validation(format!("client {}: {e}", self.client_id))
            })?,
            (None, None) => {
                return Err(ConfigError::Validation(format!(
                    "client {} needs a secret or secret_hash",
                    self.client_id
                )));
            }
        };
        Ok(Client {
            client_id: self.client_id.clone(),
            secret_hash,
            grant_types: self.grant_types.iter().copied().collect(),
            scopes: Scopes::from_iter(self.scopes.iter().cloned()),
            redirect_uris: self.redirect_uris.clone(),
        })
    }
}

/// An account seeded through the configuration file.
#[derive(Clone, Debug, Deserialize)]
pub struct AccountConfig {
    pub account_name: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_authorities")]
    pub authorities: Vec<String>,
}

fn default_authorities() -> Vec<String> {
    vec!["ROLE_USER".to_string(), "ROLE_ADMIN".to_string()]
}

impl AccountConfig {
    pub fn to_account(&self) -> Result<Account, ConfigError> {
        let password_hash = match (&self.password_hash, &self.password) {
            (Some(hash), _) => hash.clone(),
            (None, Some(password)) => hash_password(password).map_err(|e| {
                ConfigError::Validation(format!("account {}: {e}", self.account_name))
            })?,
            (None, None) => {
                return Err(ConfigError::Validation(format!(
                    "account {} needs a password or password_hash",
                    self.account_name
                )));
            }
        };
        Ok(Account {
            account_name: self.account_name.clone(),
            password_hash,
            enabled: self.enabled,
            authorities: self.authorities.iter().cloned().collect::<BTreeSet<_>>(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// When set, accounts and clients are read from this database instead of
    /// the `accounts` and `clients` sections.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub oauth2: OAuth2Config,
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8002".to_string()
}

/// Upper bound for every configured lifetime: ten years.
pub const MAX_LIFETIME_SECS: i64 = 10 * 365 * 86400;

fn check_lifetime(key: &str, secs: i64) -> Result<(), ConfigError> {
    if secs <= 0 || secs > MAX_LIFETIME_SECS {
        return Err(ConfigError::Validation(format!(
            "oauth2.{key} must be between 1 and {MAX_LIFETIME_SECS} seconds"
        )));
    }
    Ok(())
}

impl AppConfig {
    /// Semantic checks the deserializer cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_lifetime("access_token_lifetime", self.oauth2.access_token_lifetime)?;
        if let Some(secs) = self.oauth2.refresh_token_lifetime {
            check_lifetime("refresh_token_lifetime", secs)?;
        }
        check_lifetime(
            "authorization_code_lifetime",
            self.oauth2.authorization_code_lifetime,
        )?;

        let mut client_ids = HashSet::new();
        for client in &self.clients {
            if !client_ids.insert(client.client_id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate client_id {}",
                    client.client_id
                )));
            }
            if client.secret.is_none() && client.secret_hash.is_none() {
                return Err(ConfigError::Validation(format!(
                    "client {} needs a secret or secret_hash",
                    client.client_id
                )));
            }
            if client.grant_types.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "client {} has no grant types",
                    client.client_id
                )));
            }
        }

        let mut account_names = HashSet::new();
        for account in &self.accounts {
            if !account_names.insert(account.account_name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate account_name {}",
                    account.account_name
                )));
            }
        }

        Ok(())
    }
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// Any environment variable matching the key path separated by double
/// underscores (e.g. `OAUTH2__ACCESS_TOKEN_LIFETIME`) overrides the file value.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from("config.yaml")
}

pub fn load_config_from(path: &str) -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Convenience helper for binaries wanting panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
