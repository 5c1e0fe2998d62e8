//! OAuth2 Authorization Server module.
//!
//! ## Supported Flows
//!
//! - Resource owner password credentials
//! - Authorization Code with optional PKCE
//! - Refresh Token
//!
//! ## Endpoints
//!
//! - `GET /oauth/authorize` - Authorization endpoint
//! - `POST /oauth/token` - Token endpoint
//! - `POST /oauth/check_token` - Token introspection
//! - `POST /oauth/revoke` - Token revocation

pub mod credentials;
pub mod endpoints;
pub mod grant;
pub mod password;
pub mod registrar;
pub mod scope;
mod state;
pub mod token_store;
pub mod types;
pub mod validator;

pub use credentials::{CredentialStore, DbCredentialStore, InMemoryCredentialStore};
pub use endpoints::router;
pub use grant::{GrantProcessor, GrantStage, TokenRequest};
pub use password::{generate_token, hash_password, verify_password};
pub use registrar::{ClientRegistry, DbClientRegistry, InMemoryClientRegistry};
pub use scope::Scopes;
pub use state::OAuth2State;
pub use token_store::{InMemoryTokenStore, TokenStore, spawn_sweep_task};
pub use types::{
    Account, AuthorizationCode, Client, GrantType, IssueOptions, IssuedTokens, Token, TokenGrant,
    TokenKind,
};
pub use validator::{TokenValidator, ValidatedToken};

/// OpenAPI tag for OAuth2 endpoints
pub const OAUTH2_TAG: &str = "OAuth2";
