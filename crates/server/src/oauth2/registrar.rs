//! OAuth2 client registry.
//!
//! Clients are either loaded from configuration into memory or read from
//! the `oauth2_client` table.

use crate::entity::oauth2_client;
use crate::error::{ClientError, StoreError};
use crate::oauth2::password::{verify_against_dummy, verify_password};
use crate::oauth2::scope::Scopes;
use crate::oauth2::types::{Client, GrantType};
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait ClientRegistry: Send + Sync {
    async fn find_client(&self, client_id: &str) -> Result<Option<Client>, StoreError>;

    /// Authenticate a confidential client by id and secret.
    async fn authenticate_client(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Client, ClientError> {
        let Some(client) = self.find_client(client_id).await? else {
            verify_against_dummy(client_secret);
            return Err(ClientError::InvalidClient);
        };
        if !verify_password(client_secret, &client.secret_hash) {
            return Err(ClientError::InvalidClient);
        }
        Ok(client)
    }

    fn authorize_grant(&self, client: &Client, grant_type: GrantType) -> Result<(), ClientError> {
        client.authorize_grant(grant_type)
    }

    fn authorize_scopes(&self, client: &Client, requested: &Scopes) -> Result<Scopes, ClientError> {
        client.authorize_scopes(requested)
    }
}

/// Fixed client list held for the lifetime of the server.
#[derive(Default)]
pub struct InMemoryClientRegistry {
    clients: HashMap<String, Client>,
}

impl InMemoryClientRegistry {
    pub fn new(clients: impl IntoIterator<Item = Client>) -> Self {
        Self {
            clients: clients
                .into_iter()
                .map(|c| (c.client_id.clone(), c))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl ClientRegistry for InMemoryClientRegistry {
    async fn find_client(&self, client_id: &str) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.get(client_id).cloned())
    }
}

/// Database-backed client registry.
#[derive(Clone)]
pub struct DbClientRegistry {
    db: Arc<DatabaseConnection>,
}

impl DbClientRegistry {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClientRegistry for DbClientRegistry {
    #[tracing::instrument(skip(self))]
    async fn find_client(&self, client_id: &str) -> Result<Option<Client>, StoreError> {
        let model = oauth2_client::Entity::find_by_id(client_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| {
                tracing::error!("Database error looking up client: {}", e);
                StoreError::from(e)
            })?;
        model.map(oauth2_client::Model::into_client).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth2::password::hash_password;

    fn registry() -> InMemoryClientRegistry {
        InMemoryClientRegistry::new([Client {
            client_id: "acme".to_string(),
            secret_hash: hash_password("acmesecret").unwrap(),
            grant_types: [
                GrantType::Password,
                GrantType::AuthorizationCode,
                GrantType::RefreshToken,
            ]
            .into_iter()
            .collect(),
            scopes: Scopes::parse(Some("read")),
            redirect_uris: vec![],
        }])
    }

    #[tokio::test]
    async fn test_authenticates_with_correct_secret() {
        let client = registry()
            .authenticate_client("acme", "acmesecret")
            .await
            .unwrap();
        assert_eq!(client.client_id, "acme");
    }

    #[tokio::test]
    async fn test_rejects_unknown_client_and_bad_secret() {
        let registry = registry();
        assert!(matches!(
            registry.authenticate_client("acme", "nope").await,
            Err(ClientError::InvalidClient)
        ));
        assert!(matches!(
            registry.authenticate_client("other", "acmesecret").await,
            Err(ClientError::InvalidClient)
        ));
    }

    #[tokio::test]
    async fn test_grant_and_scope_checks_delegate_to_client() {
        let registry = registry();
        let client = registry.find_client("acme").await.unwrap().unwrap();
        assert!(registry.authorize_grant(&client, GrantType::Password).is_ok());
        assert!(registry
            .authorize_grant(&client, GrantType::ClientCredentials)
            .is_err());
        assert!(matches!(
            registry.authorize_scopes(&client, &Scopes::parse(Some("write"))),
            Err(ClientError::InvalidScope(_))
        ));
    }
}
