//! Resource owner credential verification.

use crate::entity::account;
use crate::error::{CredentialError, StoreError};
use crate::oauth2::password::{verify_against_dummy, verify_password};
use crate::oauth2::types::Account;
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::collections::HashMap;
use std::sync::Arc;

/// Read contract for the account store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up exactly one account by its unique name.
    async fn find_account(&self, account_name: &str) -> Result<Option<Account>, StoreError>;

    /// Verify an account name and password.
    async fn authenticate(
        &self,
        account_name: &str,
        password: &str,
    ) -> Result<Account, CredentialError> {
        let Some(account) = self.find_account(account_name).await? else {
            verify_against_dummy(password);
            return Err(CredentialError::AccountNotFound);
        };
        if !account.enabled {
            verify_against_dummy(password);
            return Err(CredentialError::AccountDisabled);
        }
        if !verify_password(password, &account.password_hash) {
            return Err(CredentialError::InvalidCredentials);
        }
        Ok(account)
    }
}

/// Accounts held in memory, typically seeded from configuration.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    accounts: HashMap<String, Account>,
}

impl InMemoryCredentialStore {
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|a| (a.account_name.clone(), a))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_account(&self, account_name: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(account_name).cloned())
    }
}

/// Accounts read from the `account` table.
#[derive(Clone)]
pub struct DbCredentialStore {
    db: Arc<DatabaseConnection>,
}

impl DbCredentialStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for DbCredentialStore {
    #[tracing::instrument(skip(self))]
    async fn find_account(&self, account_name: &str) -> Result<Option<Account>, StoreError> {
        let model = account::Entity::find_by_id(account_name)
            .one(self.db.as_ref())
            .await
            .map_err(|e| {
                tracing::error!("Database error looking up account: {}", e);
                StoreError::from(e)
            })?;
        Ok(model.map(Account::from))
    }
}
