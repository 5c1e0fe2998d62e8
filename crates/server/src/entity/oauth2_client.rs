//! OAuth2 Client entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::oauth2::scope::Scopes;
use crate::oauth2::types::{Client, GrantType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "oauth2_client")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Argon2 PHC hash of the client secret
    pub secret_hash: String,
    /// JSON array of allowed redirect URIs
    pub redirect_uris: String,
    /// Space-separated list of allowed grant types
    pub grant_types: String,
    /// Space-separated list of allowed scopes
    pub scopes: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse redirect URIs from JSON string
    pub fn redirect_uris_list(&self) -> Result<Vec<String>, StoreError> {
        if self.redirect_uris.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.redirect_uris)
            .map_err(|e| StoreError::Corrupt(format!("client {} redirect_uris: {e}", self.id)))
    }

    /// Parse grant types from space-separated string
    pub fn grant_types_list(&self) -> Result<Vec<GrantType>, StoreError> {
        self.grant_types
            .split_whitespace()
            .map(|g| {
                g.parse::<GrantType>().map_err(|unknown| {
                    StoreError::Corrupt(format!("client {} grant type {unknown}", self.id))
                })
            })
            .collect()
    }

    pub fn into_client(self) -> Result<Client, StoreError> {
        let grant_types = self.grant_types_list()?.into_iter().collect();
        let redirect_uris = self.redirect_uris_list()?;
        Ok(Client {
            scopes: Scopes::parse(Some(&self.scopes)),
            client_id: self.id,
            secret_hash: self.secret_hash,
            grant_types,
            redirect_uris,
        })
    }
}
