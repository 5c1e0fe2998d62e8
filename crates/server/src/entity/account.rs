//! Account entity - resource owners that can obtain tokens.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::oauth2::types::Account;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_name: String,
    /// Argon2 PHC hash
    pub password_hash: String,
    pub enabled: bool,
    /// Space-separated list of granted authorities
    pub authorities: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse authorities from space-separated string
    pub fn authorities_set(&self) -> BTreeSet<String> {
        self.authorities
            .split_whitespace()
            .map(String::from)
            .collect()
    }
}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        let authorities = model.authorities_set();
        Account {
            account_name: model.account_name,
            password_hash: model.password_hash,
            enabled: model.enabled,
            authorities,
        }
    }
}
