//! sea-orm entities read by the database-backed credential store and client registry.

pub mod account;
pub mod oauth2_client;
