//! An OAuth2 authorization server.
//!
//! Issues opaque bearer tokens for the password, authorization code and
//! refresh token grants, and validates them for protected resources.

pub mod api;
pub mod config;
pub mod entity;
pub mod error;
pub mod oauth2;
