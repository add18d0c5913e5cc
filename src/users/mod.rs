//! # Users Module
//!
//! Federated user records and the credential store that persists them.

pub mod models;
pub mod store;

#[cfg(test)]
mod tests;

pub use models::FederatedUser;
pub use store::{CredentialStore, PgCredentialStore, StoreError};
