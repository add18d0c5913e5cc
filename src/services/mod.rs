// src/services/mod.rs
//
// Clients for third-party services used by the domain modules

pub mod google;

pub use google::{GoogleOAuthClient, OAuthProvider};
