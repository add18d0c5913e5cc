// Application state shared across all modules

use std::sync::Arc;

use super::config::AppConfig;
use crate::auth::TokenSigner;
use crate::services::OAuthProvider;
use crate::users::CredentialStore;

/// Dependencies handed to every handler.
///
/// Constructed once in `main` and shared behind an `Arc`; nothing in here is
/// initialized lazily or replaced at runtime.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub signer: TokenSigner,
    pub oauth: Arc<dyn OAuthProvider>,
    pub users: Arc<dyn CredentialStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        oauth: Arc<dyn OAuthProvider>,
        users: Arc<dyn CredentialStore>,
    ) -> Self {
        let signer = TokenSigner::new(config.jwt_secret.clone());
        Self {
            config: Arc::new(config),
            signer,
            oauth,
            users,
        }
    }
}
