//! Google login saga
//!
//! `CodeReceived -> TokenExchanged -> ProfileFetched -> UserUpserted -> SessionIssued`.
//! Every stage is terminal on failure; nothing already done is rolled back.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use rand::Rng;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

use super::models::CallbackQuery;
use super::token::{TokenError, TokenSigner};
use crate::common::{safe_email_log, ApiError, AppState};
use crate::services::google::{GoogleError, GoogleUserInfo};
use crate::services::OAuthProvider;
use crate::users::{CredentialStore, FederatedUser, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    CodeReceived,
    TokenExchanged,
    ProfileFetched,
    UserUpserted,
    SessionIssued,
}

impl fmt::Display for LoginStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoginStage::CodeReceived => "code_received",
            LoginStage::TokenExchanged => "token_exchanged",
            LoginStage::ProfileFetched => "profile_fetched",
            LoginStage::UserUpserted => "user_upserted",
            LoginStage::SessionIssued => "session_issued",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("provider denied authorization: {0}")]
    ProviderDenied(String),

    #[error("no authorization code provided")]
    MissingCode,

    #[error("anti-forgery state missing or mismatched")]
    StateMismatch,

    #[error("code exchange failed: {0}")]
    Exchange(#[source] GoogleError),

    #[error("profile fetch failed: {0}")]
    Profile(#[source] GoogleError),

    #[error("user lookup failed: {0}")]
    Lookup(#[source] StoreError),

    #[error("user create failed: {0}")]
    Create(#[source] StoreError),

    #[error("user update failed: {0}")]
    Update(#[source] StoreError),

    #[error("session signing failed: {0}")]
    Sign(#[source] TokenError),
}

impl LoginError {
    /// Last stage reached before the failure
    pub fn stage(&self) -> LoginStage {
        match self {
            LoginError::ProviderDenied(_) | LoginError::MissingCode | LoginError::StateMismatch => {
                LoginStage::CodeReceived
            }
            LoginError::Exchange(_) => LoginStage::CodeReceived,
            LoginError::Profile(_) => LoginStage::TokenExchanged,
            LoginError::Lookup(_) | LoginError::Create(_) | LoginError::Update(_) => {
                LoginStage::ProfileFetched
            }
            LoginError::Sign(_) => LoginStage::UserUpserted,
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::ProviderDenied(_) => {
                ApiError::BadRequest("Authorization was denied".to_string())
            }
            LoginError::MissingCode => ApiError::BadRequest("No code provided".to_string()),
            LoginError::StateMismatch => ApiError::BadRequest("Invalid OAuth state".to_string()),
            LoginError::Exchange(_) => {
                ApiError::InternalServer("Failed to exchange token".to_string())
            }
            LoginError::Profile(_) => {
                ApiError::InternalServer("Failed to fetch user info".to_string())
            }
            LoginError::Lookup(_) => {
                ApiError::InternalServer("Failed to get google user".to_string())
            }
            LoginError::Create(_) => {
                ApiError::InternalServer("Could not persist new user".to_string())
            }
            LoginError::Update(_) => ApiError::InternalServer("Could not update user".to_string()),
            LoginError::Sign(_) => ApiError::InternalServer("Failed to generate token".to_string()),
        }
    }
}

/// Outcome of a completed login
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: FederatedUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// True when this login created the user record
    pub created: bool,
}

/// Generates a random anti-forgery state: 16 random bytes, base64url.
pub fn generate_state() -> String {
    let random_bytes: [u8; 16] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Checks the callback query against the state stored at login start and
/// returns the authorization code.
pub fn verify_callback<'q>(
    query: &'q CallbackQuery,
    stored_state: Option<&str>,
) -> Result<&'q str, LoginError> {
    if let Some(error) = &query.error {
        return Err(LoginError::ProviderDenied(error.clone()));
    }

    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(LoginError::MissingCode)?;

    match (query.state.as_deref(), stored_state) {
        (Some(received), Some(stored)) if !received.is_empty() && received == stored => Ok(code),
        _ => Err(LoginError::StateMismatch),
    }
}

/// Session expiry for a login at `now`, truncated to whole seconds so the
/// cookie and the token agree exactly. `None` when the sum overflows.
pub fn session_expiry(now: DateTime<Utc>, ttl: Duration) -> Option<DateTime<Utc>> {
    now.checked_add_signed(ttl).map(|at| at.trunc_subsecs(0))
}

pub struct LoginFlow<'a> {
    oauth: &'a dyn OAuthProvider,
    users: &'a dyn CredentialStore,
    signer: &'a TokenSigner,
    ttl_hours: i64,
}

impl<'a> LoginFlow<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            oauth: state.oauth.as_ref(),
            users: state.users.as_ref(),
            signer: &state.signer,
            ttl_hours: state.config.jwt_expiration_hours,
        }
    }

    /// Runs the saga from an authorization code to a signed session.
    pub async fn complete(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, LoginError> {
        let provider_token = self
            .oauth
            .exchange_code(code)
            .await
            .map_err(LoginError::Exchange)?;
        debug!(stage = %LoginStage::TokenExchanged, "Exchanged authorization code");

        let profile = self
            .oauth
            .fetch_profile(&provider_token)
            .await
            .map_err(LoginError::Profile)?;
        debug!(
            stage = %LoginStage::ProfileFetched,
            google_id = %profile.id,
            email = %safe_email_log(&profile.email),
            "Fetched Google profile"
        );

        let (user, created) = self.upsert_user(&profile).await?;
        debug!(stage = %LoginStage::UserUpserted, google_id = %user.google_id, created, "Upserted user");

        let expires_at = Duration::try_hours(self.ttl_hours)
            .and_then(|ttl| session_expiry(now, ttl))
            .ok_or(LoginError::Sign(TokenError::ExpiryOutOfRange))?;
        let token = self
            .signer
            .issue(&user.google_id, expires_at)
            .map_err(LoginError::Sign)?;
        debug!(stage = %LoginStage::SessionIssued, expires_at = %expires_at, "Issued session token");

        Ok(IssuedSession {
            user,
            token,
            expires_at,
            created,
        })
    }

    async fn upsert_user(
        &self,
        profile: &GoogleUserInfo,
    ) -> Result<(FederatedUser, bool), LoginError> {
        let existing = self
            .users
            .find_by_provider_id(&profile.id)
            .await
            .map_err(LoginError::Lookup)?;

        match existing {
            None => {
                let user = FederatedUser::from_profile(profile);
                self.users.create(&user).await.map_err(LoginError::Create)?;
                info!(google_id = %user.google_id, "First time login, created user");
                Ok((user, true))
            }
            Some(mut user) => {
                user.apply_profile(profile);
                self.users.update(&user).await.map_err(LoginError::Update)?;
                Ok((user, false))
            }
        }
    }
}
