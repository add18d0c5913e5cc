//! Session loading and extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts, Request},
    http::{request::Parts, Extensions},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::cookies;
use crate::common::{safe_token_log, ApiError, AppState};
use crate::users::FederatedUser;

pub const DEMO_USER_NAME: &str = "Demo user";
pub const DEFAULT_PROFILE_PICTURE: &str =
    "https://i.pinimg.com/564x/ab/8f/d1/ab8fd1cd803e62a5120708944874ee49.jpg";

/// Request-scoped session, present only for authenticated requests
#[derive(Debug, Clone)]
pub struct Session {
    pub user: FederatedUser,
}

impl Session {
    pub fn from_extensions(extensions: &Extensions) -> Option<&Session> {
        extensions.get::<Session>()
    }
}

/// Middleware resolving the `auth_token` cookie into a `Session`.
///
/// Never rejects: a missing, invalid or orphaned token just leaves the
/// request anonymous.
pub async fn load_session(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(session) = resolve_session(&state, &jar).await {
        request.extensions_mut().insert(session);
    }

    next.run(request).await
}

async fn resolve_session(state: &AppState, jar: &CookieJar) -> Option<Session> {
    let token = cookies::get_session_token(jar)?;

    let google_id = match state.signer.validate(&token) {
        Ok(subject) => subject,
        Err(_) => {
            debug!(token = %safe_token_log(&token), "Ignoring invalid session cookie");
            return None;
        }
    };

    match state.users.find_by_provider_id(&google_id).await {
        Ok(Some(user)) => Some(Session { user }),
        Ok(None) => {
            warn!(google_id = %google_id, "Session subject has no stored user");
            None
        }
        Err(e) => {
            error!(error = %e, google_id = %google_id, "Failed to load session user");
            None
        }
    }
}

/// Optional session extractor
///
/// Renders the demo identity when nobody is signed in.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

impl MaybeSession {
    pub fn user_name(&self) -> &str {
        match &self.0 {
            Some(session) => session.user.name.as_str(),
            None => DEMO_USER_NAME,
        }
    }

    pub fn profile_picture_url(&self) -> &str {
        match &self.0 {
            Some(session) if !session.user.picture.is_empty() => session.user.picture.as_str(),
            _ => DEFAULT_PROFILE_PICTURE,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(
            Session::from_extensions(&parts.extensions).cloned(),
        ))
    }
}

/// Required session extractor for protected routes
#[derive(Debug, Clone)]
pub struct AuthedSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for AuthedSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Session::from_extensions(&parts.extensions)
            .cloned()
            .map(AuthedSession)
            .ok_or_else(|| {
                warn!("Authentication failed: missing or invalid session");
                ApiError::Unauthorized("Unauthorized".into())
            })
    }
}
