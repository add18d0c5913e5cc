//! Authentication handlers

use axum::{
    extract::{Extension, Json, Query},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::cookies;
use super::extractors::AuthedSession;
use super::login_flow::{generate_state, verify_callback, LoginError, LoginFlow};
use super::models::CallbackQuery;
use super::token::TokenError;
use crate::common::{safe_email_log, ApiError, AppState};
use crate::users::FederatedUser;

const HX_REDIRECT: HeaderName = HeaderName::from_static("hx-redirect");

/// GET /auth/google/login - Start the Google OAuth flow
///
/// Stores a fresh anti-forgery state in a cookie and redirects to Google.
pub async fn google_oauth_start(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
) -> Response {
    let csrf_state = generate_state();
    let auth_url = state.oauth.authorization_url(&csrf_state);

    info!("Redirecting to Google OAuth");

    let jar = jar.add(cookies::state_cookie(&csrf_state, state.config.cookie_secure));
    (StatusCode::FOUND, [(header::LOCATION, auth_url)], jar).into_response()
}

/// GET /auth/google/callback - Complete the login
///
/// # Responses
/// - `302 /` with `Set-Cookie: auth_token=...` on success
/// - `400` when the code or anti-forgery state is missing or wrong
/// - `500` when the exchange, profile fetch, store or signing fails
pub async fn google_oauth_callback(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let stored_state = cookies::get_state(&jar);

    let code = verify_callback(&params, stored_state.as_deref()).map_err(|e| {
        warn!(error = %e, "Rejected Google OAuth callback");
        ApiError::from(e)
    })?;

    info!("Received OAuth callback with authorization code");

    let session = LoginFlow::new(&state)
        .complete(code, Utc::now())
        .await
        .map_err(|e| {
            error!(stage = %e.stage(), error = %e, "Google login failed");
            ApiError::from(e)
        })?;

    info!(
        google_id = %session.user.google_id,
        email = %safe_email_log(&session.user.email),
        new_user = session.created,
        "Google login successful"
    );

    let session_cookie = cookies::session_cookie(
        &session.token,
        session.expires_at,
        state.config.cookie_secure,
    )
    .map_err(|e| {
        error!(error = %e, expires_at = %session.expires_at, "Session expiry does not fit a cookie");
        ApiError::from(LoginError::Sign(TokenError::ExpiryOutOfRange))
    })?;

    let jar = jar
        .add(session_cookie)
        .remove(cookies::clear_state_cookie());

    Ok((
        StatusCode::FOUND,
        [
            (
                header::CACHE_CONTROL,
                "no-store, no-cache, must-revalidate, max-age=0",
            ),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
            (HX_REDIRECT, "/"),
            (header::LOCATION, "/"),
        ],
        jar,
    )
        .into_response())
}

/// POST /auth/logout - Drop the session cookie
pub async fn logout_handler(jar: CookieJar) -> Response {
    let jar = jar.remove(cookies::clear_session_cookie());
    (
        StatusCode::FOUND,
        [(header::LOCATION, "/"), (HX_REDIRECT, "/")],
        jar,
    )
        .into_response()
}

/// GET /api/me - Current user information
pub async fn me_handler(AuthedSession(session): AuthedSession) -> Json<FederatedUser> {
    Json(session.user)
}
