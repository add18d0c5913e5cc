//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `GET /auth/google/login` - Redirect to Google
/// - `GET /auth/google/callback` - OAuth callback, issues the session cookie
/// - `POST /auth/logout` - Clear the session cookie
/// - `GET /api/me` - Get current user information
pub fn auth_routes() -> Router {
    Router::new()
        .route("/auth/google/login", get(handlers::google_oauth_start))
        .route("/auth/google/callback", get(handlers::google_oauth_callback))
        .route("/auth/logout", post(handlers::logout_handler))
        .route("/api/me", get(handlers::me_handler))
}
