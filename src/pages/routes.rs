//! Page routes

use axum::{routing::get, Router};

use super::handlers;

/// Creates and returns the page router
///
/// # Routes
/// - `GET /` - Home page
pub fn pages_routes() -> Router {
    Router::new().route("/", get(handlers::index_handler))
}
