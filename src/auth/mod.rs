//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Google OAuth login and callback
//! - JWT session token signing and validation
//! - Session cookie handling
//! - Session extractors for pages and protected routes

pub mod cookies;
pub mod extractors;
pub mod handlers;
pub mod login_flow;
pub mod models;
pub mod routes;
pub mod token;


pub use extractors::{load_session, AuthedSession, MaybeSession, Session};
pub use routes::auth_routes;
pub use token::{TokenError, TokenSigner};
