//! # Pages Module
//!
//! Server-rendered HTML pages.

pub mod handlers;
pub mod routes;


pub use routes::pages_routes;
