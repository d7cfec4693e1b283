// Middleware for authentication, CORS, timeouts

pub mod auth;
pub mod cors;

pub use auth::*;
pub use cors::*;
