//! Middleware del sistema
//!
//! Autenticación JWT, guardas de rol y CORS.

pub mod auth;
pub mod cors;

pub use auth::*;
pub use cors::*;
