//! Authorization core for the storefront client.
//!
//! Decodes the backend's access tokens (without verifying them), keeps the
//! session in a single [`auth::AuthContext`], and answers role and permission
//! questions for gated UI. The backend remains the only authority on access.

pub mod auth;
pub mod config;
pub mod errors;
pub mod utils;

pub use auth::{AuthContext, AuthState, AuthToken, Permission, RoleGuard, UserProfile};
pub use errors::{AuthError, AuthResult};
pub use utils::jwt::{DecodedToken, decode_unverified};
