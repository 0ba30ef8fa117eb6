//! Client-side authentication state and role gating.
//!
//! This module provides the session store, the role evaluator, guards for
//! conditional rendering, the permission map for storefront features and the
//! request helpers that attach the bearer token.

pub mod context;
pub mod guards;
pub mod models;
pub mod permissions;
pub mod request;
pub mod roles;
pub mod storage;

// Re-exports for convenience
pub use context::{AuthContext, AuthState};
pub use guards::{AuthView, GuardDecision, RoleGuard};
pub use models::{AuthToken, StoredSession, UserProfile, UserProfileUpdate};
pub use permissions::Permission;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
