//! Pure role predicates over a list of role tags.
//!
//! Roles are opaque strings compared exactly. The storefront only issues
//! [`ADMIN`] and [`USER`] in practice, but nothing here depends on that.

pub const ADMIN: &str = "ADMIN";
pub const USER: &str = "USER";

/// Roles that unlock admin-only screens.
pub const ADMIN_GROUP: &[&str] = &[ADMIN];
/// Roles held by any signed-in customer; admins count as customers.
pub const USER_GROUP: &[&str] = &[USER, ADMIN];

pub fn has_role<S: AsRef<str>>(current: &[S], role: &str) -> bool {
    current.iter().any(|r| r.as_ref() == role)
}

/// True when any required role is held. An empty requirement is unrestricted.
pub fn has_any_role<S: AsRef<str>, R: AsRef<str>>(current: &[S], required: &[R]) -> bool {
    required.is_empty() || required.iter().any(|r| has_role(current, r.as_ref()))
}

/// True when every required role is held. Vacuously true for an empty requirement.
pub fn has_all_roles<S: AsRef<str>, R: AsRef<str>>(current: &[S], required: &[R]) -> bool {
    required.iter().all(|r| has_role(current, r.as_ref()))
}
