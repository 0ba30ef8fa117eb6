//! Bearer-token handling for outgoing backend requests.

/// Endpoints that must be called without an `Authorization` header.
pub const PUBLIC_ENDPOINTS: &[&str] = &[
    "/auth/login",
    "/auth/logout",
    "/auth/refresh",
    "/auth/introspect",
];

const BEARER_PREFIX: &str = "Bearer ";

pub fn is_public_endpoint(url: &str) -> bool {
    PUBLIC_ENDPOINTS.iter().any(|endpoint| url.contains(endpoint))
}

pub fn bearer_header(access_token: &str) -> String {
    format!("{}{}", BEARER_PREFIX, access_token)
}

/// Token carried by a `Bearer` header value, if any.
pub fn parse_bearer(header: &str) -> Option<&str> {
    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Header to attach to a request for `url`.
///
/// The stored token is attached even close to expiry; a rejected request is
/// the caller's cue to refresh.
pub fn authorization_for(url: &str, access_token: Option<&str>) -> Option<String> {
    if is_public_endpoint(url) {
        return None;
    }
    access_token
        .filter(|token| !token.is_empty())
        .map(bearer_header)
}
