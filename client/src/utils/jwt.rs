//! Unverified JWT payload decoding for client-side role gating.
//!
//! Nothing in this module checks a signature. The backend re-validates every
//! authenticated request; what is decoded here only decides what the UI shows
//! and must never be treated as an authorization check.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Identity claims lifted out of a token payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenUserInfo {
    pub id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Structured view of a token, recomputed on every decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedToken {
    /// The token had three segments and a JSON object payload
    pub is_valid: bool,
    /// `exp` is in the past, absent, or the token is invalid
    pub is_expired: bool,
    pub payload: Option<Value>,
    pub roles: Vec<String>,
    pub user_info: TokenUserInfo,
    pub expires_at: Option<DateTime<Utc>>,
    pub issued_at: Option<DateTime<Utc>>,
}

impl DecodedToken {
    fn invalid() -> Self {
        DecodedToken {
            is_valid: false,
            is_expired: true,
            payload: None,
            roles: Vec::new(),
            user_info: TokenUserInfo::default(),
            expires_at: None,
            issued_at: None,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

type RoleExtractor = fn(&Map<String, Value>) -> Vec<String>;

/// Role claim shapes in priority order. The first extractor that yields a
/// non-empty list wins.
const ROLE_EXTRACTORS: [RoleExtractor; 4] = [scope_claim, roles_claim, authorities_claim, scp_claim];

fn scope_claim(claims: &Map<String, Value>) -> Vec<String> {
    match claims.get("scope") {
        Some(Value::String(scope)) => scope.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn roles_claim(claims: &Map<String, Value>) -> Vec<String> {
    string_array(claims.get("roles"))
}

fn authorities_claim(claims: &Map<String, Value>) -> Vec<String> {
    string_array(claims.get("authorities"))
}

fn scp_claim(claims: &Map<String, Value>) -> Vec<String> {
    string_array(claims.get("scp"))
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|role| !role.trim().is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn extract_roles(claims: &Map<String, Value>) -> Vec<String> {
    ROLE_EXTRACTORS
        .iter()
        .map(|extract| extract(claims))
        .find(|roles| !roles.is_empty())
        .unwrap_or_default()
}

/// Numeric timestamp claim in Unix seconds. Anything non-numeric counts as absent.
fn timestamp_claim(claims: &Map<String, Value>, name: &str) -> Option<i64> {
    let value = claims.get(name)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
}

fn non_empty_string(claims: &Map<String, Value>, name: &str) -> Option<String> {
    claims
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Restore `=` padding to a multiple of four and decode the base64url segment.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let mut padded = segment.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    general_purpose::URL_SAFE.decode(padded).ok()
}

fn parse_claims(token: &str) -> Option<Map<String, Value>> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return None;
    }

    let bytes = decode_segment(segments[1])?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(claims) => Some(claims),
        _ => None,
    }
}

/// Decode a token's payload without verifying its signature.
pub fn decode_unverified(token: &str) -> DecodedToken {
    decode_unverified_at(token, Utc::now())
}

/// Decode a token's payload against an explicit clock.
///
/// Malformed input never errors: wrong segment count, bad base64 or a
/// non-object JSON payload all produce the invalid, expired, role-less result.
/// A payload without `exp` is reported expired.
pub fn decode_unverified_at(token: &str, now: DateTime<Utc>) -> DecodedToken {
    let Some(claims) = parse_claims(token) else {
        return DecodedToken::invalid();
    };

    // Timestamps outside chrono's range count as absent, so `exp` fails closed
    let expires_at = timestamp_claim(&claims, "exp").and_then(|secs| DateTime::from_timestamp(secs, 0));
    let issued_at = timestamp_claim(&claims, "iat").and_then(|secs| DateTime::from_timestamp(secs, 0));
    let is_expired = match expires_at {
        Some(expires_at) => expires_at.timestamp() < now.timestamp(),
        None => true,
    };

    let user_info = TokenUserInfo {
        id: non_empty_string(&claims, "sub"),
        username: non_empty_string(&claims, "username")
            .or_else(|| non_empty_string(&claims, "preferred_username")),
        email: non_empty_string(&claims, "email"),
    };

    DecodedToken {
        is_valid: true,
        is_expired,
        roles: extract_roles(&claims),
        user_info,
        expires_at,
        issued_at,
        payload: Some(Value::Object(claims)),
    }
}

/// Roles carried by the token, or none if it does not decode.
pub fn roles_from_token(token: &str) -> Vec<String> {
    decode_unverified(token).roles
}

/// Identity claims carried by the token, or `None` if it does not decode.
pub fn user_info_from_token(token: &str) -> Option<TokenUserInfo> {
    let decoded = decode_unverified(token);
    decoded.is_valid.then_some(decoded.user_info)
}

pub fn is_token_expired(token: &str) -> bool {
    decode_unverified(token).is_expired
}

pub fn has_admin_role_from_token(token: &str) -> bool {
    decode_unverified(token).has_role(crate::auth::roles::ADMIN)
}

/// Whether the token expires within `window` of now.
///
/// Invalid tokens and tokens without `exp` always count as expiring, as does
/// any token when `now + window` lies past the representable range.
pub fn expires_within(token: &str, window: Duration) -> bool {
    expires_within_at(token, window, Utc::now())
}

pub fn expires_within_at(token: &str, window: Duration, now: DateTime<Utc>) -> bool {
    let decoded = decode_unverified_at(token, now);
    match decoded.expires_at {
        Some(expires_at) if decoded.is_valid => match now.checked_add_signed(window) {
            Some(deadline) => expires_at <= deadline,
            None => true,
        },
        _ => true,
    }
}

/// Emit the decoded structure of a token at debug level.
pub fn log_token_info(token: &str) {
    let decoded = decode_unverified(token);

    debug!(
        valid = decoded.is_valid,
        expired = decoded.is_expired,
        user_id = ?decoded.user_info.id,
        username = ?decoded.user_info.username,
        email = ?decoded.user_info.email,
        roles = ?decoded.roles,
        expires_at = ?decoded.expires_at,
        issued_at = ?decoded.issued_at,
        "JWT token debug info"
    );
    if let Some(payload) = &decoded.payload {
        debug!(%payload, "JWT token payload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_tokens::{mint, raw_token, token_with_scope};
    use serde_json::json;

    #[test]
    fn test_well_formed_token_is_valid() {
        let token = token_with_scope("ADMIN USER", 3600);
        let decoded = decode_unverified(&token);

        assert!(decoded.is_valid);
        assert!(!decoded.is_expired);
        assert!(decoded.payload.is_some());
        assert_eq!(decoded.user_info.id.as_deref(), Some("user-1"));
        assert_eq!(decoded.user_info.username.as_deref(), Some("alice"));
        assert_eq!(decoded.user_info.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_wrong_segment_count_is_invalid() {
        for token in ["", "abc", "a.b", "a.b.c.d", "...."] {
            let decoded = decode_unverified(token);
            assert!(!decoded.is_valid, "token {:?}", token);
            assert!(decoded.is_expired);
            assert!(decoded.roles.is_empty());
            assert!(decoded.payload.is_none());
            assert_eq!(decoded.user_info, TokenUserInfo::default());
        }
    }

    #[test]
    fn test_bad_base64_and_bad_json_are_invalid() {
        assert!(!decode_unverified("header.!!!not-base64!!!.sig").is_valid);
        assert!(!decode_unverified(&raw_token("{\"sub\": ")).is_valid);
        // Valid JSON that is not an object carries no claims
        assert!(!decode_unverified(&raw_token("[1, 2, 3]")).is_valid);
    }

    #[test]
    fn test_unpadded_segment_decodes() {
        // 17-byte payload encodes to a length that needs padding restored
        let token = raw_token(r#"{"sub":"u","x":1}"#);
        let decoded = decode_unverified(&token);
        assert!(decoded.is_valid);
        assert_eq!(decoded.user_info.id.as_deref(), Some("u"));
    }

    #[test]
    fn test_expiry_against_clock() {
        let now = Utc::now();
        let past = mint(json!({ "sub": "u", "exp": now.timestamp() - 10 }));
        let future = mint(json!({ "sub": "u", "exp": now.timestamp() + 10 }));

        assert!(decode_unverified_at(&past, now).is_expired);
        assert!(!decode_unverified_at(&future, now).is_expired);
    }

    #[test]
    fn test_missing_exp_is_expired() {
        let token = mint(json!({ "sub": "u", "roles": ["USER"] }));
        let decoded = decode_unverified(&token);

        assert!(decoded.is_valid);
        assert!(decoded.is_expired);
        assert_eq!(decoded.expires_at, None);
        assert_eq!(decoded.roles, vec!["USER"]);
    }

    #[test]
    fn test_non_numeric_exp_is_treated_as_absent() {
        let token = mint(json!({ "sub": "u", "exp": "tomorrow" }));
        assert!(decode_unverified(&token).is_expired);
    }

    #[test]
    fn test_timestamps_are_converted() {
        let token = mint(json!({ "sub": "u", "iat": 1_700_000_000, "exp": 1_700_003_600 }));
        let decoded = decode_unverified(&token);

        assert_eq!(decoded.issued_at, DateTime::from_timestamp(1_700_000_000, 0));
        assert_eq!(decoded.expires_at, DateTime::from_timestamp(1_700_003_600, 0));
    }

    #[test]
    fn test_scope_roles_preserve_order_and_drop_blanks() {
        let token = mint(json!({ "sub": "u", "scope": "  ADMIN   USER " }));
        assert_eq!(decode_unverified(&token).roles, vec!["ADMIN", "USER"]);
    }

    #[test]
    fn test_role_claim_priority() {
        let token = mint(json!({ "sub": "u", "roles": ["ADMIN"] }));
        assert_eq!(decode_unverified(&token).roles, vec!["ADMIN"]);

        let token = mint(json!({ "sub": "u", "scope": "USER", "roles": ["ADMIN"] }));
        assert_eq!(decode_unverified(&token).roles, vec!["USER"]);

        let token = mint(json!({ "sub": "u", "authorities": ["MANAGER"], "scp": ["USER"] }));
        assert_eq!(decode_unverified(&token).roles, vec!["MANAGER"]);

        let token = mint(json!({ "sub": "u", "scp": ["USER"] }));
        assert_eq!(decode_unverified(&token).roles, vec!["USER"]);
    }

    #[test]
    fn test_empty_claim_falls_through_to_next_shape() {
        let token = mint(json!({ "sub": "u", "scope": "   ", "roles": [], "authorities": ["USER"] }));
        assert_eq!(decode_unverified(&token).roles, vec!["USER"]);
    }

    #[test]
    fn test_unrecognized_role_shapes_yield_no_roles() {
        let token = mint(json!({ "sub": "u", "scope": ["ADMIN"], "roles": "ADMIN", "role": "ADMIN" }));
        assert!(decode_unverified(&token).roles.is_empty());

        let token = mint(json!({ "sub": "u", "roles": [1, null, "USER"] }));
        assert_eq!(decode_unverified(&token).roles, vec!["USER"]);
    }

    #[test]
    fn test_preferred_username_fallback() {
        let token = mint(json!({ "sub": "u", "preferred_username": "bob" }));
        assert_eq!(decode_unverified(&token).user_info.username.as_deref(), Some("bob"));

        let token = mint(json!({ "sub": "u", "username": "", "preferred_username": "bob" }));
        assert_eq!(decode_unverified(&token).user_info.username.as_deref(), Some("bob"));
    }

    #[test]
    fn test_convenience_wrappers() {
        let admin = token_with_scope("ADMIN", 60);
        let user = token_with_scope("USER", 60);

        assert!(has_admin_role_from_token(&admin));
        assert!(!has_admin_role_from_token(&user));
        assert_eq!(roles_from_token(&user), vec!["USER"]);
        assert!(user_info_from_token("garbage").is_none());
        assert!(is_token_expired("garbage"));
        assert!(!is_token_expired(&user));
    }

    #[test]
    fn test_expires_within_window() {
        let now = Utc::now();
        let soon = mint(json!({ "sub": "u", "exp": now.timestamp() + 300 }));
        let later = mint(json!({ "sub": "u", "exp": now.timestamp() + 3600 }));
        let window = Duration::minutes(10);

        assert!(expires_within_at(&soon, window, now));
        assert!(!expires_within_at(&later, window, now));
        assert!(expires_within_at("not.a.token", window, now));
        assert!(expires_within_at(&mint(json!({ "sub": "u" })), window, now));
    }

    #[test]
    fn test_huge_window_does_not_overflow() {
        let now = Utc::now();
        let token = mint(json!({ "sub": "u", "exp": now.timestamp() + 3600 }));

        assert!(expires_within_at(&token, Duration::days(365 * 400_000), now));
        assert!(expires_within(&token, Duration::MAX));
        assert!(!expires_within_at(&token, Duration::minutes(10), now));
    }

    #[test]
    fn test_out_of_range_exp_is_expired() {
        for exp in [json!(10_000_000_000_000i64), json!(1e13), json!(i64::MAX)] {
            let token = mint(json!({ "sub": "u", "roles": ["ADMIN"], "exp": exp }));
            let decoded = decode_unverified(&token);

            assert!(decoded.is_valid);
            assert!(decoded.is_expired, "exp {}", exp);
            assert_eq!(decoded.expires_at, None);
        }
    }

    #[test]
    fn test_log_token_info_does_not_alter_decoding() {
        let token = token_with_scope("ADMIN", 60);
        let before = decode_unverified_at(&token, Utc::now());
        log_token_info(&token);
        log_token_info("garbage");
        assert_eq!(before.roles, decode_unverified(&token).roles);
    }
}
