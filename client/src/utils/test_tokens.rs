//! Token fixtures for tests.
//!
//! Well-formed tokens are signed with a throwaway HS256 secret so they look
//! exactly like what the backend issues; the decoder never checks the signature.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};

const TEST_SECRET: &[u8] = b"storefront-test-secret";

/// Sign an arbitrary claims object.
pub fn mint(claims: Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET))
        .expect("test claims must encode")
}

/// Token for `alice` carrying `scope`, expiring `expires_in_secs` from now
/// (negative for an already expired token).
pub fn token_with_scope(scope: &str, expires_in_secs: i64) -> String {
    let now = Utc::now().timestamp();
    mint(json!({
        "sub": "user-1",
        "username": "alice",
        "email": "alice@example.com",
        "scope": scope,
        "iat": now,
        "exp": now + expires_in_secs,
    }))
}

/// Hand-built token with a literal payload, for malformed-payload cases.
pub fn raw_token(payload: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}
