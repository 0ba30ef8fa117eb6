//! Data structures for tokens, user profiles and the persisted session blob.
//!
//! Field names serialize in camelCase to match the backend's login and
//! current-user responses and the blob layout already sitting in storage.

use crate::errors::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Token pair issued by the backend's login and refresh endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    #[validate(length(min = 1, message = "Access token is required"))]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Seconds until the access token expires, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl AuthToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        AuthToken {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: None,
            expires_in: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Validate the token payload, flattening field errors into one message.
    pub fn check(&self) -> AuthResult<()> {
        self.validate().map_err(|validation_errors| {
            let error_messages: Vec<String> = validation_errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| {
                        format!(
                            "{}: {}",
                            field,
                            error.message.as_ref().unwrap_or(&"Invalid value".into())
                        )
                    })
                })
                .collect();
            AuthError::validation(error_messages.join(", "))
        })
    }
}

/// User profile as returned by the backend's current-user endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<String>,
    /// Backend fields this client does not model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, username: impl Into<String>, email: impl Into<String>) -> Self {
        UserProfile {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            phone: None,
            dob: None,
            image: None,
            roles: None,
            created_date: None,
            last_modified_date: None,
            extra: Map::new(),
        }
    }

    pub fn full_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(name), None) | (None, Some(name)) => Some(name.to_string()),
            (None, None) => None,
        }
    }
}

/// Partial profile update; only the fields that are set are merged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileUpdate {
    pub id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<String>,
    pub image: Option<String>,
    pub roles: Option<Vec<String>>,
    pub created_date: Option<String>,
    pub last_modified_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfileUpdate {
    /// Merge the set fields into `user`.
    pub fn apply_to(self, user: &mut UserProfile) {
        if let Some(id) = self.id {
            user.id = id;
        }
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        merge(&mut user.first_name, self.first_name);
        merge(&mut user.last_name, self.last_name);
        merge(&mut user.phone, self.phone);
        merge(&mut user.dob, self.dob);
        merge(&mut user.image, self.image);
        merge(&mut user.roles, self.roles);
        merge(&mut user.created_date, self.created_date);
        merge(&mut user.last_modified_date, self.last_modified_date);
        user.extra.extend(self.extra);
    }
}

fn merge<T>(field: &mut Option<T>, update: Option<T>) {
    if update.is_some() {
        *field = update;
    }
}

/// The blob persisted under the session storage key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}
