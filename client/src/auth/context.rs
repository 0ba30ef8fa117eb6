//! The single writable source of authentication state for a client session.
//!
//! An [`AuthContext`] bridges the persisted session blob and in-memory state.
//! It is constructed once at application entry and handed by reference to
//! everything that needs to read auth state. Every transition publishes one
//! complete [`AuthState`] snapshot, so a reader never sees a new access token
//! paired with the previous session's roles.

use super::guards::AuthView;
use super::models::{AuthToken, StoredSession, UserProfile, UserProfileUpdate};
use super::permissions::Permission;
use super::request;
use super::roles::{self, ADMIN, USER};
use super::storage::{FileStorage, SessionStorage};
use crate::config::Config;
use crate::errors::{AuthError, AuthResult};
use crate::utils::jwt::{self, DecodedToken};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Key an older client version stored the bare access token under.
const LEGACY_TOKEN_KEY: &str = "accessToken";

/// Snapshot of the session as seen by consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthState {
    #[serde(skip)]
    pub access_token: Option<String>,
    #[serde(skip)]
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
    /// Derived from the access token; never set independently
    pub roles: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Access token present and unexpired at the last transition
    pub is_authenticated: bool,
}

impl AuthState {
    fn from_session(session: StoredSession, decoded: &DecodedToken) -> Self {
        AuthState {
            access_token: Some(session.access_token),
            refresh_token: session.refresh_token,
            user: session.user,
            roles: decoded.roles.clone(),
            expires_at: decoded.expires_at,
            is_authenticated: decoded.is_valid && !decoded.is_expired,
        }
    }

    fn to_session(&self) -> Option<StoredSession> {
        self.access_token.as_ref().map(|access_token| StoredSession {
            access_token: access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            user: self.user.clone(),
        })
    }

    /// Whether the session is still authenticated at `now`.
    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.is_authenticated
            && self
                .expires_at
                .is_some_and(|expires_at| expires_at.timestamp() >= now.timestamp())
    }

    pub fn is_authenticated_now(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    /// Roles that count for permission checks: none once the session has lapsed.
    pub fn active_roles(&self) -> &[String] {
        if self.is_authenticated_now() {
            &self.roles
        } else {
            &[]
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        roles::has_role(self.active_roles(), role)
    }

    pub fn has_any_role<R: AsRef<str>>(&self, required: &[R]) -> bool {
        roles::has_any_role(self.active_roles(), required)
    }

    pub fn has_all_roles<R: AsRef<str>>(&self, required: &[R]) -> bool {
        roles::has_all_roles(self.active_roles(), required)
    }
}

impl AuthView for AuthState {
    fn is_authenticated(&self) -> bool {
        self.is_authenticated_now()
    }

    fn has_any_role<R: AsRef<str>>(&self, required: &[R]) -> bool {
        AuthState::has_any_role(self, required)
    }

    fn has_all_roles<R: AsRef<str>>(&self, required: &[R]) -> bool {
        AuthState::has_all_roles(self, required)
    }
}

/// Authentication store over a [`SessionStorage`] backend.
pub struct AuthContext {
    storage: Arc<dyn SessionStorage>,
    key: String,
    state: watch::Sender<AuthState>,
    // Serializes transitions so a storage write and its state swap stay paired
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("key", &self.key)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl AuthContext {
    /// Build the context from whatever session is persisted under `key`.
    ///
    /// A missing, unreadable, corrupt or expired session boots logged out, and
    /// stale data is cleared. This never fails.
    pub fn initialize<S>(storage: S, key: impl Into<String>) -> Self
    where
        S: SessionStorage + 'static,
    {
        let storage: Arc<dyn SessionStorage> = Arc::new(storage);
        let key = key.into();
        let initial = load_session(storage.as_ref(), &key).unwrap_or_default();
        let (state, _) = watch::channel(initial);

        AuthContext {
            storage,
            key,
            state,
            write_lock: Mutex::new(()),
        }
    }

    /// File-backed context at the configured location.
    pub fn from_config(config: &Config) -> Self {
        Self::initialize(FileStorage::new(config.storage_dir.clone()), config.storage_key.clone())
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated_now()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user.clone()
    }

    pub fn roles(&self) -> Vec<String> {
        self.state.borrow().active_roles().to_vec()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.borrow().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state.borrow().refresh_token.clone()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.state.borrow().has_role(role)
    }

    pub fn has_any_role<R: AsRef<str>>(&self, required: &[R]) -> bool {
        self.state.borrow().has_any_role(required)
    }

    pub fn has_all_roles<R: AsRef<str>>(&self, required: &[R]) -> bool {
        self.state.borrow().has_all_roles(required)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN)
    }

    pub fn is_user(&self) -> bool {
        self.has_role(USER)
    }

    pub fn can_access<R: AsRef<str>>(&self, required: &[R], require_all: bool) -> bool {
        if require_all {
            self.has_all_roles(required)
        } else {
            self.has_any_role(required)
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.has_any_role(permission.required_roles())
    }

    /// Gate an action on a permission before calling the backend.
    pub fn require(&self, permission: Permission) -> AuthResult<()> {
        if self.can(permission) {
            return Ok(());
        }
        Err(AuthError::permission_denied(format!(
            "{} requires one of: {}",
            permission,
            permission.required_roles().join(", ")
        )))
    }

    /// `Authorization` header value for a request to `url`, if one applies.
    pub fn authorization_header(&self, url: &str) -> Option<String> {
        let state = self.state.borrow();
        request::authorization_for(url, state.access_token.as_deref())
    }

    /// Whether the access token expires within `window` and should be refreshed.
    pub fn needs_refresh(&self, window: Duration) -> bool {
        let state = self.state.borrow();
        match state.access_token.as_deref() {
            Some(token) => jwt::expires_within(token, window),
            None => false,
        }
    }

    /// Start a session, replacing any previous one.
    ///
    /// The blob is persisted before the state changes; if the write fails the
    /// previous session stays in place and the error is returned.
    pub fn login(&self, token: AuthToken, user: impl Into<Option<UserProfile>>) -> AuthResult<()> {
        token.check()?;
        let _guard = self.lock()?;

        let decoded = jwt::decode_unverified(&token.access_token);
        if !decoded.is_valid || decoded.is_expired {
            warn!(valid = decoded.is_valid, "login with a token that is not currently usable");
        }

        let session = StoredSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user: user.into(),
        };
        self.persist(&session)?;

        let next = AuthState::from_session(session, &decoded);
        info!(
            user_id = ?decoded.user_info.id,
            roles = ?next.roles,
            authenticated = next.is_authenticated,
            "session started"
        );
        self.state.send_replace(next);
        Ok(())
    }

    /// Replace the access token of the current session, keeping its user.
    ///
    /// The stored refresh token is kept unless `token` carries a new one.
    pub fn refresh(&self, token: AuthToken) -> AuthResult<()> {
        token.check()?;
        let _guard = self.lock()?;

        let current = self.state();
        if current.access_token.is_none() {
            return Err(AuthError::validation("No active session to refresh"));
        }

        let decoded = jwt::decode_unverified(&token.access_token);
        let session = StoredSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token.or(current.refresh_token),
            user: current.user,
        };
        self.persist(&session)?;

        let next = AuthState::from_session(session, &decoded);
        debug!(roles = ?next.roles, expires_at = ?next.expires_at, "access token refreshed");
        self.state.send_replace(next);
        Ok(())
    }

    /// End the session. Calling it again is a no-op.
    ///
    /// In-memory state is always reset; a storage failure is still reported.
    pub fn logout(&self) -> AuthResult<()> {
        let _guard = self.lock()?;
        self.reset_session()
    }

    /// Caller must hold the write lock.
    fn reset_session(&self) -> AuthResult<()> {
        let changed = self.state.send_if_modified(|state| {
            if *state == AuthState::default() {
                false
            } else {
                *state = AuthState::default();
                true
            }
        });
        if changed {
            info!("session ended");
        }

        let removed = self.storage.remove(&self.key);
        let legacy = self.storage.remove(LEGACY_TOKEN_KEY);
        removed.and(legacy)
    }

    /// Merge profile fields into the current user.
    ///
    /// Tokens and roles are untouched; the persisted blob's user is rewritten.
    /// Without a session user there is nothing to merge into and this is a no-op.
    pub fn update_user(&self, update: UserProfileUpdate) -> AuthResult<()> {
        let _guard = self.lock()?;

        let mut next = self.state();
        let Some(user) = next.user.as_mut() else {
            debug!("update_user ignored: no user in session");
            return Ok(());
        };
        update.apply_to(user);

        if let Some(session) = next.to_session() {
            self.persist(&session)?;
        }
        let merged = next.user;
        self.state.send_modify(|state| state.user = merged);
        Ok(())
    }

    /// Log out if the current access token has expired.
    ///
    /// Returns whether the session was ended.
    pub fn check_expiry(&self) -> AuthResult<bool> {
        let _guard = self.lock()?;

        // Evaluated under the lock so a concurrent login is never undone
        let expired = {
            let state = self.state.borrow();
            state.access_token.is_some() && !state.is_authenticated_now()
        };
        if expired {
            debug!("access token expired, ending session");
            self.reset_session()?;
        }
        Ok(expired)
    }

    fn persist(&self, session: &StoredSession) -> AuthResult<()> {
        let blob = serde_json::to_string(session)?;
        self.storage.set(&self.key, &blob)
    }

    fn lock(&self) -> AuthResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| AuthError::internal_error("auth context write lock poisoned"))
    }
}

impl AuthView for AuthContext {
    fn is_authenticated(&self) -> bool {
        AuthContext::is_authenticated(self)
    }

    fn has_any_role<R: AsRef<str>>(&self, required: &[R]) -> bool {
        AuthContext::has_any_role(self, required)
    }

    fn has_all_roles<R: AsRef<str>>(&self, required: &[R]) -> bool {
        AuthContext::has_all_roles(self, required)
    }
}

/// Read and decode the persisted session, clearing it when it is unusable.
fn load_session(storage: &dyn SessionStorage, key: &str) -> Option<AuthState> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "session storage unreadable, starting logged out");
            clear_stale(storage, key);
            return None;
        }
    };

    let session: StoredSession = match serde_json::from_str(&raw) {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "persisted session is corrupt, starting logged out");
            clear_stale(storage, key);
            return None;
        }
    };

    let decoded = jwt::decode_unverified(&session.access_token);
    if !decoded.is_valid || decoded.is_expired {
        debug!(valid = decoded.is_valid, "persisted access token unusable, starting logged out");
        clear_stale(storage, key);
        return None;
    }

    debug!(roles = ?decoded.roles, "restored persisted session");
    Some(AuthState::from_session(session, &decoded))
}

fn clear_stale(storage: &dyn SessionStorage, key: &str) {
    if let Err(e) = storage.remove(key) {
        warn!(error = %e, "could not clear stale session data");
    }
}
