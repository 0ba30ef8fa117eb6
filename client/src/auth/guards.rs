//! Declarative role gating for rendered content.
//!
//! A [`RoleGuard`] decides whether gated content is shown. It holds no state
//! and re-evaluates against the current [`AuthView`] on every call, so the
//! decision always reflects the latest auth transition. This only hides UI;
//! the backend still authorizes every request.

use super::roles::{ADMIN_GROUP, USER_GROUP};

/// Read-only view of authorization state that guards evaluate against.
pub trait AuthView {
    fn is_authenticated(&self) -> bool;
    fn has_any_role<R: AsRef<str>>(&self, required: &[R]) -> bool;
    fn has_all_roles<R: AsRef<str>>(&self, required: &[R]) -> bool;
}

impl<V: AuthView + ?Sized> AuthView for &V {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }

    fn has_any_role<R: AsRef<str>>(&self, required: &[R]) -> bool {
        (**self).has_any_role(required)
    }

    fn has_all_roles<R: AsRef<str>>(&self, required: &[R]) -> bool {
        (**self).has_all_roles(required)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Permitted,
    Denied,
}

impl GuardDecision {
    pub fn is_permitted(self) -> bool {
        self == GuardDecision::Permitted
    }
}

impl From<bool> for GuardDecision {
    fn from(permitted: bool) -> Self {
        if permitted {
            GuardDecision::Permitted
        } else {
            GuardDecision::Denied
        }
    }
}

/// Conditional rendering on roles or on authentication alone.
///
/// With no required roles and `only_check_auth` off, content is always shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGuard {
    required_roles: Vec<String>,
    require_all: bool,
    only_check_auth: bool,
}

impl RoleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard that permits holders of any of `roles`.
    pub fn requiring<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RoleGuard {
            required_roles: roles.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Require every listed role instead of any one of them.
    pub fn require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }

    /// Ignore roles and only check that someone is signed in.
    pub fn only_check_auth(mut self, only_check_auth: bool) -> Self {
        self.only_check_auth = only_check_auth;
        self
    }

    pub fn admin_only() -> Self {
        Self::requiring(ADMIN_GROUP.iter().copied())
    }

    /// Any signed-in customer, admins included.
    pub fn user_only() -> Self {
        Self::requiring(USER_GROUP.iter().copied())
    }

    pub fn authenticated_only() -> Self {
        Self::new().only_check_auth(true)
    }

    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }

    pub fn decide<V: AuthView>(&self, view: &V) -> GuardDecision {
        if self.only_check_auth {
            return view.is_authenticated().into();
        }
        if self.required_roles.is_empty() {
            return GuardDecision::Permitted;
        }
        if self.require_all {
            view.has_all_roles(self.required_roles.as_slice()).into()
        } else {
            view.has_any_role(self.required_roles.as_slice()).into()
        }
    }

    /// `children()` when permitted, nothing otherwise.
    pub fn render<V, T>(&self, view: &V, children: impl FnOnce() -> T) -> Option<T>
    where
        V: AuthView,
    {
        self.decide(view).is_permitted().then(children)
    }

    /// `children()` when permitted, `fallback()` otherwise. Only one is called.
    pub fn render_or<V, T>(
        &self,
        view: &V,
        children: impl FnOnce() -> T,
        fallback: impl FnOnce() -> T,
    ) -> T
    where
        V: AuthView,
    {
        match self.decide(view) {
            GuardDecision::Permitted => children(),
            GuardDecision::Denied => fallback(),
        }
    }
}

pub fn admin_only<V: AuthView, T>(view: &V, children: impl FnOnce() -> T) -> Option<T> {
    RoleGuard::admin_only().render(view, children)
}

pub fn user_only<V: AuthView, T>(view: &V, children: impl FnOnce() -> T) -> Option<T> {
    RoleGuard::user_only().render(view, children)
}

pub fn authenticated_only<V: AuthView, T>(view: &V, children: impl FnOnce() -> T) -> Option<T> {
    RoleGuard::authenticated_only().render(view, children)
}
