//! Auth-session state for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Read by `PermissionGate` and role-aware pages. Signing in happens outside
//! this app; here we only learn who the server says we are.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::net::types::{CurrentUser, Role};

/// Current user, once `/api/auth/me` has answered.
#[derive(Clone, Debug, Default)]
pub struct AuthState {
    pub user: Option<CurrentUser>,
}

impl AuthState {
    /// Effective role; visitors without a session are `Anonymous`.
    #[must_use]
    pub fn role(&self) -> Role {
        self.user.as_ref().map_or(Role::Anonymous, |u| u.role)
    }

    #[must_use]
    pub fn can(&self, required: Role) -> bool {
        model::has_capability(self.role(), required)
    }
}
