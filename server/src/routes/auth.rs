//! Session-derived identity for route handlers.
//!
//! Signing in is handled by the external auth service, which writes the
//! `sessions` table and sets the cookie. This module only resolves the cookie
//! into a user and enforces role tiers.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use axum::extract::FromRef;
use axum::http::StatusCode;
use axum::response::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use model::{CurrentUser, Role, has_capability};

use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: CurrentUser,
}

impl AuthUser {
    /// Reject with `403` unless the user holds at least `required`.
    pub fn require(&self, required: Role) -> Result<(), StatusCode> {
        if has_capability(self.user.role, required) {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user.id, role = self.user.role.as_str(), required = required.as_str(), "insufficient role");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let app_state = AppState::from_ref(state);
        let user = app_state
            .repo
            .session_user(token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { user })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/auth/me` — return the current user.
pub async fn me(auth: AuthUser) -> Json<CurrentUser> {
    Json(auth.user)
}
