//! Role-gated rendering.

use leptos::prelude::*;

use crate::net::types::Role;
use crate::state::auth::AuthState;

/// Renders `children` only while the current user holds at least `role`.
///
/// The check re-evaluates when `AuthState` changes, so gated actions appear
/// once `/api/auth/me` resolves.
#[component]
pub fn PermissionGate(role: Role, children: ChildrenFn) -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();

    view! { <Show when=move || auth.with(|state| state.can(role))>{children()}</Show> }
}
