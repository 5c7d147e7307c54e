//! Directory landing page: hero, navigation actions, search, and featured
//! collections.

#[cfg(test)]
#[path = "directory_test.rs"]
mod directory_test;

use leptos::prelude::*;

use crate::components::directory_search::DirectorySearch;
use crate::components::featured_collections::FeaturedCollections;
use crate::net::types::Role;
use crate::state::auth::AuthState;

pub const GEOGRAPHIC_COLLECTIONS_PATH: &str = "/collections/news/geographic";
pub const CREATE_COLLECTION_PATH: &str = "/collections/create";
pub const CREATE_SOURCE_PATH: &str = "/sources/create";

/// A navigation button, optionally restricted to a role tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavAction {
    pub label: &'static str,
    pub href: &'static str,
    pub required: Option<Role>,
}

/// All landing-page actions in display order.
#[must_use]
pub fn directory_actions() -> [NavAction; 3] {
    [
        NavAction {
            label: "Browse Geographic News Collections",
            href: GEOGRAPHIC_COLLECTIONS_PATH,
            required: None,
        },
        NavAction { label: "Create Collection", href: CREATE_COLLECTION_PATH, required: Some(Role::Staff) },
        NavAction { label: "Create Source", href: CREATE_SOURCE_PATH, required: Some(Role::Staff) },
    ]
}

/// Actions the current user gets to see. Gated actions use the same check as
/// `PermissionGate`.
#[must_use]
pub fn visible_actions(auth: &AuthState) -> Vec<NavAction> {
    directory_actions()
        .into_iter()
        .filter(|action| action.required.map_or(true, |required| auth.can(required)))
        .collect()
}

#[component]
pub fn DirectoryPage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let actions = move || {
        auth.with(visible_actions)
            .into_iter()
            .map(|action| view! { <NavButton action=action/> })
            .collect_view()
    };

    view! {
        <div class="directory-page">
            <div class="feature-area filled">
                <div class="container">
                    <h1>"Directory"</h1>
                    <p>
                        <a href=GEOGRAPHIC_COLLECTIONS_PATH>"Check the breadth of our global coverage"</a>
                        " by browsing the media sources and collections in our directory, and suggesting more to add."
                    </p>
                </div>
            </div>
            <div class="sub-feature">
                <div class="container directory-page__toolbar">
                    <div class="directory-page__actions">{actions}</div>
                    <div class="directory-page__search">
                        <DirectorySearch/>
                    </div>
                </div>
            </div>
            <div class="container">
                <FeaturedCollections/>
            </div>
        </div>
    }
}

#[component]
fn NavButton(action: NavAction) -> impl IntoView {
    let privileged = action.required.is_some();
    let class = if privileged { "btn btn--outlined btn--privileged" } else { "btn btn--outlined" };

    view! {
        <a class=class href=action.href>
            {action.label}
            {privileged.then(|| view! { <span class="icon icon--lock-open" aria-hidden="true"></span> })}
        </a>
    }
}
