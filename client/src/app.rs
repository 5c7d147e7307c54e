//! Root application component with routing and context providers.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::{
    ParamSegment, StaticSegment,
    components::{Route, Router, Routes},
};

use crate::pages::{collection::CollectionPage, directory::DirectoryPage};
use crate::state::{associations::AssociationContext, auth::AuthState};

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// Provides the auth and association contexts and sets up client-side routing.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let auth = RwSignal::new(AuthState::default());
    provide_context(auth);
    provide_context(AssociationContext::http());

    // Resolve the session once in the browser; SSR renders as anonymous.
    #[cfg(feature = "hydrate")]
    leptos::task::spawn_local(async move {
        let user = crate::net::api::fetch_current_user().await;
        if let Some(user) = &user {
            log::debug!("signed in as {} ({})", user.name, user.role.as_str());
        }
        auth.set(AuthState { user });
    });

    view! {
        <Stylesheet id="leptos" href="/pkg/directory.css"/>
        <Title text="Directory"/>

        <Router>
            <main>
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=StaticSegment("") view=DirectoryPage/>
                    <Route path=(StaticSegment("collections"), ParamSegment("id")) view=CollectionPage/>
                </Routes>
            </main>
        </Router>
    }
}
