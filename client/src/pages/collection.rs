//! Collection detail page: name, notes, and associated sources.

use leptos::prelude::*;
use leptos_router::hooks::use_params_map;

use crate::components::collection_source_list::CollectionSourceList;
use crate::components::permission_gate::PermissionGate;
use crate::net::types::{CollectionId, Role};
use crate::state::auth::AuthState;

/// Page for `/collections/:id`. Staff get an Edit toggle that switches the
/// source list into removal mode.
#[component]
pub fn CollectionPage() -> impl IntoView {
    let params = use_params_map();
    let auth = expect_context::<RwSignal<AuthState>>();

    let route_id = Memo::new(move |_| params.with(|p| p.get("id").and_then(|raw| raw.parse::<CollectionId>().ok())));
    let collection_id = Signal::derive(move || route_id.get().unwrap_or_default());

    let edit = RwSignal::new(false);
    // Losing the staff role drops back to read-only.
    let editing = Signal::derive(move || edit.get() && auth.with(|a| a.can(Role::Staff)));

    view! {
        <Show
            when=move || route_id.get().is_some()
            fallback=|| view! { <div class="collection-page"><p>"Collection not found."</p></div> }
        >
            <div class="collection-page">
                <header class="collection-page__header">
                    <CollectionHeader collection_id=collection_id/>
                    <PermissionGate role=Role::Staff>
                        <button class="btn" on:click=move |_| edit.update(|e| *e = !*e)>
                            {move || if edit.get() { "Done" } else { "Edit" }}
                        </button>
                    </PermissionGate>
                </header>
                <CollectionSourceList collection_id=collection_id edit=editing/>
            </div>
        </Show>
    }
}

#[component]
fn CollectionHeader(collection_id: Signal<CollectionId>) -> impl IntoView {
    let collection = LocalResource::new(move || crate::net::api::fetch_collection(collection_id.get()));

    view! {
        <Suspense fallback=move || view! { <h1>"Collection"</h1> }>
            {move || {
                collection
                    .get()
                    .map(|result| match result {
                        Ok(found) => {
                            view! {
                                <h1>{found.name}</h1>
                                {found.notes.map(|notes| view! { <p class="collection-page__notes">{notes}</p> })}
                            }
                                .into_any()
                        }
                        Err(err) => {
                            view! {
                                <h1>{format!("Collection {}", collection_id.get_untracked())}</h1>
                                <p class="collection-page__error">{err.to_string()}</p>
                            }
                                .into_any()
                        }
                    })
            }}
        </Suspense>
    }
}
