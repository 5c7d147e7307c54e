//! Featured collection links for the directory landing page.

use leptos::prelude::*;

use crate::net::types::{Collection, CollectionId};

pub(crate) fn collection_href(collection_id: CollectionId) -> String {
    format!("/collections/{collection_id}")
}

/// Fetches featured collections on mount and lists them as links.
#[component]
pub fn FeaturedCollections() -> impl IntoView {
    let featured = LocalResource::new(|| crate::net::api::fetch_featured_collections());

    view! {
        <section class="featured-collections">
            <h2>"Featured Collections"</h2>
            <Suspense fallback=move || view! { <p>"Loading collections..."</p> }>
                {move || {
                    featured
                        .get()
                        .map(|result| match result {
                            Ok(list) => {
                                view! {
                                    <ul class="featured-collections__list">
                                        {list
                                            .into_iter()
                                            .map(|collection| view! { <li><CollectionLink collection=collection/></li> })
                                            .collect::<Vec<_>>()}
                                    </ul>
                                }
                                    .into_any()
                            }
                            Err(err) => {
                                view! {
                                    <p class="featured-collections__error">
                                        {format!("Could not load featured collections: {err}")}
                                    </p>
                                }
                                    .into_any()
                            }
                        })
                }}
            </Suspense>
        </section>
    }
}

#[component]
fn CollectionLink(collection: Collection) -> impl IntoView {
    view! {
        <a class="featured-collections__link" href=collection_href(collection.id)>
            {collection.name}
        </a>
    }
}
