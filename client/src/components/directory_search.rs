//! Search box container on the directory landing page.

use leptos::prelude::*;

/// Submission target owned by the search subsystem.
pub const DIRECTORY_SEARCH_PATH: &str = "/directory/search";

#[component]
pub fn DirectorySearch() -> impl IntoView {
    view! {
        <form class="directory-search" method="get" action=DIRECTORY_SEARCH_PATH>
            <input
                class="directory-search__input"
                type="search"
                name="name"
                placeholder="Search sources and collections"
            />
            <button class="btn" type="submit">"Search"</button>
        </form>
    }
}
