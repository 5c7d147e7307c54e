//! Single-source summary used by collection listings.

#[cfg(test)]
#[path = "source_item_test.rs"]
mod source_item_test;

use leptos::prelude::*;

use crate::net::types::Source;

/// Link to a source's detail page plus its homepage and platform, when known.
#[component]
pub fn SourceItem(source: Source) -> impl IntoView {
    let href = format!("/sources/{}", source.id);
    let name = source.display_name().to_owned();

    view! {
        <div class="source-item">
            <a class="source-item__name" href=href>{name}</a>
            {source.homepage.map(|url| {
                let label = url.clone();
                view! {
                    <a class="source-item__homepage" href=url target="_blank" rel="noreferrer">
                        {label}
                    </a>
                }
            })}
            {source.platform.map(|platform| view! { <span class="source-item__platform">{platform}</span> })}
        </div>
    }
}
