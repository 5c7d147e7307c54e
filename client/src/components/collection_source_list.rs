//! Sources associated with a collection, read-only or editable.
//!
//! DESIGN
//! ======
//! Rendering is split into a pure view model (`source_list_view`) and the
//! Leptos component that draws it. The component holds no copy of the source
//! list: it subscribes to the association cache for its collection and
//! re-derives the view model whenever the cache entry or `edit` changes.
//!
//! Row keys depend only on the source id, so flipping `edit` keeps every row
//! mounted and only adds or drops its removal control.

#[cfg(test)]
#[path = "collection_source_list_test.rs"]
mod collection_source_list_test;

use leptos::prelude::*;

use crate::components::source_item::SourceItem;
use crate::net::types::{AssociationKey, CollectionId, Source, SourceId};
use crate::state::associations::{AssociationContext, QueryEntry, QueryState};

// =============================================================================
// VIEW MODEL
// =============================================================================

/// Which of the list's top-level states to draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListPhase {
    Loading,
    Failed(String),
    Loaded,
}

/// Remove button for one row in edit mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovalControl {
    pub key: String,
    pub request: AssociationKey,
    /// A removal for this source is in flight.
    pub pending: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceRow {
    pub key: String,
    pub source: Source,
    pub removal: Option<RemovalControl>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceListView {
    pub phase: ListPhase,
    pub header: String,
    pub rows: Vec<SourceRow>,
    pub notice: Option<String>,
}

impl SourceListView {
    fn loading() -> Self {
        Self { phase: ListPhase::Loading, header: String::new(), rows: Vec::new(), notice: None }
    }

    #[must_use]
    pub fn removal_count(&self) -> usize {
        self.rows.iter().filter(|row| row.removal.is_some()).count()
    }

    #[must_use]
    pub fn removal_for(&self, source_id: SourceId) -> Option<RemovalControl> {
        self.rows
            .iter()
            .find(|row| row.source.id == source_id)
            .and_then(|row| row.removal.clone())
    }
}

#[must_use]
pub fn header_text(count: usize, edit: bool) -> String {
    if edit {
        format!("This Collection has {count} Sources")
    } else {
        format!("Associated with {count} Sources")
    }
}

#[must_use]
pub fn row_key(source_id: SourceId) -> String {
    format!("source-{source_id}")
}

#[must_use]
pub fn removal_key(source_id: SourceId) -> String {
    format!("edit-{source_id}")
}

/// Derive what to draw for `collection_id` from its cache entry.
///
/// A missing entry means nobody has subscribed yet and renders as loading.
#[must_use]
pub fn source_list_view(entry: Option<&QueryEntry>, collection_id: CollectionId, edit: bool) -> SourceListView {
    let Some(entry) = entry else {
        return SourceListView::loading();
    };

    let list = match entry.state() {
        QueryState::Pending => return SourceListView::loading(),
        QueryState::Failed(err) => {
            return SourceListView {
                phase: ListPhase::Failed(format!("Could not load sources: {err}")),
                header: String::new(),
                rows: Vec::new(),
                notice: None,
            };
        }
        QueryState::Loaded(list) => list,
    };

    let rows = list
        .sources
        .iter()
        .map(|source| SourceRow {
            key: row_key(source.id),
            source: source.clone(),
            removal: edit.then(|| RemovalControl {
                key: removal_key(source.id),
                request: AssociationKey { source_id: source.id, collection_id },
                pending: entry.is_removing(source.id),
            }),
        })
        .collect();

    let notice = entry
        .removal_failure()
        .map(|failure| format!("Could not remove source {}: {}", failure.source_id, failure.error));

    SourceListView { phase: ListPhase::Loaded, header: header_text(list.len(), edit), rows, notice }
}

// =============================================================================
// COMPONENTS
// =============================================================================

/// Source list for one collection.
///
/// `edit` switches between the read-only list and one with a Remove button per
/// source. Changing `collection_id` moves the subscription to the new
/// collection; changing `edit` never triggers a fetch.
#[component]
pub fn CollectionSourceList(
    #[prop(into)] collection_id: Signal<CollectionId>,
    #[prop(into)] edit: Signal<bool>,
) -> impl IntoView {
    let ctx = expect_context::<AssociationContext>();
    let cache = ctx.cache;

    let subscribed = StoredValue::new(None::<CollectionId>);
    let subscribe_ctx = ctx.clone();
    Effect::new(move || {
        let id = collection_id.get();
        let previous = subscribed.get_value();
        if previous == Some(id) {
            return;
        }
        if let Some(old) = previous {
            cache.update(|c| c.unsubscribe(old));
        }
        subscribed.set_value(Some(id));
        if let Some(ticket) = cache.try_update(|c| c.subscribe(id)).flatten() {
            subscribe_ctx.spawn_fetch(id, ticket);
        }
    });
    on_cleanup(move || {
        if let Some(id) = subscribed.try_get_value().flatten() {
            cache.try_update(|c| c.unsubscribe(id));
        }
    });

    let view_model = Memo::new(move |_| {
        let id = collection_id.get();
        let edit = edit.get();
        cache.with(|c| source_list_view(c.entry(id), id, edit))
    });
    let phase = Memo::new(move |_| view_model.with(|v| v.phase.clone()));
    let header = move || view_model.with(|v| v.header.clone());
    let notice = move || view_model.with(|v| v.notice.clone());
    let rows = move || view_model.with(|v| v.rows.clone());

    let retry_ctx = ctx.clone();
    let on_retry = move |_| retry_ctx.spawn_load(collection_id.get_untracked());
    let on_remove = Callback::new(move |request: AssociationKey| ctx.spawn_remove(request));

    move || match phase.get() {
        ListPhase::Loading => {
            view! {
                <div class="collection-associations__loading">
                    <span class="spinner" role="progressbar" aria-label="Loading sources"></span>
                </div>
            }
                .into_any()
        }
        ListPhase::Failed(message) => {
            view! {
                <div class="collection-associations collection-associations--failed">
                    <p class="collection-associations__error">{message}</p>
                    <button class="btn" on:click=on_retry.clone()>"Retry"</button>
                </div>
            }
                .into_any()
        }
        ListPhase::Loaded => {
            view! {
                <div class="collection-associations">
                    <h2>{header}</h2>
                    {move || notice().map(|text| view! { <p class="collection-associations__notice">{text}</p> })}
                    <For
                        each=rows
                        key=|row| row.key.clone()
                        children=move |row| view! { <SourceRowView row=row view_model=view_model on_remove=on_remove/> }
                    />
                </div>
            }
                .into_any()
        }
    }
}

/// One collection item. The removal control is looked up from the current
/// view model so the row itself survives `edit` toggles.
#[component]
fn SourceRowView(
    row: SourceRow,
    view_model: Memo<SourceListView>,
    on_remove: Callback<AssociationKey>,
) -> impl IntoView {
    let source_id = row.source.id;
    let removal = Memo::new(move |_| view_model.with(|v| v.removal_for(source_id)));

    view! {
        <div class="collection-item" data-key=row.key>
            <SourceItem source=row.source/>
            {move || {
                removal
                    .get()
                    .map(|control| {
                        let request = control.request;
                        view! {
                            <button
                                class="btn btn--outlined"
                                data-key=control.key
                                disabled=control.pending
                                on:click=move |_| on_remove.run(request)
                            >
                                "Remove"
                            </button>
                        }
                    })
            }}
        </div>
    }
}
