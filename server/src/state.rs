//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the directory repository behind a trait object so handlers can be
//! exercised against an in-memory store.

use std::sync::Arc;

use crate::services::directory::DirectoryRepo;

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn DirectoryRepo>,
}

impl AppState {
    #[must_use]
    pub fn new(repo: Arc<dyn DirectoryRepo>) -> Self {
        Self { repo }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use model::{AssociationKey, AssociationList, Collection, CollectionId, CurrentUser, Role, Source, SourceId};

    use super::*;
    use crate::services::directory::DirectoryError;

    pub const STAFF_TOKEN: &str = "staff-token";
    pub const USER_TOKEN: &str = "user-token";

    /// In-memory `DirectoryRepo` with a small seeded directory.
    #[derive(Default)]
    pub struct InMemoryRepo {
        pub collections: Vec<Collection>,
        pub sources: Vec<Source>,
        pub links: Mutex<BTreeSet<(i64, i64)>>,
        pub sessions: HashMap<String, CurrentUser>,
    }

    impl InMemoryRepo {
        fn sorted_sources(&self, ids: impl Iterator<Item = i64>) -> Vec<Source> {
            let ids: BTreeSet<i64> = ids.collect();
            let mut sources: Vec<Source> = self.sources.iter().filter(|s| ids.contains(&s.id.0)).cloned().collect();
            sources.sort_by(|a, b| a.name.cmp(&b.name));
            sources
        }
    }

    #[async_trait]
    impl DirectoryRepo for InMemoryRepo {
        async fn collection(&self, id: CollectionId) -> Result<Collection, DirectoryError> {
            self.collections
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or(DirectoryError::CollectionNotFound(id))
        }

        async fn featured_collections(&self) -> Result<Vec<Collection>, DirectoryError> {
            Ok(self.collections.iter().filter(|c| c.featured).cloned().collect())
        }

        async fn collection_sources(&self, id: CollectionId) -> Result<AssociationList, DirectoryError> {
            self.collection(id).await?;
            let links = self.links.lock().expect("links lock");
            let ids = links.iter().filter(|(_, c)| *c == id.0).map(|(s, _)| *s);
            Ok(AssociationList { sources: self.sorted_sources(ids) })
        }

        async fn source_collections(&self, id: SourceId) -> Result<Vec<Collection>, DirectoryError> {
            if !self.sources.iter().any(|s| s.id == id) {
                return Err(DirectoryError::SourceNotFound(id));
            }
            let links = self.links.lock().expect("links lock");
            Ok(self
                .collections
                .iter()
                .filter(|c| links.contains(&(id.0, c.id.0)))
                .cloned()
                .collect())
        }

        async fn remove_association(&self, key: AssociationKey) -> Result<(), DirectoryError> {
            let mut links = self.links.lock().expect("links lock");
            if links.remove(&(key.source_id.0, key.collection_id.0)) {
                Ok(())
            } else {
                Err(DirectoryError::AssociationNotFound(key))
            }
        }

        async fn session_user(&self, token: &str) -> Result<Option<CurrentUser>, DirectoryError> {
            Ok(self.sessions.get(token).cloned())
        }
    }

    #[must_use]
    pub fn user(role: Role) -> CurrentUser {
        CurrentUser { id: format!("u-{}", role.as_str()), name: format!("{} user", role.as_str()), role }
    }

    fn source(id: i64, name: &str) -> Source {
        Source { id: SourceId(id), name: name.to_owned(), label: None, homepage: None, platform: None }
    }

    /// Collection 42 holds sources 1 ("A") and 2 ("B"); collection 7 is
    /// featured and holds source 2.
    #[must_use]
    pub fn seeded_repo() -> InMemoryRepo {
        InMemoryRepo {
            collections: vec![
                Collection { id: CollectionId(42), name: "Local News".into(), notes: None, featured: false },
                Collection { id: CollectionId(7), name: "National".into(), notes: Some("US".into()), featured: true },
            ],
            sources: vec![source(1, "A"), source(2, "B"), source(3, "C")],
            links: Mutex::new([(1, 42), (2, 42), (2, 7)].into_iter().collect()),
            sessions: [
                (STAFF_TOKEN.to_owned(), user(Role::Staff)),
                (USER_TOKEN.to_owned(), user(Role::User)),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(Arc::new(seeded_repo()))
    }
}
