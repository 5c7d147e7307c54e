//! Directory persistence: collections, sources, their associations, and
//! session lookup.
//!
//! DESIGN
//! ======
//! Handlers talk to `DirectoryRepo`, not to SQL. `PgDirectoryRepo` is the
//! production implementation; tests substitute an in-memory repo.

use async_trait::async_trait;
use model::{
    AssociationKey, AssociationList, Collection, CollectionId, CurrentUser, Role, Source, SourceId,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("collection not found: {0}")]
    CollectionNotFound(CollectionId),
    #[error("source not found: {0}")]
    SourceNotFound(SourceId),
    #[error("source {} is not in collection {}", .0.source_id, .0.collection_id)]
    AssociationNotFound(AssociationKey),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read/write access to the directory store.
#[async_trait]
pub trait DirectoryRepo: Send + Sync {
    async fn collection(&self, id: CollectionId) -> Result<Collection, DirectoryError>;

    async fn featured_collections(&self) -> Result<Vec<Collection>, DirectoryError>;

    /// Sources associated with a collection, ordered by name.
    async fn collection_sources(&self, id: CollectionId) -> Result<AssociationList, DirectoryError>;

    /// Collections a source belongs to, ordered by name.
    async fn source_collections(&self, id: SourceId) -> Result<Vec<Collection>, DirectoryError>;

    async fn remove_association(&self, key: AssociationKey) -> Result<(), DirectoryError>;

    /// Resolve a session token to its user, or `None` if unknown/expired.
    async fn session_user(&self, token: &str) -> Result<Option<CurrentUser>, DirectoryError>;
}

/// Parse a stored role, degrading unknown values to `Anonymous`.
pub(crate) fn role_from_column(raw: &str) -> Role {
    Role::parse(raw).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "unrecognized stored role; treating as anonymous");
        Role::Anonymous
    })
}

fn collection_from_row(row: &PgRow) -> Collection {
    Collection {
        id: CollectionId(row.get("id")),
        name: row.get("name"),
        notes: row.get("notes"),
        featured: row.get("featured"),
    }
}

fn source_from_row(row: &PgRow) -> Source {
    Source {
        id: SourceId(row.get("id")),
        name: row.get("name"),
        label: row.get("label"),
        homepage: row.get("homepage"),
        platform: row.get("platform"),
    }
}

/// `PostgreSQL`-backed [`DirectoryRepo`].
pub struct PgDirectoryRepo {
    pool: PgPool,
}

impl PgDirectoryRepo {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn collection_exists(&self, id: CollectionId) -> Result<bool, DirectoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM collections WHERE id = $1)")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn source_exists(&self, id: SourceId) -> Result<bool, DirectoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sources WHERE id = $1)")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl DirectoryRepo for PgDirectoryRepo {
    async fn collection(&self, id: CollectionId) -> Result<Collection, DirectoryError> {
        let row = sqlx::query("SELECT id, name, notes, featured FROM collections WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DirectoryError::CollectionNotFound(id))?;
        Ok(collection_from_row(&row))
    }

    async fn featured_collections(&self) -> Result<Vec<Collection>, DirectoryError> {
        let rows = sqlx::query("SELECT id, name, notes, featured FROM collections WHERE featured ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(collection_from_row).collect())
    }

    async fn collection_sources(&self, id: CollectionId) -> Result<AssociationList, DirectoryError> {
        if !self.collection_exists(id).await? {
            return Err(DirectoryError::CollectionNotFound(id));
        }
        let rows = sqlx::query(
            r"SELECT s.id, s.name, s.label, s.homepage, s.platform
              FROM source_collections sc
              JOIN sources s ON s.id = sc.source_id
              WHERE sc.collection_id = $1
              ORDER BY s.name, s.id",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(AssociationList { sources: rows.iter().map(source_from_row).collect() })
    }

    async fn source_collections(&self, id: SourceId) -> Result<Vec<Collection>, DirectoryError> {
        if !self.source_exists(id).await? {
            return Err(DirectoryError::SourceNotFound(id));
        }
        let rows = sqlx::query(
            r"SELECT c.id, c.name, c.notes, c.featured
              FROM source_collections sc
              JOIN collections c ON c.id = sc.collection_id
              WHERE sc.source_id = $1
              ORDER BY c.name, c.id",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(collection_from_row).collect())
    }

    async fn remove_association(&self, key: AssociationKey) -> Result<(), DirectoryError> {
        let result = sqlx::query("DELETE FROM source_collections WHERE source_id = $1 AND collection_id = $2")
            .bind(key.source_id.0)
            .bind(key.collection_id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DirectoryError::AssociationNotFound(key));
        }
        Ok(())
    }

    async fn session_user(&self, token: &str) -> Result<Option<CurrentUser>, DirectoryError> {
        let row = sqlx::query(
            r"SELECT u.id, u.name, u.role
              FROM sessions s
              JOIN users u ON u.id = s.user_id
              WHERE s.token = $1 AND s.expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            let id: Uuid = r.get("id");
            let role: String = r.get("role");
            CurrentUser { id: id.to_string(), name: r.get("name"), role: role_from_column(&role) }
        }))
    }
}
