//! Reference lookups: account type, currency and status codes to display names

use std::collections::BTreeMap;

use async_trait::async_trait;
use common::db::models::DbReference;
use common::db::DbPool;
use common::error::{Error, Result};
use common::model::account::ReferenceId;
use common::model::reference::{ReferenceCategory, ReferenceEntry};
use dashmap::DashMap;
use tracing::debug;

/// Resolves reference codes to display names
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Display name of `id` in `category`; unknown codes are a validation error
    async fn name_of(&self, category: ReferenceCategory, id: ReferenceId) -> Result<String>;

    /// Every entry of `category`, ordered by code
    async fn entries(&self, category: ReferenceCategory) -> Result<Vec<ReferenceEntry>>;
}

fn unknown_code(category: ReferenceCategory, id: ReferenceId) -> Error {
    Error::ValidationError(format!("Unknown {} code: {}", category, id))
}

/// In-memory reference tables
pub struct InMemoryReferenceLookup {
    tables: DashMap<ReferenceCategory, BTreeMap<ReferenceId, String>>,
}

impl Default for InMemoryReferenceLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryReferenceLookup {
    /// Create a lookup seeded with the default tables
    pub fn new() -> Self {
        let lookup = Self::empty();
        lookup.insert(ReferenceCategory::AccountType, 1, "Caja de ahorro");
        lookup.insert(ReferenceCategory::AccountType, 2, "Cuenta corriente");
        lookup.insert(ReferenceCategory::Currency, 1, "Peso argentino");
        lookup.insert(ReferenceCategory::Currency, 2, "Dólar estadounidense");
        lookup.insert(ReferenceCategory::AccountStatus, 1, "Activa");
        lookup.insert(ReferenceCategory::AccountStatus, 2, "Inhabilitada");
        lookup
    }

    /// Create a lookup with no entries
    pub fn empty() -> Self {
        Self { tables: DashMap::new() }
    }

    /// Add or rename an entry
    pub fn insert(&self, category: ReferenceCategory, id: ReferenceId, name: impl Into<String>) {
        self.tables.entry(category).or_default().insert(id, name.into());
    }
}

#[async_trait]
impl ReferenceLookup for InMemoryReferenceLookup {
    async fn name_of(&self, category: ReferenceCategory, id: ReferenceId) -> Result<String> {
        self.tables
            .get(&category)
            .and_then(|table| table.get(&id).cloned())
            .ok_or_else(|| unknown_code(category, id))
    }

    async fn entries(&self, category: ReferenceCategory) -> Result<Vec<ReferenceEntry>> {
        Ok(self
            .tables
            .get(&category)
            .map(|table| {
                table
                    .iter()
                    .map(|(id, name)| ReferenceEntry::new(*id, name.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Reference tables stored in PostgreSQL
pub struct PostgresReferenceLookup {
    pool: DbPool,
}

impl PostgresReferenceLookup {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceLookup for PostgresReferenceLookup {
    async fn name_of(&self, category: ReferenceCategory, id: ReferenceId) -> Result<String> {
        debug!("Resolving {} code {}", category, id);

        let sql = format!("SELECT name FROM {} WHERE id = $1", category.table());
        let name: Option<String> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        name.ok_or_else(|| unknown_code(category, id))
    }

    async fn entries(&self, category: ReferenceCategory) -> Result<Vec<ReferenceEntry>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY id", category.table());
        let rows = sqlx::query_as::<_, DbReference>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ReferenceEntry::from).collect())
    }
}
