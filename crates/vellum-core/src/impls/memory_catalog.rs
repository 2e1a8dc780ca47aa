//! In-memory catalog implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{InternalId, NewObject, PublicId, StoredObject};
use crate::ports::{Catalog, CatalogError};

/// Catalog rows plus unique indexes.
///
/// Shared by `InMemoryCatalog` and `JsonFileCatalog`.
#[derive(Debug, Default)]
pub(crate) struct CatalogIndex {
    /// Rows in insertion order (single source of truth).
    rows: Vec<StoredObject>,

    /// public_id -> index into `rows`.
    by_public_id: HashMap<PublicId, usize>,

    /// name -> index into `rows`.
    by_name: HashMap<String, usize>,

    /// Last assigned internal id.
    last_id: InternalId,
}

impl CatalogIndex {
    /// Check uniqueness constraints without mutating anything.
    pub(crate) fn check(&self, record: &NewObject) -> Result<(), CatalogError> {
        if self.by_name.contains_key(&record.name) {
            return Err(CatalogError::DuplicateName(record.name.clone()));
        }
        if self.by_public_id.contains_key(&record.public_id) {
            return Err(CatalogError::DuplicatePublicId(record.public_id.clone()));
        }
        Ok(())
    }

    /// Build the row the next insert would create (after `check`).
    pub(crate) fn prepare(&self, record: NewObject) -> StoredObject {
        record.into_stored(self.last_id.next())
    }

    /// Append a row; ids must be increasing and keys unique.
    pub(crate) fn push(&mut self, row: StoredObject) -> Result<InternalId, CatalogError> {
        if self.by_name.contains_key(&row.name) {
            return Err(CatalogError::DuplicateName(row.name));
        }
        if self.by_public_id.contains_key(&row.public_id) {
            return Err(CatalogError::DuplicatePublicId(row.public_id));
        }
        let id = row.internal_id;
        let index = self.rows.len();
        self.by_public_id.insert(row.public_id.clone(), index);
        self.by_name.insert(row.name.clone(), index);
        self.rows.push(row);
        if id > self.last_id {
            self.last_id = id;
        }
        Ok(id)
    }

    pub(crate) fn by_public_id(&self, id: &PublicId) -> Option<&StoredObject> {
        self.by_public_id.get(id).map(|&i| &self.rows[i])
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<&StoredObject> {
        self.by_name.get(name).map(|&i| &self.rows[i])
    }

    pub(crate) fn rows(&self) -> &[StoredObject] {
        &self.rows
    }
}

/// InMemoryCatalog はテスト・開発用のカタログ
///
/// プロセスが終わると内容は消えます。
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    index: RwLock<CatalogIndex>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn insert(&self, record: NewObject) -> Result<InternalId, CatalogError> {
        let mut index = self.index.write().await;
        index.check(&record)?;
        let row = index.prepare(record);
        index.push(row)
    }

    async fn find_by_public_id(&self, id: &PublicId) -> Result<Option<StoredObject>, CatalogError> {
        Ok(self.index.read().await.by_public_id(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<StoredObject>, CatalogError> {
        Ok(self.index.read().await.by_name(name).cloned())
    }

    async fn list_all(&self) -> Result<Vec<StoredObject>, CatalogError> {
        Ok(self.index.read().await.rows().to_vec())
    }
}
