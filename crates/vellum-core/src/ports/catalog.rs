//! Catalog port - メタデータの正本（source of truth）
//!
//! Catalog は public id → StoredObject の対応を永続化します。
//!
//! # 実装
//! - **InMemoryCatalog**: テスト・開発用
//! - **JsonFileCatalog**: 追記専用の JSON Lines ファイル（CLI 用）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{InternalId, NewObject, PublicId, StoredObject};

/// Catalog はどの名前が存在するかの唯一の正本
///
/// # 設計原則
/// - insert は追記のみ（update / delete はない）
/// - 1 行単位の原子性だけを前提にする（トランザクションはない）
/// - name と public_id はそれぞれカタログ全体で一意
/// - insert はアップロードの最後のコミット操作
#[async_trait]
pub trait Catalog: Send + Sync {
    /// 行を追加して採番された InternalId を返す
    async fn insert(&self, record: NewObject) -> Result<InternalId, CatalogError>;

    async fn find_by_public_id(&self, id: &PublicId) -> Result<Option<StoredObject>, CatalogError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<StoredObject>, CatalogError>;

    /// 全行を挿入順（InternalId 順）で返す
    async fn list_all(&self) -> Result<Vec<StoredObject>, CatalogError>;
}

/// CatalogError はカタログ操作の失敗
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("name already recorded: {0}")]
    DuplicateName(String),

    #[error("public id already recorded: {0}")]
    DuplicatePublicId(PublicId),

    #[error("catalog io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog line {line} is corrupt")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
