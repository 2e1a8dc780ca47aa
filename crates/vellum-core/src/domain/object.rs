//! Stored object model: catalog rows and their external view.
//!
//! A `StoredObject` row exists iff its bytes are present in the blob backend
//! under `name`. Rows are created once and never updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{InternalId, PublicId};

/// カタログに挿入する前のレコード（InternalId はカタログが採番する）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewObject {
    pub public_id: PublicId,
    /// Blob backend のキーでもある（カタログ全体で一意）
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// base64 エンコード済みの署名
    pub signature: String,
    pub created_at: DateTime<Utc>,
}

impl NewObject {
    /// 採番済みの InternalId を付けて StoredObject にする
    pub fn into_stored(self, internal_id: InternalId) -> StoredObject {
        StoredObject {
            internal_id,
            public_id: self.public_id,
            name: self.name,
            mime_type: self.mime_type,
            size_bytes: self.size_bytes,
            signature: self.signature,
            created_at: self.created_at,
        }
    }
}

/// StoredObject はカタログの 1 行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub internal_id: InternalId,
    pub public_id: PublicId,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub signature: String,
    pub created_at: DateTime<Utc>,
}

impl StoredObject {
    /// 外部向けのメタデータ（internal_id は含めない）
    pub fn meta(&self) -> ObjectMeta {
        ObjectMeta {
            public_id: self.public_id.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes,
            signature: self.signature.clone(),
        }
    }
}

/// Metadata listing entry for API responses.
///
/// This is the only shape that leaves the core; `internal_id` never appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub public_id: PublicId,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub signature: String,
}

impl From<&StoredObject> for ObjectMeta {
    fn from(object: &StoredObject) -> Self {
        object.meta()
    }
}
