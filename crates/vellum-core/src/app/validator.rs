//! UploadValidator - アップロード前の検証（上流のコラボレーター）
//!
//! ObjectStore 自身は名前の重複チェックをしません。
//! API 層（ここでは CLI）が upload の前にこれを呼びます。
//!
//! # 拒否する条件
//! - サイズが `max_size_bytes` を超える
//! - 名前がすでにカタログにある
//! - MIME type が許可リストにない

use thiserror::Error;
use tracing::warn;

use crate::config::UploadPolicy;
use crate::domain::{StorageStage, StoreError};
use crate::ports::Catalog;

/// ValidationError はバリデーターが拒否した理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("object {name:?} is too large ({size} bytes, limit {limit})")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("object name {0:?} is already used")]
    NameInUse(String),

    #[error("object {name:?} has a type that is not allowed ({mime_type})")]
    MimeTypeNotAllowed { name: String, mime_type: String },
}

/// UploadValidator は UploadPolicy に従ってアップロードを検証する
#[derive(Debug, Clone)]
pub struct UploadValidator {
    policy: UploadPolicy,
}

impl UploadValidator {
    pub fn new(policy: &UploadPolicy) -> Self {
        Self {
            policy: policy.clone(),
        }
    }

    /// カタログに問い合わせずに済む検証（サイズ・MIME type）
    pub fn check_static(&self, name: &str, mime_type: &str, size: u64) -> Result<(), ValidationError> {
        if size > self.policy.max_size_bytes {
            return Err(ValidationError::TooLarge {
                name: name.to_string(),
                size,
                limit: self.policy.max_size_bytes,
            });
        }
        let allowed = self
            .policy
            .allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime_type.trim()));
        if !allowed {
            return Err(ValidationError::MimeTypeNotAllowed {
                name: name.to_string(),
                mime_type: mime_type.to_string(),
            });
        }
        Ok(())
    }

    /// 全ての検証を行う
    pub async fn validate(
        &self,
        name: &str,
        mime_type: &str,
        size: u64,
        catalog: &dyn Catalog,
    ) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidArgument("object name is empty".into()));
        }

        let result = match self.check_static(name, mime_type, size) {
            Ok(()) => match catalog.find_by_name(name).await {
                Ok(Some(_)) => Err(ValidationError::NameInUse(name.to_string())),
                Ok(None) => Ok(()),
                Err(err) => return Err(StoreError::storage(StorageStage::CatalogLookup, err)),
            },
            Err(err) => Err(err),
        };

        result.map_err(|err| {
            warn!(name, error = %err, "upload rejected");
            StoreError::Rejected(err)
        })
    }
}
