//! Errors - エラー型と分類
//!
//! オーケストレーター（`app::ObjectStore`）が返すエラーは [`StoreError`] のみです。
//! 各ポートのエラー（SignError / BackendError / CatalogError）は
//! ここで包まれて、どのステージで失敗したかが分かる形で外に出ます。
//!
//! # 分類
//! - InvalidArgument: 呼び出し側の値が不正（I/O の前に失敗）
//! - Rejected: 上流のバリデーターが拒否（サイズ超過・名前重複・MIME 不許可）
//! - SignatureFailure: 鍵・アルゴリズム・署名プリミティブの失敗
//! - StorageFailure: backend の put/get、カタログの操作、またはキャンセル
//! - NotFound: public id に対応する行がない

use std::fmt;

use thiserror::Error;

use crate::app::validator::ValidationError;
use crate::ports::{BackendError, CatalogError, SignError};

/// ErrorKind は外部 API 層向けの安定した分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    Rejected,
    SignatureFailure,
    StorageFailure,
    NotFound,
}

/// ResponseClass は API 層がクライアントに返す応答の大分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseClass {
    BadRequest,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn response_class(&self) -> ResponseClass {
        match self {
            ErrorKind::InvalidArgument | ErrorKind::Rejected => ResponseClass::BadRequest,
            ErrorKind::NotFound => ResponseClass::NotFound,
            ErrorKind::SignatureFailure | ErrorKind::StorageFailure => ResponseClass::Internal,
        }
    }
}

/// StorageStage はストレージ系の失敗がどこで起きたか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageStage {
    BlobPut,
    BlobGet,
    CatalogInsert,
    CatalogLookup,
    CatalogList,
}

impl fmt::Display for StorageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageStage::BlobPut => "blob put",
            StorageStage::BlobGet => "blob get",
            StorageStage::CatalogInsert => "catalog insert",
            StorageStage::CatalogLookup => "catalog lookup",
            StorageStage::CatalogList => "catalog list",
        };
        f.write_str(s)
    }
}

/// StorageCause は StorageFailure の原因
#[derive(Debug, Error)]
pub enum StorageCause {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// backend タスクの await が中断された（キャンセル or panic）
    #[error("cancelled: {0}")]
    Cancelled(String),
}

/// StoreError はオーケストレーターのエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("upload rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("signature failure: {0}")]
    SignatureFailure(#[source] SignError),

    #[error("storage failure during {stage}: {cause}")]
    StorageFailure {
        stage: StorageStage,
        #[source]
        cause: StorageCause,
    },

    #[error("not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub fn storage(stage: StorageStage, cause: impl Into<StorageCause>) -> Self {
        StoreError::StorageFailure {
            stage,
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            StoreError::Rejected(_) => ErrorKind::Rejected,
            StoreError::SignatureFailure(_) => ErrorKind::SignatureFailure,
            StoreError::StorageFailure { .. } => ErrorKind::StorageFailure,
            StoreError::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// StorageFailure の場合のみステージを返す
    pub fn stage(&self) -> Option<StorageStage> {
        match self {
            StoreError::StorageFailure { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            StoreError::StorageFailure {
                cause: StorageCause::Cancelled(_),
                ..
            }
        )
    }
}

impl From<SignError> for StoreError {
    /// MissingContext は呼び出し側の契約違反なので InvalidArgument に寄せる
    fn from(err: SignError) -> Self {
        match err {
            SignError::MissingContext => StoreError::InvalidArgument(err.to_string()),
            other => StoreError::SignatureFailure(other),
        }
    }
}
