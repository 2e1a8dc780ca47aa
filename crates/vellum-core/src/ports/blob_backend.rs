//! BlobBackend port - Blob ストレージ（S3/Local/Memory）
//!
//! BlobBackend は「名前で bytes を置く」「名前で bytes を取る」だけの抽象です。
//!
//! # 実装
//! - **S3BlobBackend**: 本番用（`impls::blob::s3`）
//! - **LocalBlobBackend**: ローカル/テスト用（`impls::blob::local`）
//!
//! どの実装を使うかは起動時の設定（`BlobStoreConfig`）で決まります。
//! オーケストレーターは具体的な実装を知りません。

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// BlobBackend は bytes を名前で保存・取得する
///
/// # 設計原則
/// - カタログが正本で、BlobBackend はそれに追従するだけ
/// - 上書きの可否は実装依存（オーケストレーターは未登録の名前にしか put しない）
/// - 失敗は必ず BackendError で返す（空の結果で誤魔化さない）
/// - タイムアウトとリトライは実装側のトランスポート層の責務
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// 接続・セッションを確立する（起動時に 1 回だけ呼ばれる）
    ///
    /// 失敗は [`BackendError::Init`]。自動リトライはしない。
    async fn init(&self) -> Result<(), BackendError>;

    /// `payload` を `key` に保存
    async fn put(&self, key: &str, payload: Bytes) -> Result<(), BackendError>;

    /// `key` の bytes を取得。存在しなければ [`BackendError::NotFound`]
    async fn get(&self, key: &str) -> Result<Bytes, BackendError>;
}

/// BackendError は Blob backend の失敗
#[derive(Debug, Error)]
pub enum BackendError {
    /// init() の失敗（backend は利用不可）
    #[error("backend initialization failed: {message}")]
    Init {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("backend used before init()")]
    NotInitialized,

    /// backend 側に key が存在しない（カタログ側の不在とは別物）
    #[error("object not found in backend: {0}")]
    NotFound(String),

    /// backend のネイティブエラーをそのまま包む
    #[error("backend operation on {key:?} failed")]
    Operation {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl BackendError {
    pub fn init(message: impl Into<String>) -> Self {
        BackendError::Init {
            message: message.into(),
            source: None,
        }
    }

    pub fn init_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        BackendError::Init {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn operation(
        key: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        BackendError::Operation {
            key: key.into(),
            source: Box::new(source),
        }
    }
}
