//! Blob backends built on `object_store`.
//!
//! # 含まれる実装
//! - **S3BlobBackend**: 本番用（リモート S3 / MinIO）
//! - **LocalBlobBackend**: ローカル/テスト用（メモリ or ファイルシステム）
//!
//! 両者とも `object_store::ObjectStore` に委譲するので、put/get の意味論は同じです。
//! 違うのは init() で何を確立するかだけ。

pub mod local;
pub mod s3;

pub use self::local::LocalBlobBackend;
pub use self::s3::S3BlobBackend;

use std::sync::Arc;

use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::BlobStoreConfig;
use crate::ports::{BackendError, BlobBackend};

/// 設定（デプロイメントプロファイル）から backend を選ぶ
///
/// 起動時に 1 回だけ呼ぶ。以後は `dyn BlobBackend` としてしか扱わない。
pub fn backend_from_config(config: &BlobStoreConfig) -> Arc<dyn BlobBackend> {
    match config {
        BlobStoreConfig::S3(s3) => Arc::new(S3BlobBackend::new(s3)),
        BlobStoreConfig::Local { root } => Arc::new(LocalBlobBackend::directory(root)),
        BlobStoreConfig::Memory => Arc::new(LocalBlobBackend::in_memory()),
    }
}

/// init() で確立される ObjectStore ハンドル
type StoreCell = OnceCell<Arc<dyn ObjectStore>>;

/// カタログの名前を 1 セグメントのキーにする
///
/// `/` や `%` も percent-encode されるので、名前とキーは 1 対 1 になる。
/// `Path::from` は `/` で分割して空セグメントを捨てるので使わない
/// （`dir/a.png` と `dir//a.png` が同じキーになってしまう）。
fn object_path(key: &str) -> ObjectPath {
    ObjectPath::from_iter([key])
}

fn initialized(cell: &StoreCell) -> Result<&Arc<dyn ObjectStore>, BackendError> {
    cell.get().ok_or(BackendError::NotInitialized)
}

async fn put_object(
    store: &dyn ObjectStore,
    backend: &str,
    key: &str,
    payload: Bytes,
) -> Result<(), BackendError> {
    let size = payload.len();
    let location = object_path(key);
    match store.put(&location, PutPayload::from(payload)).await {
        Ok(_) => {
            info!(backend, name = key, size, "object stored");
            Ok(())
        }
        Err(err) => {
            error!(backend, name = key, size, error = %err, "could not store object");
            Err(BackendError::operation(key, err))
        }
    }
}

async fn get_object(store: &dyn ObjectStore, backend: &str, key: &str) -> Result<Bytes, BackendError> {
    let location = object_path(key);
    let result = match store.get(&location).await {
        Ok(result) => result,
        Err(object_store::Error::NotFound { .. }) => {
            error!(backend, name = key, "object not found");
            return Err(BackendError::NotFound(key.to_string()));
        }
        Err(err) => {
            error!(backend, name = key, error = %err, "could not fetch object");
            return Err(BackendError::operation(key, err));
        }
    };

    let bytes = result
        .bytes()
        .await
        .map_err(|err| BackendError::operation(key, err))?;
    info!(backend, name = key, size = bytes.len(), "object fetched");
    Ok(bytes)
}
