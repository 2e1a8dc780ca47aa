//! LocalBlobBackend - ローカル/テスト用の Blob backend
//!
//! 本番の S3 backend と同じ trait・同じ意味論で、クラウドの認証情報なしに動きます。
//! オーケストレーターとそのテストはこれを使います。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::ObjectStore;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use tracing::info;

use super::{StoreCell, get_object, initialized, put_object};
use crate::ports::{BackendError, BlobBackend};

const BACKEND: &str = "local";

#[derive(Debug, Clone)]
enum LocalMode {
    /// プロセス内メモリ
    Memory,
    /// root 配下のファイル
    Directory(PathBuf),
}

/// LocalBlobBackend はメモリまたはローカルディレクトリに保存する
pub struct LocalBlobBackend {
    mode: LocalMode,
    store: StoreCell,
}

impl LocalBlobBackend {
    pub fn in_memory() -> Self {
        Self {
            mode: LocalMode::Memory,
            store: StoreCell::new(),
        }
    }

    pub fn directory(root: impl AsRef<Path>) -> Self {
        Self {
            mode: LocalMode::Directory(root.as_ref().to_path_buf()),
            store: StoreCell::new(),
        }
    }

    async fn connect(&self) -> Result<Arc<dyn ObjectStore>, BackendError> {
        match &self.mode {
            LocalMode::Memory => {
                info!(backend = BACKEND, "in-memory blob store initialized");
                Ok(Arc::new(InMemory::new()))
            }
            LocalMode::Directory(root) => {
                tokio::fs::create_dir_all(root).await.map_err(|e| {
                    BackendError::init_with(format!("cannot create {}", root.display()), e)
                })?;
                let store = LocalFileSystem::new_with_prefix(root).map_err(|e| {
                    BackendError::init_with(format!("cannot open {}", root.display()), e)
                })?;
                info!(backend = BACKEND, root = %root.display(), "filesystem blob store initialized");
                Ok(Arc::new(store))
            }
        }
    }
}

#[async_trait]
impl BlobBackend for LocalBlobBackend {
    async fn init(&self) -> Result<(), BackendError> {
        self.store.get_or_try_init(|| self.connect()).await?;
        Ok(())
    }

    async fn put(&self, key: &str, payload: Bytes) -> Result<(), BackendError> {
        let store = initialized(&self.store)?;
        put_object(store.as_ref(), BACKEND, key, payload).await
    }

    async fn get(&self, key: &str) -> Result<Bytes, BackendError> {
        let store = initialized(&self.store)?;
        get_object(store.as_ref(), BACKEND, key).await
    }
}
