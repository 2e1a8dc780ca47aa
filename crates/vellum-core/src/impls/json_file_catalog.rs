//! JsonFileCatalog - 追記専用の JSON Lines カタログ
//!
//! 1 行 = 1 StoredObject。insert はファイルへの追記が完了してから
//! メモリ上のインデックスに反映します（ファイルが正本）。
//! open() 時にファイル全体を読み直してインデックスを再構築します。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::memory_catalog::CatalogIndex;
use crate::domain::{InternalId, NewObject, PublicId, StoredObject};
use crate::ports::{Catalog, CatalogError};

/// JsonFileCatalog は JSON Lines ファイルに永続化するカタログ
pub struct JsonFileCatalog {
    path: PathBuf,
    /// insert はファイル追記を含むので、ロックを跨いで await する（tokio::sync::Mutex）
    index: Mutex<CatalogIndex>,
}

impl JsonFileCatalog {
    /// ファイルを開いて（なければ作らずに空として）インデックスを構築
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        let mut index = CatalogIndex::default();

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                for (i, line) in contents.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let row: StoredObject = serde_json::from_str(line)
                        .map_err(|source| CatalogError::Corrupt { line: i + 1, source })?;
                    index.push(row)?;
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        info!(path = %path.display(), rows = index.rows().len(), "catalog opened");
        Ok(Self {
            path,
            index: Mutex::new(index),
        })
    }

    async fn append(&self, row: &StoredObject) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_vec(row)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let committed = file.metadata().await?.len();

        if let Err(err) = write_line(&mut file, &line).await {
            rollback(&mut file, committed, &self.path).await;
            return Err(err.into());
        }
        Ok(())
    }
}

async fn write_line(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.sync_data().await
}

/// 追記に失敗したら書き込み前の長さに戻す
///
/// 途中まで書かれた行や、sync されずインデックスにも載らない行を残さない。
async fn rollback(file: &mut File, committed: u64, path: &Path) {
    match file.set_len(committed).await {
        Ok(()) => warn!(path = %path.display(), len = committed, "catalog append rolled back"),
        Err(err) => error!(
            path = %path.display(),
            len = committed,
            error = %err,
            "could not roll back catalog append"
        ),
    }
}

#[async_trait]
impl Catalog for JsonFileCatalog {
    async fn insert(&self, record: NewObject) -> Result<InternalId, CatalogError> {
        let mut index = self.index.lock().await;
        index.check(&record)?;
        let row = index.prepare(record);
        self.append(&row).await?;
        index.push(row)
    }

    async fn find_by_public_id(&self, id: &PublicId) -> Result<Option<StoredObject>, CatalogError> {
        Ok(self.index.lock().await.by_public_id(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<StoredObject>, CatalogError> {
        Ok(self.index.lock().await.by_name(name).cloned())
    }

    async fn list_all(&self) -> Result<Vec<StoredObject>, CatalogError> {
        Ok(self.index.lock().await.rows().to_vec())
    }
}
