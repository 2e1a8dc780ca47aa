//! StoreBuilder - ObjectStore の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - backend の init() を構築時に 1 回だけ呼ぶ

use std::sync::Arc;

use tracing::{error, info};

use super::executor::BackendExecutor;
use super::store::ObjectStore;
use crate::config::{CatalogConfig, ConfigError, StoreConfig};
use crate::impls::{InMemoryCatalog, JsonFileCatalog, KeyFileSigner, backend_from_config};
use crate::ports::{
    BackendError, BlobBackend, Catalog, CatalogError, Clock, PublicIdGenerator, Signer,
    SystemClock, UlidGenerator,
};

/// StoreBuilder は ObjectStore を構築
///
/// # 使用例
/// ```ignore
/// let store = StoreBuilder::new()
///     .with_signer(signer)
///     .with_backend(backend)
///     .with_catalog(catalog)
///     .build()
///     .await?;
/// ```
///
/// # Fail-fast 設計
/// - signer / backend / catalog は必須。欠けていれば StoreBuildError::Missing
/// - id generator / clock / executor は省略するとデフォルト
/// - build() 時に backend.init() を呼び、失敗すれば StoreBuildError::BackendInit
#[derive(Default)]
pub struct StoreBuilder {
    signer: Option<Arc<dyn Signer>>,
    backend: Option<Arc<dyn BlobBackend>>,
    catalog: Option<Arc<dyn Catalog>>,
    ids: Option<Arc<dyn PublicIdGenerator>>,
    clock: Option<Arc<dyn Clock>>,
    executor: Option<BackendExecutor>,
}

/// StoreBuildError は ObjectStore 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum StoreBuildError {
    #[error("missing component: {0}. It must be set before build().")]
    Missing(&'static str),

    #[error("blob backend could not be initialized")]
    BackendInit(#[source] BackendError),

    #[error("catalog could not be opened")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StoreBuilder {
    /// 新しい StoreBuilder を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 設定から本番用のワイヤリングを作る
    ///
    /// - signer: KeyFileSigner
    /// - backend: `[blob]` のプロファイルで選択
    /// - catalog: `[catalog]` の kind で選択
    /// - executor: `[executor]` の workers
    pub async fn from_config(config: &StoreConfig) -> Result<Self, StoreBuildError> {
        config.validate()?;

        let catalog: Arc<dyn Catalog> = match &config.catalog {
            CatalogConfig::Memory => Arc::new(InMemoryCatalog::new()),
            CatalogConfig::JsonFile { path } => Arc::new(JsonFileCatalog::open(path).await?),
        };

        Ok(Self::new()
            .with_signer(Arc::new(KeyFileSigner::new(&config.signature)))
            .with_backend(backend_from_config(&config.blob))
            .with_catalog(catalog)
            .with_executor(BackendExecutor::from_config(&config.executor)))
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn BlobBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn PublicIdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_executor(mut self, executor: BackendExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// StoreBuilder を構築して ObjectStore を生成
    ///
    /// # 検証
    /// - 必須コンポーネントが揃っているか
    /// - backend.init() が成功するか（自動リトライはしない）
    pub async fn build(self) -> Result<ObjectStore, StoreBuildError> {
        let signer = self.signer.ok_or(StoreBuildError::Missing("signer"))?;
        let backend = self.backend.ok_or(StoreBuildError::Missing("blob backend"))?;
        let catalog = self.catalog.ok_or(StoreBuildError::Missing("catalog"))?;
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let executor = self.executor.unwrap_or_default();

        if let Err(err) = backend.init().await {
            error!(error = %err, "blob backend initialization failed");
            return Err(StoreBuildError::BackendInit(err));
        }
        info!(workers = executor.workers(), "object store ready");

        Ok(ObjectStore::new(signer, backend, catalog, ids, clock, executor))
    }
}
