//! BackendExecutor - backend 呼び出し用の有界ワーカープール
//!
//! backend の put/get は呼び出し元とは別の tokio タスクで実行し、
//! 同時実行数はセマフォで `workers` 個に制限します。
//! 遅い backend がリクエスト処理側を塞がないようにするためです。
//!
//! # 学習ポイント
//! - `Semaphore::acquire_owned` で permit をタスクに move する
//! - JoinHandle を明示的なハンドルとして返し、await は呼び出し側の 1 箇所だけ

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};

use crate::config::ExecutorConfig;
use crate::domain::{StorageCause, StorageStage, StoreError};
use crate::ports::BackendError;

/// BackendExecutor は backend 呼び出しを有界プールで実行する
#[derive(Debug, Clone)]
pub struct BackendExecutor {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl BackendExecutor {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(config.workers)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// 空いている permit の数（テスト・観測用）
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// backend 呼び出しをプールに投入し、タスクハンドルを返す
    ///
    /// 呼び出し元の future が drop されてもタスクは最後まで走る。
    pub fn submit<F, T>(&self, call: F) -> JoinHandle<Result<T, BackendError>>
    where
        F: Future<Output = Result<T, BackendError>> + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            // プールが閉じられることはない（close() を呼ばない）
            let _permit = permits.acquire_owned().await;
            call.await
        })
    }
}

impl Default for BackendExecutor {
    fn default() -> Self {
        Self::from_config(&ExecutorConfig::default())
    }
}

/// タスクハンドルを await して StoreError に変換する
///
/// - backend の失敗 → StorageFailure（Backend）
/// - タスクのキャンセル / panic → StorageFailure（Cancelled）
pub async fn join_backend<T>(
    handle: JoinHandle<Result<T, BackendError>>,
    stage: StorageStage,
) -> Result<T, StoreError> {
    match handle.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(StoreError::storage(stage, err)),
        Err(join_err) => Err(StoreError::storage(stage, cancelled(join_err))),
    }
}

fn cancelled(err: JoinError) -> StorageCause {
    if err.is_cancelled() {
        StorageCause::Cancelled("backend task was cancelled".to_string())
    } else {
        StorageCause::Cancelled(format!("backend task panicked: {err}"))
    }
}
