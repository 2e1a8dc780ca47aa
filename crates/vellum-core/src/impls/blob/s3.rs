//! S3BlobBackend - 本番用の Blob backend（S3 / S3 互換）
//!
//! # トランスポート
//! - connect / read タイムアウトは設定値（既定 1s / 5s）
//! - リトライはトランスポート層で最大 `max_retries` 回（既定 5）
//!
//! init() でクライアントを構築し、バケットに到達できるかを確認します。
//! バケットの作成はしません（事前に用意されている前提）。

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::{ClientOptions, ObjectStore, RetryConfig};
use tracing::{error, info};

use super::{StoreCell, get_object, initialized, put_object};
use crate::config::S3Config;
use crate::ports::{BackendError, BlobBackend};

const BACKEND: &str = "s3";

/// S3BlobBackend はリモートの S3 バケットに保存する
pub struct S3BlobBackend {
    config: S3Config,
    store: StoreCell,
}

impl S3BlobBackend {
    pub fn new(config: &S3Config) -> Self {
        Self {
            config: config.clone(),
            store: StoreCell::new(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    fn build_client(&self) -> Result<Arc<dyn ObjectStore>, BackendError> {
        let config = &self.config;
        let client_options = ClientOptions::new()
            .with_connect_timeout(config.connect_timeout())
            .with_timeout(config.read_timeout())
            .with_allow_http(config.allow_http);
        let retry = RetryConfig {
            max_retries: config.max_retries,
            ..Default::default()
        };

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .with_access_key_id(&config.access_key)
            .with_secret_access_key(&config.secret_key)
            .with_client_options(client_options)
            .with_retry(retry);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        let s3 = builder
            .build()
            .map_err(|e| BackendError::init_with("could not build S3 client", e))?;
        Ok(Arc::new(s3))
    }

    async fn connect(&self) -> Result<Arc<dyn ObjectStore>, BackendError> {
        let store = self.build_client()?;

        // バケットに到達できること（認証情報を含む）を確認する
        if let Err(err) = store.list_with_delimiter(None).await {
            error!(backend = BACKEND, bucket = %self.config.bucket, error = %err, "S3 bucket is not reachable");
            return Err(BackendError::init_with(
                format!("bucket {} is not reachable", self.config.bucket),
                err,
            ));
        }

        info!(backend = BACKEND, bucket = %self.config.bucket, region = %self.config.region, "S3 client initialized");
        Ok(store)
    }
}

#[async_trait]
impl BlobBackend for S3BlobBackend {
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
