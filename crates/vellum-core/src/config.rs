//! Config - 起動時に 1 回だけ読み込む設定
//!
//! 設定は TOML ファイルから読み込み、以後は不変です。
//! 各コンポーネントのコンストラクタには参照で渡します（グローバルな可変状態は持たない）。
//!
//! ```toml
//! [signature]
//! key_algorithm = "Ed25519"
//! signature_algorithm = "Ed25519"
//! private_key_path = "keys/signing.pem"
//!
//! [blob]
//! profile = "s3"
//! bucket = "vellum-objects"
//! region = "eu-central-1"
//! access_key = "..."
//! secret_key = "..."
//!
//! [catalog]
//! kind = "json_file"
//! path = "data/catalog.jsonl"
//!
//! [upload]
//! max_size_bytes = 2097152
//! allowed_mime_types = ["image/jpeg", "image/png"]
//!
//! [executor]
//! workers = 10
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// StoreConfig は全体の設定
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub signature: SignatureConfig,
    pub blob: BlobStoreConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub upload: UploadPolicy,
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// 署名の設定（鍵の場所とアルゴリズム名）
///
/// アルゴリズム名の解決は署名時に行う（未知の名前は SignError になる）。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignatureConfig {
    pub key_algorithm: String,
    pub signature_algorithm: String,
    pub private_key_path: PathBuf,
}

/// BlobStoreConfig はデプロイメントプロファイルごとの backend 選択
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "profile", rename_all = "snake_case")]
pub enum BlobStoreConfig {
    /// 本番: リモートの S3 互換ストレージ
    S3(S3Config),
    /// ローカル: root 配下のファイルシステム
    Local { root: PathBuf },
    /// テスト: プロセス内メモリ
    Memory,
}

/// S3 backend の設定
///
/// タイムアウトとリトライの既定値: connect 1s / read 5s / 最大 5 回
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// MinIO などの S3 互換エンドポイント
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub allow_http: bool,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

fn default_connect_timeout_ms() -> u64 {
    1_000
}

fn default_read_timeout_ms() -> u64 {
    5_000
}

fn default_max_retries() -> usize {
    5
}

impl S3Config {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("allow_http", &self.allow_http)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("read_timeout_ms", &self.read_timeout_ms)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// カタログ実装の選択
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogConfig {
    #[default]
    Memory,
    JsonFile { path: PathBuf },
}

/// アップロード前のバリデーション設定
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadPolicy {
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

fn default_max_size_bytes() -> u64 {
    2 * 1024 * 1024
}

fn default_allowed_mime_types() -> Vec<String> {
    vec!["image/jpeg".to_string(), "image/png".to_string()]
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
            allowed_mime_types: default_allowed_mime_types(),
        }
    }
}

/// backend 呼び出し用のワーカープールの設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    10
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// ConfigError は設定の読み込み・検証エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl StoreConfig {
    /// ファイルから読み込んで検証する
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 起動時検証（Fail-fast）
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signature.private_key_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "signature.private_key_path must not be empty".into(),
            ));
        }
        if let BlobStoreConfig::S3(s3) = &self.blob {
            if s3.bucket.trim().is_empty() {
                return Err(ConfigError::Invalid("blob.bucket must not be empty".into()));
            }
            if s3.region.trim().is_empty() {
                return Err(ConfigError::Invalid("blob.region must not be empty".into()));
            }
        }
        if self.executor.workers == 0 {
            return Err(ConfigError::Invalid(
                "executor.workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
