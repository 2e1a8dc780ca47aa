//! vellum-core
//!
//! Core building blocks for the Vellum signed-object store.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, object, errors）
//! - **ports**: 抽象化レイヤー（Signer, BlobBackend, Catalog, Clock, PublicIdGenerator）
//! - **app**: アプリケーションロジック（builder, store, executor, validator）
//! - **impls**: 実装（KeyFileSigner, S3/Local backend, InMemory/JsonFile catalog）
//! - **config**: 起動時に読み込む TOML 設定

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use self::app::{ObjectStore, StoreBuilder};
pub use self::config::StoreConfig;
pub use self::domain::{ErrorKind, ObjectMeta, PublicId, StoreError};
