//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **KeyFileSigner**: 鍵ファイル + Ed25519 の Signer
//! - **S3BlobBackend / LocalBlobBackend**: object_store ベースの BlobBackend
//! - **InMemoryCatalog**: テスト・開発用のカタログ
//! - **JsonFileCatalog**: JSON Lines ファイルのカタログ（CLI 用）

pub mod blob;
pub mod json_file_catalog;
pub mod key_file_signer;
pub mod memory_catalog;

// 主要な型を再エクスポート
pub use self::blob::{LocalBlobBackend, S3BlobBackend, backend_from_config};
pub use self::json_file_catalog::JsonFileCatalog;
pub use self::key_file_signer::{KeyAlgorithm, KeyFileSigner, SignatureAlgorithm};
pub use self::memory_catalog::InMemoryCatalog;
