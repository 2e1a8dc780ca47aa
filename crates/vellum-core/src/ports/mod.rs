//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（鍵ファイル, S3, メタデータ DB など）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - Catalog が source of truth（正本）
//! - BlobBackend は bytes の置き場（カタログに追従するだけ）
//! - Signer は保存の前に必ず呼ばれる

pub mod blob_backend;
pub mod catalog;
pub mod clock;
pub mod id_generator;
pub mod signer;

// 主要な trait を再エクスポート
pub use self::blob_backend::{BackendError, BlobBackend};
pub use self::catalog::{Catalog, CatalogError};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{PublicIdGenerator, UlidGenerator};
pub use self::signer::{SignError, Signer};
