//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **StoreBuilder**: ObjectStore の構築とワイヤリング
//! - **ObjectStore**: upload / download / list_metadata のオーケストレーター
//! - **BackendExecutor**: backend 呼び出し用の有界ワーカープール
//! - **UploadValidator**: upload 前の検証（API 層から呼ぶ）

pub mod builder;
pub mod executor;
pub mod store;
pub mod validator;

// 主要な型を再エクスポート
pub use self::builder::{StoreBuildError, StoreBuilder};
pub use self::executor::BackendExecutor;
pub use self::store::ObjectStore;
pub use self::validator::{UploadValidator, ValidationError};
