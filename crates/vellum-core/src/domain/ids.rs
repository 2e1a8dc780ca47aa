//! Domain identifiers (strongly-typed IDs).
//!
//! # 2 種類の ID
//! - **InternalId**: カタログが採番する単調増加の ID。外部には出さない。
//! - **PublicId**: 呼び出し側に返す不透明な ID。アップロード時に生成し、
//!   InternalId とは独立している。
//!
//! ## PublicId の生成
//! PublicId は ULID ベースです（`ports::id_generator` を参照）。
//! 128-bit のうち 80-bit がランダムなので、衝突確率は無視できます。
//! それでもカタログは重複を拒否し、オーケストレーターは再採番します。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// PublicId の Display / 文字列表現に付くプレフィックス
pub const PUBLIC_ID_PREFIX: &str = "obj-";

/// カタログ内部の ID（単調増加、非公開）
///
/// `Default` は 0（まだ何も採番していない状態）。最初の行は 1 になる。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalId(u64);

impl InternalId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// 次の ID（採番用）
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 呼び出し側に公開される不透明な ID
///
/// 外部から受け取った文字列もそのまま PublicId として扱います
/// （形式チェックはしない。存在しなければ NotFound になるだけ）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicId(String);

impl PublicId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// ULID から PublicId を作成（`obj-<ULID>`）
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(format!("{PUBLIC_ID_PREFIX}{ulid}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Ulid> for PublicId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl From<&str> for PublicId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
