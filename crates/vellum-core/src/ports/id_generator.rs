//! IdGenerator port - PublicId 生成の抽象化
//!
//! テスト容易性のために trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::PublicId;
use crate::ports::Clock;
use ulid::Ulid;

/// PublicIdGenerator はアップロードごとに PublicId を生成
///
/// # 衝突について
/// - 生成された ID の一意性はカタログの insert が最終的に保証する
/// - 重複した場合オーケストレーターが再生成する
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数のリクエストから同時に使われる）
pub trait PublicIdGenerator: Send + Sync {
    fn generate(&self) -> PublicId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// FixedClock を使うと timestamp 部分が固定されます（ランダム部分は変わる）。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> PublicIdGenerator for UlidGenerator<C> {
    fn generate(&self) -> PublicId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        PublicId::from_ulid(ulid)
    }
}
