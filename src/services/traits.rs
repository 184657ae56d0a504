// サービストレイト定義
//
// 比較処理の差し替え点を抽象化するトレイト群。

use std::fmt;

use crate::core::schema::{Database, Entity};
use crate::core::schema_diff::DatabaseDiff;

/// エンティティ正規化のトレイト
///
/// 比較前に各エンティティへ適用されます。
/// プラットフォーム固有の既定値の補完などに使用します。
pub trait EntityNormalizer: Send + Sync + fmt::Debug {
    /// 正規化したエンティティを返す
    fn normalize(&self, entity: &Entity) -> Entity;
}

/// スキーマ比較サービスのトレイト
pub trait SchemaComparator {
    /// データベース差分を検出
    fn compare_databases(&self, from: &Database, to: &Database) -> Option<DatabaseDiff>;
}
