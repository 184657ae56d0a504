// stratum-diffライブラリのエントリーポイント
//
// モジュール構造:
// - core: コアドメインロジック（スキーマモデル、差分モデル、設定、型マッピング）
// - services: 差分検出と設定ファイル読み込み

pub mod core;
pub mod services;

pub use crate::core::config::{ComparisonOptions, DiffConfig};
pub use crate::core::error::{ConfigError, SchemaError};
pub use crate::core::schema::{Database, Entity, Field, Index, Relation};
pub use crate::core::schema_diff::{DatabaseDiff, EntityDiff, FieldDiff, PropertyChanges};
pub use crate::services::schema_diff_detector::{
    compare_databases, compare_entities, compare_fields, compare_index, compare_relation,
    DatabaseComparator,
};
