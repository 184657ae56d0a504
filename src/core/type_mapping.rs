// 型マッピング
//
// 論理型からプラットフォーム既定のSQL型を導出します。
// プラットフォーム固有の対応表は呼び出し側が明示的に渡します。

use std::collections::BTreeMap;
use std::fmt;

use crate::core::schema::{Field, LogicalType};

/// 論理型 -> SQL型の対応を提供するトレイト
pub trait TypeMapper: Send + Sync + fmt::Debug {
    /// 論理型の既定SQL型を返す
    fn default_sql_type(&self, logical_type: LogicalType) -> &str;

    /// フィールドの実効SQL型を返す
    ///
    /// 明示的な上書きがあればそれを、なければ論理型の既定SQL型を返します。
    fn effective_sql_type<'a>(&'a self, field: &'a Field) -> &'a str {
        match &field.sql_type {
            Some(sql_type) => sql_type.as_str(),
            None => self.default_sql_type(field.logical_type),
        }
    }
}

/// 汎用の型マッピング
///
/// ほとんどの論理型は同名のSQL型に対応します。
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericTypeMapper;

impl TypeMapper for GenericTypeMapper {
    fn default_sql_type(&self, logical_type: LogicalType) -> &str {
        generic_sql_type(logical_type)
    }
}

fn generic_sql_type(logical_type: LogicalType) -> &'static str {
    match logical_type {
        LogicalType::Enum => "TINYINT",
        LogicalType::Object => "BLOB",
        LogicalType::Array => "LONGVARCHAR",
        other => other.as_str(),
    }
}

/// 上書き付きの型マッピング
///
/// 設定ファイルで指定された対応を優先し、残りは汎用マッピングに委譲します。
#[derive(Debug, Clone, Default)]
pub struct ConfiguredTypeMapper {
    overrides: BTreeMap<LogicalType, String>,
}

impl ConfiguredTypeMapper {
    /// 新しい型マッピングを作成
    pub fn new(overrides: BTreeMap<LogicalType, String>) -> Self {
        Self { overrides }
    }

    /// 上書きの件数
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl TypeMapper for ConfiguredTypeMapper {
    fn default_sql_type(&self, logical_type: LogicalType) -> &str {
        self.overrides
            .get(&logical_type)
            .map(|s| s.as_str())
            .unwrap_or_else(|| generic_sql_type(logical_type))
    }
}
