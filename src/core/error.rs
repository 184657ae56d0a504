// エラー型定義
//
// ライブラリ全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、SchemaError と ConfigError を定義します。
// 差分の検出そのものはエラーではなく、比較処理は常に成功します。

use std::fmt;
use thiserror::Error;

/// スキーマ構築エラー
///
/// スキーマモデルの構築時に発生するエラーを表現します。
/// 名前の重複したエンティティ・フィールド等はこの段階で拒否されます。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// 名前の重複
    #[error("Duplicate {element} '{name}'{}", format_location_opt(.location))]
    Duplicate {
        /// 重複した要素の種類
        element: ElementKind,
        /// 重複した名前
        name: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
    },
}

impl SchemaError {
    /// 重複エラーを作成
    pub fn duplicate(element: ElementKind, name: &str, location: Option<ErrorLocation>) -> Self {
        SchemaError::Duplicate {
            element,
            name: name.to_string(),
            location,
        }
    }

    /// 重複エラーかどうか
    pub fn is_duplicate(&self) -> bool {
        matches!(self, SchemaError::Duplicate { .. })
    }

    /// エラー発生位置を取得
    pub fn location(&self) -> Option<&ErrorLocation> {
        match self {
            SchemaError::Duplicate { location, .. } => location.as_ref(),
        }
    }
}

/// スキーマ要素の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Entity,
    Field,
    Index,
    Relation,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Entity => write!(f, "entity"),
            ElementKind::Field => write!(f, "field"),
            ElementKind::Index => write!(f, "index"),
            ElementKind::Relation => write!(f, "relation"),
        }
    }
}

/// エラー発生位置
///
/// スキーマ内のエラー発生位置を表現します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    /// エンティティ名
    pub entity: Option<String>,
    /// フィールド名
    pub field: Option<String>,
}

impl ErrorLocation {
    /// 新しいエラー位置を作成
    pub fn new() -> Self {
        Self {
            entity: None,
            field: None,
        }
    }

    /// エンティティ名を指定してエラー位置を作成
    pub fn with_entity(entity: &str) -> Self {
        Self {
            entity: Some(entity.to_string()),
            field: None,
        }
    }

    /// エンティティ名とフィールド名を指定してエラー位置を作成
    pub fn with_entity_and_field(entity: &str, field: &str) -> Self {
        Self {
            entity: Some(entity.to_string()),
            field: Some(field.to_string()),
        }
    }

    /// 位置情報をフォーマット
    pub fn format(&self) -> String {
        let mut parts = Vec::new();

        if let Some(entity) = &self.entity {
            parts.push(format!("entity: {}", entity));
        }
        if let Some(field) = &self.field {
            parts.push(format!("field: {}", field));
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!(" ({})", parts.join(", "))
        }
    }
}

impl Default for ErrorLocation {
    fn default() -> Self {
        Self::new()
    }
}

/// 位置情報をフォーマットするヘルパー関数
fn format_location_opt(location: &Option<ErrorLocation>) -> String {
    location.as_ref().map_or(String::new(), |loc| loc.format())
}

/// 設定エラー
///
/// 比較オプションの構築時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// バージョン未指定
    #[error("Config file version is not specified")]
    MissingVersion,

    /// 除外パターンが正規表現として不正
    #[error("Invalid exclusion pattern '{pattern}': {source}")]
    InvalidPattern {
        /// 指定されたパターン
        pattern: String,
        /// 原因
        #[source]
        source: regex::Error,
    },

    /// 未知の論理型
    #[error("Unknown logical type '{name}' in type mapping")]
    UnknownLogicalType {
        /// 指定された型名
        name: String,
    },
}
