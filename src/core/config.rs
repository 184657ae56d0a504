// 設定管理
//
// 差分計算の設定ファイル（YAML形式）の表現と検証、
// 比較オプションおよび型マッピングへの変換を行います。

use crate::core::error::ConfigError;
use crate::core::schema::{LogicalType, ReferentialAction};
use crate::core::type_mapping::ConfiguredTypeMapper;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 比較オプション
///
/// データベース比較の挙動を制御します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonOptions {
    /// 構造が同一の追加・削除の組をリネームとして扱うか
    pub with_renaming: bool,

    /// 比較先に存在しないエンティティを削除として報告するか
    pub remove_entities: bool,

    /// 比較から除外するエンティティ（名前または完全一致の正規表現）
    pub excluded_entities: BTreeSet<String>,

    /// 名前の比較で大文字小文字を区別しないか
    pub case_insensitive: bool,

    /// エンティティ内のフィールドのリネームを検出するか
    pub rename_fields: bool,

    /// 参照アクション未指定時の実効アクション
    pub default_action: ReferentialAction,
}

impl ComparisonOptions {
    /// 既定のオプションを作成
    pub fn new() -> Self {
        Self {
            with_renaming: false,
            remove_entities: true,
            excluded_entities: BTreeSet::new(),
            case_insensitive: false,
            rename_fields: false,
            default_action: ReferentialAction::default(),
        }
    }

    pub fn with_renaming(mut self, enabled: bool) -> Self {
        self.with_renaming = enabled;
        self
    }

    pub fn remove_entities(mut self, enabled: bool) -> Self {
        self.remove_entities = enabled;
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.excluded_entities.insert(pattern.to_string());
        self
    }

    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    pub fn rename_fields(mut self, enabled: bool) -> Self {
        self.rename_fields = enabled;
        self
    }

    pub fn default_action(mut self, action: ReferentialAction) -> Self {
        self.default_action = action;
        self
    }

    /// 除外パターンをコンパイル
    pub fn exclusion_filter(&self) -> Result<ExclusionFilter, ConfigError> {
        ExclusionFilter::new(&self.excluded_entities, self.case_insensitive)
    }
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// エンティティ除外フィルタ
///
/// 各パターンはエンティティ名全体に一致する必要があります。
/// 量指定子・文字クラス・グループなどの正規表現記号を含まない項目は
/// 名前そのものとして扱われ、`.` も文字どおりに一致します。
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    patterns: Vec<Regex>,
}

impl ExclusionFilter {
    /// パターンをコンパイルしてフィルタを作成
    pub fn new<'a, I>(patterns: I, case_insensitive: bool) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let expression = if is_pattern(pattern) {
                    pattern.to_string()
                } else {
                    regex::escape(pattern)
                };
                RegexBuilder::new(&format!("^(?:{})$", expression))
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|source| ConfigError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// 指定されたエンティティ名が除外対象か
    pub fn is_excluded(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(name))
    }

    /// パターン数
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// 正規表現として解釈すべき項目か
fn is_pattern(entry: &str) -> bool {
    entry.chars().any(|c| {
        matches!(
            c,
            '*' | '+' | '?' | '[' | ']' | '(' | ')' | '{' | '}' | '|' | '^' | '$' | '\\'
        )
    })
}

/// 差分計算設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// 設定ファイルのバージョン
    pub version: String,

    /// リネーム検出の有効化
    #[serde(default)]
    pub with_renaming: bool,

    /// 削除エンティティの報告
    #[serde(default = "default_remove_entities")]
    pub remove_entities: bool,

    /// 除外エンティティのパターン
    #[serde(default)]
    pub excluded_entities: Vec<String>,

    /// 大文字小文字を区別しない比較
    #[serde(default)]
    pub case_insensitive: bool,

    /// フィールドのリネーム検出
    #[serde(default)]
    pub rename_fields: bool,

    /// 参照アクション未指定時の実効アクション
    #[serde(default)]
    pub default_action: ReferentialAction,

    /// 論理型 -> SQL型の上書き
    #[serde(default)]
    pub type_mapping: BTreeMap<String, String>,
}

fn default_remove_entities() -> bool {
    true
}

impl DiffConfig {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        // バージョンチェック
        if self.version.trim().is_empty() {
            return Err(ConfigError::MissingVersion);
        }

        self.to_options().exclusion_filter()?;
        self.type_mapper()?;

        Ok(())
    }

    /// 比較オプションに変換
    pub fn to_options(&self) -> ComparisonOptions {
        ComparisonOptions {
            with_renaming: self.with_renaming,
            remove_entities: self.remove_entities,
            excluded_entities: self.excluded_entities.iter().cloned().collect(),
            case_insensitive: self.case_insensitive,
            rename_fields: self.rename_fields,
            default_action: self.default_action,
        }
    }

    /// 型マッピングを構築
    pub fn type_mapper(&self) -> Result<ConfiguredTypeMapper, ConfigError> {
        let overrides = self
            .type_mapping
            .iter()
            .map(|(name, sql_type)| Ok((name.parse::<LogicalType>()?, sql_type.clone())))
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

        Ok(ConfiguredTypeMapper::new(overrides))
    }
}
