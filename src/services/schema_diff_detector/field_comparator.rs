// フィールドレベルの差分検出

use std::sync::Arc;

use crate::core::schema::{DefaultKind, DefaultValue, Field};
use crate::core::schema_diff::{Change, PropertyChanges};
use crate::core::type_mapping::{GenericTypeMapper, TypeMapper};

/// 同じ意味を持つ現在時刻の式
const CURRENT_TIMESTAMP_SYNONYMS: [&str; 3] = ["CURRENT_TIMESTAMP", "CURRENT_TIMESTAMP()", "NOW()"];

/// フィールド比較
///
/// 2つのフィールド定義をプロパティごとに比較します。
#[derive(Debug, Clone)]
pub struct FieldComparator {
    type_mapper: Arc<dyn TypeMapper>,
}

impl FieldComparator {
    /// 汎用の型マッピングで作成
    pub fn new() -> Self {
        Self::with_type_mapper(Arc::new(GenericTypeMapper))
    }

    /// 型マッピングを指定して作成
    pub fn with_type_mapper(type_mapper: Arc<dyn TypeMapper>) -> Self {
        Self { type_mapper }
    }

    /// フィールド間の変更を検出
    ///
    /// 実効値が異なるプロパティのみを返します。名前は比較しません。
    pub fn compare(&self, from: &Field, to: &Field) -> PropertyChanges {
        let mut changes = PropertyChanges {
            logical_type: Change::between(from.logical_type, to.logical_type),
            size: Change::between(from.size, to.size),
            scale: Change::between(from.scale, to.scale),
            not_null: Change::between(from.not_null, to.not_null),
            auto_increment: Change::between(from.auto_increment, to.auto_increment),
            ..Default::default()
        };

        // 上書きの有無ではなく実効SQL型で比較
        let from_sql_type = self.type_mapper.effective_sql_type(from);
        let to_sql_type = self.type_mapper.effective_sql_type(to);
        if !from_sql_type.eq_ignore_ascii_case(to_sql_type) {
            changes.sql_type = Some(Change::new(
                from_sql_type.to_string(),
                to_sql_type.to_string(),
            ));
        }

        match (&from.default_value, &to.default_value) {
            (None, None) => {}
            (Some(_), None) | (None, Some(_)) => {
                changes.default_kind = Some(Change::new(
                    from.default_value.as_ref().map(|d| d.kind),
                    to.default_value.as_ref().map(|d| d.kind),
                ));
                changes.default_value = Some(Change::new(
                    from.default_value.as_ref().map(|d| d.value.clone()),
                    to.default_value.as_ref().map(|d| d.value.clone()),
                ));
            }
            (Some(from_default), Some(to_default)) => {
                if !defaults_equivalent(from_default, to_default) {
                    changes.default_kind =
                        Change::between(Some(from_default.kind), Some(to_default.kind));
                    changes.default_value = Change::between(
                        Some(from_default.value.clone()),
                        Some(to_default.value.clone()),
                    );
                }
            }
        }

        changes
    }
}

impl Default for FieldComparator {
    fn default() -> Self {
        Self::new()
    }
}

/// デフォルト値が同じ意味を持つか
///
/// リテラル値は完全一致で、SQL式は正規化後に比較します。
pub(crate) fn defaults_equivalent(from: &DefaultValue, to: &DefaultValue) -> bool {
    if from.kind != to.kind {
        return false;
    }
    match from.kind {
        DefaultKind::Value => from.value == to.value,
        DefaultKind::Expression => {
            normalize_expression(&from.value) == normalize_expression(&to.value)
        }
    }
}

/// SQL式を正規化
///
/// 引用符の外側だけを大文字化して空白を圧縮し、括弧とカンマ周辺の空白を除去します。
/// 文字列リテラルの中身はそのまま保持し、現在時刻の同義語は `CURRENT_TIMESTAMP` に揃えます。
pub(crate) fn normalize_expression(expression: &str) -> String {
    let mut normalized = String::with_capacity(expression.len());
    let mut in_quote = false;
    let mut pending_space = false;

    for c in expression.trim().chars() {
        if in_quote {
            normalized.push(c);
            // `''` は閉じて開き直す扱いになる
            if c == '\'' {
                in_quote = false;
            }
            continue;
        }

        if c.is_whitespace() {
            pending_space = true;
            continue;
        }

        if pending_space {
            pending_space = false;
            let prev_is_punct = matches!(normalized.chars().last(), Some('(' | ')' | ','));
            if !prev_is_punct && !matches!(c, '(' | ')' | ',') {
                normalized.push(' ');
            }
        }

        if c == '\'' {
            in_quote = true;
            normalized.push(c);
        } else {
            normalized.extend(c.to_uppercase());
        }
    }

    if CURRENT_TIMESTAMP_SYNONYMS.contains(&normalized.as_str()) {
        return CURRENT_TIMESTAMP_SYNONYMS[0].to_string();
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::LogicalType;
    use crate::core::schema_diff::FieldProperty;
    use crate::core::type_mapping::ConfiguredTypeMapper;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn varchar(name: &str, size: u32) -> Field {
        Field::new(name.to_string(), LogicalType::Varchar).with_size(size)
    }

    #[test]
    fn test_compare_identical_fields() {
        let comparator = FieldComparator::new();
        let changes = comparator.compare(&varchar("title", 255), &varchar("title", 255));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_compare_ignores_name() {
        let comparator = FieldComparator::new();
        let changes = comparator.compare(&varchar("title", 255), &varchar("name", 255));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_compare_type_change_is_antisymmetric() {
        let comparator = FieldComparator::new();
        let a = Field::new("count".to_string(), LogicalType::Integer);
        let b = Field::new("count".to_string(), LogicalType::BigInt);

        let forward = comparator.compare(&a, &b);
        let backward = comparator.compare(&b, &a);

        assert_eq!(
            forward.logical_type,
            Some(Change::new(LogicalType::Integer, LogicalType::BigInt))
        );
        assert_eq!(
            backward.logical_type,
            Some(Change::new(LogicalType::BigInt, LogicalType::Integer))
        );
        // 論理型が変われば実効SQL型も変わる
        assert!(forward.contains(FieldProperty::SqlType));
        assert_eq!(backward, forward.reverse());
    }

    #[test]
    fn test_compare_size_scale_not_null_auto_increment() {
        let comparator = FieldComparator::new();
        let from = Field::new("price".to_string(), LogicalType::Decimal)
            .with_size(10)
            .with_scale(2);
        let mut to = Field::new("price".to_string(), LogicalType::Decimal)
            .with_size(12)
            .with_scale(4)
            .not_null();
        to.auto_increment = true;

        let changes = comparator.compare(&from, &to);

        assert_eq!(changes.size, Some(Change::new(Some(10), Some(12))));
        assert_eq!(changes.scale, Some(Change::new(Some(2), Some(4))));
        assert_eq!(changes.not_null, Some(Change::new(false, true)));
        assert_eq!(changes.auto_increment, Some(Change::new(false, true)));
        assert_eq!(changes.len(), 4);
    }

    #[test]
    fn test_compare_no_op_sql_type_override() {
        let comparator = FieldComparator::new();
        let plain = Field::new("body".to_string(), LogicalType::LongVarchar);
        let overridden = plain.clone().with_sql_type("longvarchar");

        assert!(comparator.compare(&plain, &overridden).is_empty());
    }

    #[test]
    fn test_compare_effective_sql_type_change() {
        let comparator = FieldComparator::new();
        let plain = Field::new("body".to_string(), LogicalType::LongVarchar);
        let overridden = plain.clone().with_sql_type("MEDIUMTEXT");

        let changes = comparator.compare(&plain, &overridden);

        assert_eq!(
            changes.sql_type,
            Some(Change::new("LONGVARCHAR".to_string(), "MEDIUMTEXT".to_string()))
        );
        assert!(changes.logical_type.is_none());
    }

    #[test]
    fn test_compare_uses_configured_type_mapper() {
        let mut overrides = BTreeMap::new();
        overrides.insert(LogicalType::Boolean, "TINYINT".to_string());
        let comparator =
            FieldComparator::with_type_mapper(Arc::new(ConfiguredTypeMapper::new(overrides)));

        let plain = Field::new("active".to_string(), LogicalType::Boolean);
        let overridden = plain.clone().with_sql_type("TINYINT");

        assert!(comparator.compare(&plain, &overridden).is_empty());
    }

    #[test]
    fn test_compare_default_added() {
        let comparator = FieldComparator::new();
        let from = varchar("status", 20);
        let to = varchar("status", 20).with_default(DefaultValue::value("draft"));

        let changes = comparator.compare(&from, &to);

        assert_eq!(
            changes.default_kind,
            Some(Change::new(None, Some(DefaultKind::Value)))
        );
        assert_eq!(
            changes.default_value,
            Some(Change::new(None, Some("draft".to_string())))
        );
    }

    #[test]
    fn test_compare_default_removed() {
        let comparator = FieldComparator::new();
        let from = varchar("status", 20).with_default(DefaultValue::value("draft"));
        let to = varchar("status", 20);

        let changes = comparator.compare(&from, &to);

        assert_eq!(
            changes.default_value,
            Some(Change::new(Some("draft".to_string()), None))
        );
    }

    #[test]
    fn test_compare_default_value_changed_keeps_kind() {
        let comparator = FieldComparator::new();
        let from = varchar("status", 20).with_default(DefaultValue::value("draft"));
        let to = varchar("status", 20).with_default(DefaultValue::value("published"));

        let changes = comparator.compare(&from, &to);

        assert!(changes.default_kind.is_none());
        assert_eq!(
            changes.default_value,
            Some(Change::new(
                Some("draft".to_string()),
                Some("published".to_string())
            ))
        );
    }

    #[test]
    fn test_compare_default_kind_changed_keeps_value() {
        let comparator = FieldComparator::new();
        let from = varchar("code", 20).with_default(DefaultValue::value("UUID()"));
        let to = varchar("code", 20).with_default(DefaultValue::expression("UUID()"));

        let changes = comparator.compare(&from, &to);

        assert_eq!(
            changes.default_kind,
            Some(Change::new(
                Some(DefaultKind::Value),
                Some(DefaultKind::Expression)
            ))
        );
        assert!(changes.default_value.is_none());
    }

    #[test]
    fn test_compare_current_timestamp_synonyms() {
        let comparator = FieldComparator::new();
        let from = Field::new("created_at".to_string(), LogicalType::Timestamp)
            .with_default(DefaultValue::expression("now()"));
        let to = Field::new("created_at".to_string(), LogicalType::Timestamp)
            .with_default(DefaultValue::expression("CURRENT_TIMESTAMP"));

        assert!(comparator.compare(&from, &to).is_empty());
    }

    #[test]
    fn test_literal_defaults_are_case_sensitive() {
        assert!(!defaults_equivalent(
            &DefaultValue::value("Draft"),
            &DefaultValue::value("draft")
        ));
    }

    #[test]
    fn test_expression_literals_are_case_sensitive() {
        let comparator = FieldComparator::new();
        let from = Field::new("status".to_string(), LogicalType::Varchar)
            .with_default(DefaultValue::expression("'active'::character varying"));
        let to = Field::new("status".to_string(), LogicalType::Varchar)
            .with_default(DefaultValue::expression("'Active'::CHARACTER VARYING"));

        let changes = comparator.compare(&from, &to);

        assert_eq!(
            changes.default_value,
            Some(Change::new(
                Some("'active'::character varying".to_string()),
                Some("'Active'::CHARACTER VARYING".to_string())
            ))
        );
        assert!(changes.default_kind.is_none());
        assert!(!defaults_equivalent(
            &DefaultValue::expression("'x'"),
            &DefaultValue::expression("'X'")
        ));
        assert!(defaults_equivalent(
            &DefaultValue::expression("lower( 'x' )"),
            &DefaultValue::expression("LOWER('x')")
        ));
    }

    #[rstest]
    #[case("now()", "CURRENT_TIMESTAMP")]
    #[case("NOW( )", "CURRENT_TIMESTAMP")]
    #[case("current_timestamp", "CURRENT_TIMESTAMP")]
    #[case("Current_Timestamp()", "CURRENT_TIMESTAMP")]
    #[case("nextval ( 'book_seq' )", "NEXTVAL('book_seq')")]
    #[case("'active'::character varying", "'active'::CHARACTER VARYING")]
    #[case("concat('a  b', 'It''s')", "CONCAT('a  b','It''s')")]
    #[case("  coalesce(a,   b)  ", "COALESCE(A,B)")]
    #[case("CURRENT_DATE", "CURRENT_DATE")]
    fn test_normalize_expression(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_expression(input), expected);
    }
}
