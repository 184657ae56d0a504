// スキーマ差分ドメインモデル
//
// スキーマ間の差分を表現する型システム。
// エンティティ、フィールド、インデックス、リレーションの追加、削除、変更を表現します。
// 差分は比較処理でのみ構築され、公開APIからは読み取り専用です。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::schema::{
    DefaultKind, Entity, Field, IdStrategy, Index, LogicalType, Relation,
};

/// 変更前後の値の組
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change<T> {
    /// 変更前の値
    pub old: T,
    /// 変更後の値
    pub new: T,
}

impl<T> Change<T> {
    /// 新しい変更を作成
    pub fn new(old: T, new: T) -> Self {
        Self { old, new }
    }

    /// 逆方向の変更を作成
    pub fn reverse(&self) -> Self
    where
        T: Clone,
    {
        Self {
            old: self.new.clone(),
            new: self.old.clone(),
        }
    }
}

impl<T: PartialEq> Change<T> {
    /// 値が異なる場合のみ変更を作成
    pub fn between(old: T, new: T) -> Option<Self> {
        if old == new {
            None
        } else {
            Some(Self { old, new })
        }
    }
}

/// 置き換えとして扱われる定義の組
///
/// インデックスとリレーションの変更は部分的なパッチではなく、
/// 旧定義から新定義への置き換えとして表現します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement<T> {
    /// 変更前の定義
    pub from: T,
    /// 変更後の定義
    pub to: T,
}

impl<T: Clone> Replacement<T> {
    /// 新しい置き換えを作成
    pub fn new(from: T, to: T) -> Self {
        Self { from, to }
    }

    /// 逆方向の置き換えを作成
    pub fn reverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

/// インデックスの変更
pub type IndexChange = Replacement<Index>;

/// リレーションの変更
pub type RelationChange = Replacement<Relation>;

/// フィールドのプロパティ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldProperty {
    LogicalType,
    SqlType,
    Size,
    Scale,
    NotNull,
    DefaultKind,
    DefaultValue,
    AutoIncrement,
}

impl FieldProperty {
    /// プロパティ名を返す
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldProperty::LogicalType => "type",
            FieldProperty::SqlType => "sqlType",
            FieldProperty::Size => "size",
            FieldProperty::Scale => "scale",
            FieldProperty::NotNull => "notNull",
            FieldProperty::DefaultKind => "defaultValueType",
            FieldProperty::DefaultValue => "defaultValueValue",
            FieldProperty::AutoIncrement => "autoIncrement",
        }
    }
}

impl fmt::Display for FieldProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 変更されたプロパティ
///
/// 比較対象のプロパティは固定されており、変更のあったものだけが `Some` になります。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyChanges {
    /// 論理型の変更
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_type: Option<Change<LogicalType>>,

    /// 実効SQL型の変更
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<Change<String>>,

    /// サイズの変更
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Change<Option<u32>>>,

    /// 小数点以下桁数の変更
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Change<Option<u32>>>,

    /// NOT NULL制約の変更
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_null: Option<Change<bool>>,

    /// デフォルト値の種類の変更
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_kind: Option<Change<Option<DefaultKind>>>,

    /// デフォルト値の変更
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Change<Option<String>>>,

    /// 自動増分フラグの変更
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_increment: Option<Change<bool>>,
}

impl PropertyChanges {
    /// 変更がないかどうか
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 変更されたプロパティ数
    pub fn len(&self) -> usize {
        self.changed_properties().len()
    }

    /// 変更されたプロパティの一覧（固定順）
    pub fn changed_properties(&self) -> Vec<FieldProperty> {
        let flags = [
            (self.logical_type.is_some(), FieldProperty::LogicalType),
            (self.sql_type.is_some(), FieldProperty::SqlType),
            (self.size.is_some(), FieldProperty::Size),
            (self.scale.is_some(), FieldProperty::Scale),
            (self.not_null.is_some(), FieldProperty::NotNull),
            (self.default_kind.is_some(), FieldProperty::DefaultKind),
            (self.default_value.is_some(), FieldProperty::DefaultValue),
            (self.auto_increment.is_some(), FieldProperty::AutoIncrement),
        ];
        flags
            .into_iter()
            .filter(|(changed, _)| *changed)
            .map(|(_, property)| property)
            .collect()
    }

    /// 指定されたプロパティが変更されているか
    pub fn contains(&self, property: FieldProperty) -> bool {
        self.changed_properties().contains(&property)
    }

    /// 逆方向の変更を作成
    pub fn reverse(&self) -> Self {
        Self {
            logical_type: self.logical_type.as_ref().map(Change::reverse),
            sql_type: self.sql_type.as_ref().map(Change::reverse),
            size: self.size.as_ref().map(Change::reverse),
            scale: self.scale.as_ref().map(Change::reverse),
            not_null: self.not_null.as_ref().map(Change::reverse),
            default_kind: self.default_kind.as_ref().map(Change::reverse),
            default_value: self.default_value.as_ref().map(Change::reverse),
            auto_increment: self.auto_increment.as_ref().map(Change::reverse),
        }
    }

    /// プロパティごとの変更を "name: old -> new" 形式で返す
    pub fn describe_each(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(c) = &self.logical_type {
            lines.push(format_change(FieldProperty::LogicalType, &c.old, &c.new));
        }
        if let Some(c) = &self.sql_type {
            lines.push(format_change(FieldProperty::SqlType, &c.old, &c.new));
        }
        if let Some(c) = &self.size {
            lines.push(format_change(FieldProperty::Size, &opt(&c.old), &opt(&c.new)));
        }
        if let Some(c) = &self.scale {
            lines.push(format_change(FieldProperty::Scale, &opt(&c.old), &opt(&c.new)));
        }
        if let Some(c) = &self.not_null {
            lines.push(format_change(FieldProperty::NotNull, &c.old, &c.new));
        }
        if let Some(c) = &self.default_kind {
            lines.push(format_change(
                FieldProperty::DefaultKind,
                &opt(&c.old),
                &opt(&c.new),
            ));
        }
        if let Some(c) = &self.default_value {
            lines.push(format_change(
                FieldProperty::DefaultValue,
                &opt(&c.old),
                &opt(&c.new),
            ));
        }
        if let Some(c) = &self.auto_increment {
            lines.push(format_change(FieldProperty::AutoIncrement, &c.old, &c.new));
        }
        lines
    }
}

fn format_change(property: FieldProperty, old: &dyn fmt::Display, new: &dyn fmt::Display) -> String {
    format!("{}: {} -> {}", property, old, new)
}

fn opt<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "null".to_string(), |v| v.to_string())
}

/// フィールド差分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// 変更前のフィールド定義
    pub from: Field,

    /// 変更後のフィールド定義
    pub to: Field,

    /// 変更されたプロパティ
    pub changes: PropertyChanges,
}

impl FieldDiff {
    /// 新しいフィールド差分を作成
    pub fn new(from: Field, to: Field, changes: PropertyChanges) -> Self {
        Self { from, to, changes }
    }

    /// フィールド名（変更前）
    pub fn name(&self) -> &str {
        &self.from.name
    }

    /// 逆方向の差分を作成
    pub fn reverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
            changes: self.changes.reverse(),
        }
    }

    /// 変更内容の要約
    pub fn describe(&self) -> String {
        self.changes.describe_each().join(", ")
    }
}

/// エンティティ差分
///
/// エンティティの変更内容を表現します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDiff {
    name: String,
    added_fields: IndexMap<String, Field>,
    removed_fields: IndexMap<String, Field>,
    modified_fields: IndexMap<String, FieldDiff>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    renamed_fields: IndexMap<String, Replacement<Field>>,
    added_indexes: IndexMap<String, Index>,
    removed_indexes: IndexMap<String, Index>,
    modified_indexes: IndexMap<String, IndexChange>,
    added_relations: IndexMap<String, Relation>,
    removed_relations: IndexMap<String, Relation>,
    modified_relations: IndexMap<String, RelationChange>,
}

impl EntityDiff {
    /// 新しいエンティティ差分を作成
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            added_fields: IndexMap::new(),
            removed_fields: IndexMap::new(),
            modified_fields: IndexMap::new(),
            renamed_fields: IndexMap::new(),
            added_indexes: IndexMap::new(),
            removed_indexes: IndexMap::new(),
            modified_indexes: IndexMap::new(),
            added_relations: IndexMap::new(),
            removed_relations: IndexMap::new(),
            modified_relations: IndexMap::new(),
        }
    }

    /// エンティティ名
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn added_fields(&self) -> &IndexMap<String, Field> {
        &self.added_fields
    }

    pub fn removed_fields(&self) -> &IndexMap<String, Field> {
        &self.removed_fields
    }

    pub fn modified_fields(&self) -> &IndexMap<String, FieldDiff> {
        &self.modified_fields
    }

    /// リネームされたフィールド（旧名 -> 旧定義/新定義）
    pub fn renamed_fields(&self) -> &IndexMap<String, Replacement<Field>> {
        &self.renamed_fields
    }

    pub fn added_indexes(&self) -> &IndexMap<String, Index> {
        &self.added_indexes
    }

    pub fn removed_indexes(&self) -> &IndexMap<String, Index> {
        &self.removed_indexes
    }

    pub fn modified_indexes(&self) -> &IndexMap<String, IndexChange> {
        &self.modified_indexes
    }

    pub fn added_relations(&self) -> &IndexMap<String, Relation> {
        &self.added_relations
    }

    pub fn removed_relations(&self) -> &IndexMap<String, Relation> {
        &self.removed_relations
    }

    pub fn modified_relations(&self) -> &IndexMap<String, RelationChange> {
        &self.modified_relations
    }

    pub(crate) fn add_added_field(&mut self, field: Field) {
        self.added_fields.insert(field.name.clone(), field);
    }

    pub(crate) fn add_removed_field(&mut self, field: Field) {
        self.removed_fields.insert(field.name.clone(), field);
    }

    pub(crate) fn add_modified_field(&mut self, diff: FieldDiff) {
        self.modified_fields.insert(diff.name().to_string(), diff);
    }

    /// 追加・削除の組をリネームに置き換える
    pub(crate) fn promote_field_rename(&mut self, old_name: &str, new_name: &str) {
        if let (Some(from), Some(to)) = (
            self.removed_fields.shift_remove(old_name),
            self.added_fields.shift_remove(new_name),
        ) {
            self.renamed_fields
                .insert(old_name.to_string(), Replacement::new(from, to));
        }
    }

    pub(crate) fn add_added_index(&mut self, index: Index) {
        self.added_indexes.insert(index.name.clone(), index);
    }

    pub(crate) fn add_removed_index(&mut self, index: Index) {
        self.removed_indexes.insert(index.name.clone(), index);
    }

    pub(crate) fn add_modified_index(&mut self, name: String, change: IndexChange) {
        self.modified_indexes.insert(name, change);
    }

    pub(crate) fn add_added_relation(&mut self, identifier: String, relation: Relation) {
        self.added_relations.insert(identifier, relation);
    }

    pub(crate) fn add_removed_relation(&mut self, identifier: String, relation: Relation) {
        self.removed_relations.insert(identifier, relation);
    }

    pub(crate) fn add_modified_relation(&mut self, identifier: String, change: RelationChange) {
        self.modified_relations.insert(identifier, change);
    }

    /// 差分の項目数
    pub fn count(&self) -> usize {
        self.added_fields.len()
            + self.removed_fields.len()
            + self.modified_fields.len()
            + self.renamed_fields.len()
            + self.added_indexes.len()
            + self.removed_indexes.len()
            + self.modified_indexes.len()
            + self.added_relations.len()
            + self.removed_relations.len()
            + self.modified_relations.len()
    }

    /// 差分が空かどうか
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// 逆方向の差分を作成
    pub fn reverse(&self) -> Self {
        Self {
            name: self.name.clone(),
            added_fields: self.removed_fields.clone(),
            removed_fields: self.added_fields.clone(),
            modified_fields: self
                .modified_fields
                .iter()
                .map(|(name, diff)| (name.clone(), diff.reverse()))
                .collect(),
            renamed_fields: self
                .renamed_fields
                .values()
                .map(|rename| (rename.to.name.clone(), rename.reverse()))
                .collect(),
            added_indexes: self.removed_indexes.clone(),
            removed_indexes: self.added_indexes.clone(),
            modified_indexes: self
                .modified_indexes
                .iter()
                .map(|(name, change)| (name.clone(), change.reverse()))
                .collect(),
            added_relations: self.removed_relations.clone(),
            removed_relations: self.added_relations.clone(),
            modified_relations: self
                .modified_relations
                .iter()
                .map(|(name, change)| (name.clone(), change.reverse()))
                .collect(),
        }
    }

    /// 変更内容の要約
    pub fn describe(&self) -> String {
        let counts = [
            (self.added_fields.len(), "added fields"),
            (self.removed_fields.len(), "removed fields"),
            (self.modified_fields.len(), "modified fields"),
            (self.renamed_fields.len(), "renamed fields"),
            (self.added_indexes.len(), "added indexes"),
            (self.removed_indexes.len(), "removed indexes"),
            (self.modified_indexes.len(), "modified indexes"),
            (self.added_relations.len(), "added relations"),
            (self.removed_relations.len(), "removed relations"),
            (self.modified_relations.len(), "modified relations"),
        ];
        join_counts(&counts)
    }
}

impl fmt::Display for EntityDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        write_names(f, "addedFields", self.added_fields.keys())?;
        write_names(f, "removedFields", self.removed_fields.keys())?;
        if !self.modified_fields.is_empty() {
            writeln!(f, "  modifiedFields:")?;
            for (name, diff) in &self.modified_fields {
                writeln!(f, "    {}:", name)?;
                for line in diff.changes.describe_each() {
                    writeln!(f, "      {}", line)?;
                }
            }
        }
        if !self.renamed_fields.is_empty() {
            writeln!(f, "  renamedFields:")?;
            for (old_name, rename) in &self.renamed_fields {
                writeln!(f, "    {}: {}", old_name, rename.to.name)?;
            }
        }
        write_names(f, "addedIndexes", self.added_indexes.keys())?;
        write_names(f, "removedIndexes", self.removed_indexes.keys())?;
        write_names(f, "modifiedIndexes", self.modified_indexes.keys())?;
        write_names(f, "addedRelations", self.added_relations.keys())?;
        write_names(f, "removedRelations", self.removed_relations.keys())?;
        write_names(f, "modifiedRelations", self.modified_relations.keys())
    }
}

/// データベース差分
///
/// 2つのスキーマスナップショット間の差分を表現します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDiff {
    added_entities: IndexMap<String, Entity>,
    removed_entities: IndexMap<String, Entity>,
    modified_entities: IndexMap<String, EntityDiff>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    renamed_entities: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    possibly_renamed_entities: IndexMap<String, String>,
}

impl DatabaseDiff {
    /// 新しいデータベース差分を作成
    pub(crate) fn new() -> Self {
        Self {
            added_entities: IndexMap::new(),
            removed_entities: IndexMap::new(),
            modified_entities: IndexMap::new(),
            renamed_entities: IndexMap::new(),
            possibly_renamed_entities: IndexMap::new(),
        }
    }

    pub fn added_entities(&self) -> &IndexMap<String, Entity> {
        &self.added_entities
    }

    pub fn removed_entities(&self) -> &IndexMap<String, Entity> {
        &self.removed_entities
    }

    pub fn modified_entities(&self) -> &IndexMap<String, EntityDiff> {
        &self.modified_entities
    }

    /// リネームされたエンティティ（旧名 -> 新名）
    pub fn renamed_entities(&self) -> &IndexMap<String, String> {
        &self.renamed_entities
    }

    /// リネームの可能性があるエンティティ（旧名 -> 新名）
    ///
    /// リネーム検出が無効な場合のみ記録される参考情報です。
    /// 追加・削除の項目はそのまま残ります。
    pub fn possibly_renamed_entities(&self) -> &IndexMap<String, String> {
        &self.possibly_renamed_entities
    }

    pub(crate) fn add_added_entity(&mut self, entity: Entity) {
        self.added_entities.insert(entity.name().to_string(), entity);
    }

    pub(crate) fn add_removed_entity(&mut self, entity: Entity) {
        self.removed_entities
            .insert(entity.name().to_string(), entity);
    }

    pub(crate) fn add_modified_entity(&mut self, name: String, diff: EntityDiff) {
        self.modified_entities.insert(name, diff);
    }

    /// 追加・削除の組をリネームに置き換える
    pub(crate) fn promote_entity_rename(&mut self, old_name: &str, new_name: &str) {
        self.removed_entities.shift_remove(old_name);
        self.added_entities.shift_remove(new_name);
        self.renamed_entities
            .insert(old_name.to_string(), new_name.to_string());
    }

    pub(crate) fn add_possibly_renamed_entity(&mut self, old_name: &str, new_name: &str) {
        self.possibly_renamed_entities
            .insert(old_name.to_string(), new_name.to_string());
    }

    /// 差分の項目数（リネームは1件として数える）
    pub fn count(&self) -> usize {
        self.added_entities.len()
            + self.removed_entities.len()
            + self.modified_entities.len()
            + self.renamed_entities.len()
    }

    /// 差分が空かどうか
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// 逆方向の差分を作成
    ///
    /// 削除から追加に移るエンティティのうち、ID生成戦略が `None` のものは
    /// `Native` に正規化されます。リバースエンジニアリングで得たエンティティは
    /// ID生成戦略を正しく保持していないためです。
    pub fn reverse(&self) -> Self {
        let added_entities = self
            .removed_entities
            .iter()
            .map(|(name, entity)| {
                let mut entity = entity.clone();
                if entity.id_strategy == IdStrategy::None {
                    entity.id_strategy = IdStrategy::Native;
                }
                (name.clone(), entity)
            })
            .collect();

        Self {
            added_entities,
            removed_entities: self.added_entities.clone(),
            modified_entities: self
                .modified_entities
                .iter()
                .map(|(name, diff)| (name.clone(), diff.reverse()))
                .collect(),
            renamed_entities: flip(&self.renamed_entities),
            possibly_renamed_entities: flip(&self.possibly_renamed_entities),
        }
    }

    /// 変更内容の要約
    ///
    /// 例: `"2 added tables, 1 removed tables, 3 modified tables"`
    pub fn describe(&self) -> String {
        let counts = [
            (self.added_entities.len(), "added tables"),
            (self.removed_entities.len(), "removed tables"),
            (self.modified_entities.len(), "modified tables"),
            (self.renamed_entities.len(), "renamed tables"),
        ];
        join_counts(&counts)
    }
}

impl fmt::Display for DatabaseDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, "addedTables", self.added_entities.keys())?;
        write_names(f, "removedTables", self.removed_entities.keys())?;
        if !self.modified_entities.is_empty() {
            writeln!(f, "  modifiedTables:")?;
            for diff in self.modified_entities.values() {
                for line in diff.to_string().lines() {
                    writeln!(f, "    {}", line)?;
                }
            }
        }
        if !self.renamed_entities.is_empty() {
            writeln!(f, "  renamedTables:")?;
            for (old_name, new_name) in &self.renamed_entities {
                writeln!(f, "    {}: {}", old_name, new_name)?;
            }
        }
        if !self.possibly_renamed_entities.is_empty() {
            writeln!(f, "  possiblyRenamedTables:")?;
            for (old_name, new_name) in &self.possibly_renamed_entities {
                writeln!(f, "    {}: {}", old_name, new_name)?;
            }
        }
        Ok(())
    }
}

fn flip(map: &IndexMap<String, String>) -> IndexMap<String, String> {
    map.iter()
        .map(|(old_name, new_name)| (new_name.clone(), old_name.clone()))
        .collect()
}

fn join_counts(counts: &[(usize, &str)]) -> String {
    counts
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_names<'a>(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    names: impl ExactSizeIterator<Item = &'a String>,
) -> fmt::Result {
    if names.len() == 0 {
        return Ok(());
    }
    writeln!(f, "  {}:", label)?;
    for name in names {
        writeln!(f, "    - {}", name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{DefaultValue, LogicalType};

    fn book() -> Entity {
        let mut entity = Entity::new("book".to_string());
        entity
            .add_field(Field::primary_key("id".to_string(), LogicalType::Integer))
            .unwrap();
        entity
    }

    #[test]
    fn test_change_between() {
        assert!(Change::between(1, 1).is_none());
        let change = Change::between(1, 2).unwrap();
        assert_eq!(change.reverse(), Change::new(2, 1));
    }

    #[test]
    fn test_property_changes_empty() {
        let changes = PropertyChanges::default();
        assert!(changes.is_empty());
        assert_eq!(changes.len(), 0);
        assert!(changes.describe_each().is_empty());
    }

    #[test]
    fn test_property_changes_reverse() {
        let changes = PropertyChanges {
            logical_type: Some(Change::new(LogicalType::Integer, LogicalType::BigInt)),
            not_null: Some(Change::new(false, true)),
            ..Default::default()
        };

        let reversed = changes.reverse();

        assert_eq!(
            reversed.logical_type,
            Some(Change::new(LogicalType::BigInt, LogicalType::Integer))
        );
        assert_eq!(reversed.not_null, Some(Change::new(true, false)));
        assert_eq!(reversed.reverse(), changes);
    }

    #[test]
    fn test_property_changes_listing() {
        let changes = PropertyChanges {
            size: Some(Change::new(Some(100), Some(255))),
            default_value: Some(Change::new(None, Some("draft".to_string()))),
            ..Default::default()
        };

        assert_eq!(
            changes.changed_properties(),
            vec![FieldProperty::Size, FieldProperty::DefaultValue]
        );
        assert!(changes.contains(FieldProperty::Size));
        assert!(!changes.contains(FieldProperty::LogicalType));
        assert_eq!(
            changes.describe_each(),
            vec![
                "size: 100 -> 255".to_string(),
                "defaultValueValue: null -> draft".to_string()
            ]
        );
    }

    #[test]
    fn test_field_diff_reverse() {
        let from = Field::new("status".to_string(), LogicalType::Varchar);
        let to = from.clone().with_default(DefaultValue::value("draft"));
        let changes = PropertyChanges {
            default_kind: Some(Change::new(None, Some(DefaultKind::Value))),
            default_value: Some(Change::new(None, Some("draft".to_string()))),
            ..Default::default()
        };
        let diff = FieldDiff::new(from.clone(), to.clone(), changes);

        let reversed = diff.reverse();

        assert_eq!(reversed.from, to);
        assert_eq!(reversed.to, from);
        assert_eq!(reversed.reverse(), diff);
    }

    #[test]
    fn test_entity_diff_new_is_empty() {
        let diff = EntityDiff::new("book".to_string());
        assert_eq!(diff.name(), "book");
        assert!(diff.is_empty());
        assert_eq!(diff.describe(), "");
    }

    #[test]
    fn test_entity_diff_reverse_swaps_partitions() {
        let mut diff = EntityDiff::new("book".to_string());
        diff.add_added_field(Field::new("isbn".to_string(), LogicalType::Varchar));
        diff.add_removed_index(Index::new("book_title".to_string(), vec!["title".to_string()]));

        let reversed = diff.reverse();

        assert!(reversed.added_fields().is_empty());
        assert!(reversed.removed_fields().contains_key("isbn"));
        assert!(reversed.added_indexes().contains_key("book_title"));
        assert_eq!(reversed.reverse(), diff);
    }

    #[test]
    fn test_entity_diff_promote_field_rename() {
        let mut diff = EntityDiff::new("book".to_string());
        diff.add_removed_field(Field::new("name".to_string(), LogicalType::Varchar));
        diff.add_added_field(Field::new("title".to_string(), LogicalType::Varchar));

        diff.promote_field_rename("name", "title");

        assert!(diff.added_fields().is_empty());
        assert!(diff.removed_fields().is_empty());
        assert_eq!(diff.renamed_fields()["name"].to.name, "title");
        assert_eq!(diff.count(), 1);

        let reversed = diff.reverse();
        assert_eq!(reversed.renamed_fields()["title"].to.name, "name");
        assert_eq!(reversed.reverse(), diff);
    }

    #[test]
    fn test_entity_diff_describe() {
        let mut diff = EntityDiff::new("book".to_string());
        diff.add_added_field(Field::new("isbn".to_string(), LogicalType::Varchar));
        diff.add_modified_index(
            "book_isbn".to_string(),
            Replacement::new(
                Index::new("book_isbn".to_string(), vec!["isbn".to_string()]),
                Index::unique("book_isbn".to_string(), vec!["isbn".to_string()]),
            ),
        );

        assert_eq!(diff.describe(), "1 added fields, 1 modified indexes");
    }

    #[test]
    fn test_database_diff_describe() {
        let mut diff = DatabaseDiff::new();
        diff.add_added_entity(book());
        diff.add_added_entity(Entity::new("author".to_string()));
        diff.add_removed_entity(Entity::new("publisher".to_string()));

        assert_eq!(diff.count(), 3);
        assert_eq!(diff.describe(), "2 added tables, 1 removed tables");
    }

    #[test]
    fn test_database_diff_promote_rename() {
        let mut diff = DatabaseDiff::new();
        diff.add_removed_entity(book());
        diff.add_added_entity(book().renamed("novel".to_string()));

        diff.promote_entity_rename("book", "novel");

        assert!(diff.added_entities().is_empty());
        assert!(diff.removed_entities().is_empty());
        assert_eq!(diff.renamed_entities()["book"], "novel");
        assert_eq!(diff.count(), 1);
        assert_eq!(diff.describe(), "1 renamed tables");
    }

    #[test]
    fn test_database_diff_reverse_is_involution() {
        let mut diff = DatabaseDiff::new();
        diff.add_added_entity(book());
        diff.add_removed_entity(Entity::new("publisher".to_string()));
        diff.add_possibly_renamed_entity("publisher", "book");

        let reversed = diff.reverse();

        assert!(reversed.added_entities().contains_key("publisher"));
        assert!(reversed.removed_entities().contains_key("book"));
        assert_eq!(reversed.possibly_renamed_entities()["book"], "publisher");
        assert_eq!(reversed.reverse(), diff);
    }

    #[test]
    fn test_database_diff_reverse_normalizes_id_strategy() {
        let mut legacy = Entity::new("legacy_log".to_string());
        legacy.id_strategy = IdStrategy::None;

        let mut diff = DatabaseDiff::new();
        diff.add_removed_entity(legacy.clone());
        diff.add_added_entity(legacy.renamed("fresh_log".to_string()));

        let reversed = diff.reverse();

        // 削除 -> 追加に移るものだけが正規化される
        assert_eq!(
            reversed.added_entities()["legacy_log"].id_strategy,
            IdStrategy::Native
        );
        assert_eq!(
            reversed.removed_entities()["fresh_log"].id_strategy,
            IdStrategy::None
        );
    }

    #[test]
    fn test_database_diff_display() {
        let mut entity_diff = EntityDiff::new("book".to_string());
        entity_diff.add_added_field(Field::new("isbn".to_string(), LogicalType::Varchar));

        let mut diff = DatabaseDiff::new();
        diff.add_added_entity(Entity::new("author".to_string()));
        diff.add_modified_entity("book".to_string(), entity_diff);

        let text = diff.to_string();
        assert!(text.contains("addedTables:"));
        assert!(text.contains("- author"));
        assert!(text.contains("modifiedTables:"));
        assert!(text.contains("addedFields:"));
        assert!(text.contains("- isbn"));
    }

    #[test]
    fn test_database_diff_serialization() {
        let mut diff = DatabaseDiff::new();
        diff.add_added_entity(book());

        let json = serde_json::to_string(&diff).unwrap();
        assert!(json.contains("added_entities"));
        // 空のリネームマップは出力されない
        assert!(!json.contains("renamed_entities"));

        let restored: DatabaseDiff = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, diff);
    }
}
