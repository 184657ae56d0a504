// エンティティレベルの差分検出

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use crate::core::config::ComparisonOptions;
use crate::core::naming;
use crate::core::schema::{Entity, Relation};
use crate::core::schema_diff::{EntityDiff, FieldDiff, Replacement};
use crate::core::type_mapping::TypeMapper;

use super::field_comparator::FieldComparator;
use super::index_comparator::IndexComparator;
use super::relation_comparator::RelationComparator;

/// エンティティ比較
///
/// フィールド、インデックス、リレーションの順に差分を検出します。
/// 正規化は呼び出し側の責務です。
#[derive(Debug, Clone, Default)]
pub struct EntityComparator {
    field_comparator: FieldComparator,
    index_comparator: IndexComparator,
    relation_comparator: RelationComparator,
    case_insensitive: bool,
    rename_fields: bool,
}

impl EntityComparator {
    /// 既定の設定で作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 比較オプションから作成
    pub fn from_options(options: &ComparisonOptions) -> Self {
        Self {
            field_comparator: FieldComparator::new(),
            index_comparator: IndexComparator::new(options.case_insensitive),
            relation_comparator: RelationComparator::new(
                options.case_insensitive,
                options.default_action,
            ),
            case_insensitive: options.case_insensitive,
            rename_fields: options.rename_fields,
        }
    }

    /// 型マッピングを差し替える
    pub fn with_type_mapper(mut self, type_mapper: Arc<dyn TypeMapper>) -> Self {
        self.field_comparator = FieldComparator::with_type_mapper(type_mapper);
        self
    }

    /// エンティティ差分を検出
    ///
    /// 差分がなければ `None` を返します。
    pub fn compare(&self, from: &Entity, to: &Entity) -> Option<EntityDiff> {
        self.detect_entity_diff(from, to, to.name())
    }

    /// エンティティ名を無視して差分を検出
    ///
    /// 無名リレーションの合成識別子は両側とも `from` の名前から導出されます。
    /// リネーム検出で使用します。
    pub fn compare_ignoring_name(&self, from: &Entity, to: &Entity) -> Option<EntityDiff> {
        self.detect_entity_diff(from, to, from.name())
    }

    fn detect_entity_diff(
        &self,
        from: &Entity,
        to: &Entity,
        to_owner: &str,
    ) -> Option<EntityDiff> {
        let mut entity_diff = EntityDiff::new(from.name().to_string());

        // フィールドの差分を検出
        self.detect_field_diff(from, to, &mut entity_diff);

        // インデックス・ユニーク制約の差分を検出
        self.detect_index_diff(from, to, &mut entity_diff);

        // リレーションの差分を検出
        self.detect_relation_diff(from, to, to_owner, &mut entity_diff);

        if entity_diff.is_empty() {
            None
        } else {
            Some(entity_diff)
        }
    }

    fn detect_field_diff(&self, from: &Entity, to: &Entity, entity_diff: &mut EntityDiff) {
        // 追加されたフィールド
        for field in to.fields() {
            if from.find_field(&field.name, self.case_insensitive).is_none() {
                trace!(entity = %from.name(), field = %field.name, "Field added");
                entity_diff.add_added_field(field.clone());
            }
        }

        for field in from.fields() {
            match to.find_field(&field.name, self.case_insensitive) {
                // 削除されたフィールド
                None => {
                    trace!(entity = %from.name(), field = %field.name, "Field removed");
                    entity_diff.add_removed_field(field.clone());
                }
                // 変更されたフィールド
                Some(to_field) => {
                    let changes = self.field_comparator.compare(field, to_field);
                    if !changes.is_empty() {
                        trace!(
                            entity = %from.name(),
                            field = %field.name,
                            changes = changes.len(),
                            "Field modified"
                        );
                        entity_diff.add_modified_field(FieldDiff::new(
                            field.clone(),
                            to_field.clone(),
                            changes,
                        ));
                    }
                }
            }
        }

        if self.rename_fields {
            self.detect_field_renames(entity_diff);
        }
    }

    /// 構造が同一の追加・削除フィールドの組をリネームに置き換える
    fn detect_field_renames(&self, entity_diff: &mut EntityDiff) {
        let added: Vec<_> = entity_diff.added_fields().values().cloned().collect();
        let removed: Vec<_> = entity_diff.removed_fields().values().cloned().collect();
        let mut consumed: HashSet<String> = HashSet::new();

        for added_field in &added {
            let candidate = removed.iter().find(|removed_field| {
                !consumed.contains(&removed_field.name)
                    && self
                        .field_comparator
                        .compare(removed_field, added_field)
                        .is_empty()
            });

            if let Some(removed_field) = candidate {
                trace!(
                    from = %removed_field.name,
                    to = %added_field.name,
                    "Field renamed"
                );
                consumed.insert(removed_field.name.clone());
                entity_diff.promote_field_rename(&removed_field.name, &added_field.name);
            }
        }
    }

    fn detect_index_diff(&self, from: &Entity, to: &Entity, entity_diff: &mut EntityDiff) {
        // 追加されたインデックス
        for index in to.all_indexes() {
            if from.find_index(&index.name, self.case_insensitive).is_none() {
                entity_diff.add_added_index(index.clone());
            }
        }

        for index in from.all_indexes() {
            match to.find_index(&index.name, self.case_insensitive) {
                // 削除されたインデックス
                None => entity_diff.add_removed_index(index.clone()),
                // 変更されたインデックス（種類の変更を含む）
                Some(to_index) => {
                    if self.index_comparator.compare(index, to_index) {
                        trace!(
                            entity = %from.name(),
                            index = %index.name,
                            "Index modified"
                        );
                        entity_diff.add_modified_index(
                            index.name.clone(),
                            Replacement::new(index.clone(), to_index.clone()),
                        );
                    }
                }
            }
        }
    }

    fn detect_relation_diff(
        &self,
        from: &Entity,
        to: &Entity,
        to_owner: &str,
        entity_diff: &mut EntityDiff,
    ) {
        let from_relations = self.keyed_relations(from, from.name());
        let to_relations = self.keyed_relations(to, to_owner);

        // 追加されたリレーション
        for (key, (identifier, relation)) in &to_relations {
            if !from_relations.contains_key(key) && !relation.skip_sql {
                entity_diff.add_added_relation(identifier.clone(), (*relation).clone());
            }
        }

        for (key, (identifier, relation)) in &from_relations {
            match to_relations.get(key) {
                // 削除されたリレーション
                None => {
                    if !relation.skip_sql {
                        entity_diff.add_removed_relation(identifier.clone(), (*relation).clone());
                    }
                }
                // 変更されたリレーション
                Some((_, to_relation)) => {
                    if self.relation_comparator.compare(relation, to_relation) {
                        trace!(
                            entity = %from.name(),
                            relation = %identifier,
                            "Relation modified"
                        );
                        entity_diff.add_modified_relation(
                            identifier.clone(),
                            Replacement::new((*relation).clone(), (*to_relation).clone()),
                        );
                    }
                }
            }
        }
    }

    /// 照合キー -> (識別子, リレーション)
    fn keyed_relations<'a>(
        &self,
        entity: &'a Entity,
        owner: &str,
    ) -> IndexMap<String, (String, &'a Relation)> {
        entity
            .relations()
            .map(|relation| {
                let identifier = relation.identifier(owner);
                let key = naming::fold_name(&identifier, self.case_insensitive).into_owned();
                (key, (identifier, relation))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{
        DefaultValue, Field, Index, LogicalType, ReferentialAction,
    };

    fn book() -> Entity {
        let mut entity = Entity::new("book".to_string());
        entity
            .add_field(Field::primary_key("id".to_string(), LogicalType::Integer))
            .unwrap();
        entity
            .add_field(Field::new("title".to_string(), LogicalType::Varchar).with_size(255))
            .unwrap();
        entity
            .add_field(Field::new("author_id".to_string(), LogicalType::Integer))
            .unwrap();
        entity
            .add_index(Index::new("book_title".to_string(), vec!["title".to_string()]))
            .unwrap();
        let mut relation = Relation::new("author".to_string());
        relation.add_reference("author_id", "id");
        entity.add_relation(relation).unwrap();
        entity
    }

    #[test]
    fn test_compare_identical_entities() {
        let comparator = EntityComparator::new();
        assert!(comparator.compare(&book(), &book()).is_none());
    }

    #[test]
    fn test_compare_added_and_removed_fields() {
        let comparator = EntityComparator::new();
        let from = book();
        let mut to = book();
        to.add_field(Field::new("isbn".to_string(), LogicalType::Varchar))
            .unwrap();

        let diff = comparator.compare(&from, &to).unwrap();
        assert!(diff.added_fields().contains_key("isbn"));
        assert_eq!(diff.count(), 1);

        let diff = comparator.compare(&to, &from).unwrap();
        assert!(diff.removed_fields().contains_key("isbn"));
    }

    #[test]
    fn test_compare_modified_field() {
        let comparator = EntityComparator::new();
        let from = book();
        let mut to = Entity::new("book".to_string());
        for field in from.fields() {
            let field = if field.name == "title" {
                field.clone().with_default(DefaultValue::value("untitled"))
            } else {
                field.clone()
            };
            to.add_field(field).unwrap();
        }
        for index in from.all_indexes() {
            to.add_index(index.clone()).unwrap();
        }
        for relation in from.relations() {
            to.add_relation(relation.clone()).unwrap();
        }

        let diff = comparator.compare(&from, &to).unwrap();

        assert_eq!(diff.count(), 1);
        let field_diff = &diff.modified_fields()["title"];
        assert!(field_diff.changes.default_value.is_some());
    }

    #[test]
    fn test_compare_index_kind_change_is_one_modification() {
        let comparator = EntityComparator::new();
        let mut from = Entity::new("foo".to_string());
        from.add_index(Index::new("Baz_Index".to_string(), vec!["bar".to_string()]))
            .unwrap();
        let mut to = Entity::new("foo".to_string());
        to.add_unique(Index::new("Baz_Index".to_string(), vec!["bar".to_string()]))
            .unwrap();

        let diff = comparator.compare(&from, &to).unwrap();

        assert_eq!(diff.count(), 1);
        let change = &diff.modified_indexes()["Baz_Index"];
        assert!(!change.from.is_unique());
        assert!(change.to.is_unique());
    }

    #[test]
    fn test_compare_relation_added_and_removed() {
        let comparator = EntityComparator::new();
        let from = book();
        let mut to = book();
        let mut relation = Relation::new("publisher".to_string())
            .with_name("book_publisher_fk".to_string());
        relation.add_reference("publisher_id", "id");
        to.add_relation(relation).unwrap();

        let diff = comparator.compare(&from, &to).unwrap();
        assert!(diff.added_relations().contains_key("book_publisher_fk"));

        let diff = comparator.compare(&to, &from).unwrap();
        assert!(diff.removed_relations().contains_key("book_publisher_fk"));
    }

    #[test]
    fn test_compare_skip_sql_relation_is_never_added() {
        let comparator = EntityComparator::new();
        let from = book();
        let mut to = book();
        let mut relation = Relation::new("publisher".to_string());
        relation.add_reference("publisher_id", "id");
        relation.skip_sql = true;
        to.add_relation(relation).unwrap();

        assert!(comparator.compare(&from, &to).is_none());
        assert!(comparator.compare(&to, &from).is_none());
    }

    #[test]
    fn test_compare_relation_action_modified() {
        let comparator = EntityComparator::new();
        let from = book();
        let mut to = Entity::new("book".to_string());
        for field in from.fields() {
            to.add_field(field.clone()).unwrap();
        }
        for index in from.all_indexes() {
            to.add_index(index.clone()).unwrap();
        }
        let mut relation = Relation::new("author".to_string());
        relation.add_reference("author_id", "id");
        relation.on_delete = Some(ReferentialAction::Cascade);
        to.add_relation(relation).unwrap();

        let diff = comparator.compare(&from, &to).unwrap();

        assert_eq!(diff.modified_relations().len(), 1);
        let change = diff.modified_relations().values().next().unwrap();
        assert_eq!(change.to.on_delete, Some(ReferentialAction::Cascade));
    }

    #[test]
    fn test_compare_ignoring_name_matches_unnamed_relations() {
        let comparator = EntityComparator::new();
        let from = book();
        let to = book().renamed("novel".to_string());

        // 名前を考慮すると合成識別子が異なる
        let diff = comparator.compare(&from, &to).unwrap();
        assert_eq!(diff.added_relations().len(), 1);
        assert_eq!(diff.removed_relations().len(), 1);

        assert!(comparator.compare_ignoring_name(&from, &to).is_none());
    }

    #[test]
    fn test_field_rename_detection() {
        let options = ComparisonOptions::new().rename_fields(true);
        let comparator = EntityComparator::from_options(&options);

        let mut from = Entity::new("book".to_string());
        from.add_field(Field::new("name".to_string(), LogicalType::Varchar).with_size(100))
            .unwrap();
        let mut to = Entity::new("book".to_string());
        to.add_field(Field::new("title".to_string(), LogicalType::Varchar).with_size(100))
            .unwrap();

        let diff = comparator.compare(&from, &to).unwrap();

        assert!(diff.added_fields().is_empty());
        assert!(diff.removed_fields().is_empty());
        assert_eq!(diff.renamed_fields()["name"].to.name, "title");
        assert_eq!(diff.count(), 1);

        // 既定ではリネーム検出は行わない
        let diff = EntityComparator::new().compare(&from, &to).unwrap();
        assert_eq!(diff.count(), 2);
    }

    #[test]
    fn test_field_rename_requires_identical_properties() {
        let options = ComparisonOptions::new().rename_fields(true);
        let comparator = EntityComparator::from_options(&options);

        let mut from = Entity::new("book".to_string());
        from.add_field(Field::new("name".to_string(), LogicalType::Varchar).with_size(100))
            .unwrap();
        let mut to = Entity::new("book".to_string());
        to.add_field(Field::new("title".to_string(), LogicalType::Varchar).with_size(200))
            .unwrap();

        let diff = comparator.compare(&from, &to).unwrap();
        assert!(diff.renamed_fields().is_empty());
        assert_eq!(diff.count(), 2);
    }

    #[test]
    fn test_compare_case_insensitive_field_names() {
        let options = ComparisonOptions::new().case_insensitive(true);
        let comparator = EntityComparator::from_options(&options);

        let mut from = Entity::new("book".to_string());
        from.add_field(Field::new("Title".to_string(), LogicalType::Varchar))
            .unwrap();
        let mut to = Entity::new("book".to_string());
        to.add_field(Field::new("title".to_string(), LogicalType::Varchar))
            .unwrap();

        assert!(comparator.compare(&from, &to).is_none());
        assert!(EntityComparator::new().compare(&from, &to).is_some());
    }

    #[test]
    fn test_compare_case_insensitive_non_ascii_names() {
        fn entity(field: &str, index: &str, relation: &str) -> Entity {
            let mut entity = Entity::new("livre".to_string());
            entity
                .add_field(Field::new(field.to_string(), LogicalType::Integer))
                .unwrap();
            entity
                .add_index(Index::new(index.to_string(), vec![field.to_string()]))
                .unwrap();
            let mut fk = Relation::new("éditeur".to_string()).with_name(relation.to_string());
            fk.add_reference(field, "id");
            entity.add_relation(fk).unwrap();
            entity
        }

        let from = entity("ÉDITEUR_ID", "LIVRE_ÉDITEUR", "LIVRE_ÉDITEUR_FK");
        let to = entity("éditeur_id", "livre_éditeur", "livre_éditeur_fk");
        let options = ComparisonOptions::new().case_insensitive(true);

        assert!(EntityComparator::from_options(&options)
            .compare(&from, &to)
            .is_none());
    }
}
