// スキーマ差分検出サービス
//
// 2つのスキーマスナップショット間の差分を検出するサービス。
// エンティティ、フィールド、インデックス、リレーションの追加、削除、変更を検出します。

mod entity_comparator;
mod field_comparator;
mod index_comparator;
mod relation_comparator;

pub use entity_comparator::EntityComparator;
pub use field_comparator::FieldComparator;
pub use index_comparator::IndexComparator;
pub use relation_comparator::RelationComparator;

use std::borrow::Cow;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::core::config::{ComparisonOptions, DiffConfig, ExclusionFilter};
use crate::core::error::ConfigError;
use crate::core::schema::{Database, Entity, Field, Index, Relation};
use crate::core::schema_diff::{DatabaseDiff, EntityDiff, PropertyChanges};
use crate::core::type_mapping::TypeMapper;
use crate::services::traits::{EntityNormalizer, SchemaComparator};

/// データベース比較サービス
///
/// 比較オプションを保持し、2つのスナップショット間の差分を検出します。
#[derive(Debug, Clone)]
pub struct DatabaseComparator {
    options: ComparisonOptions,
    exclusion_filter: ExclusionFilter,
    entity_comparator: EntityComparator,
    normalizer: Option<Arc<dyn EntityNormalizer>>,
}

impl DatabaseComparator {
    /// 新しいDatabaseComparatorを作成
    ///
    /// 除外パターンが不正な場合はエラーを返します。
    pub fn new(options: ComparisonOptions) -> Result<Self, ConfigError> {
        let exclusion_filter = options.exclusion_filter()?;
        let entity_comparator = EntityComparator::from_options(&options);

        Ok(Self {
            options,
            exclusion_filter,
            entity_comparator,
            normalizer: None,
        })
    }

    /// 設定ファイルの内容から作成
    ///
    /// 比較オプションに加えて型マッピングの上書きも反映します。
    pub fn from_config(config: &DiffConfig) -> Result<Self, ConfigError> {
        let type_mapper = config.type_mapper()?;
        Ok(Self::new(config.to_options())?.with_type_mapper(Arc::new(type_mapper)))
    }

    /// 型マッピングを差し替える
    pub fn with_type_mapper(mut self, type_mapper: Arc<dyn TypeMapper>) -> Self {
        self.entity_comparator = self.entity_comparator.with_type_mapper(type_mapper);
        self
    }

    /// 比較前に適用する正規化を設定
    pub fn with_normalizer(mut self, normalizer: Arc<dyn EntityNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// 比較オプションを取得
    pub fn options(&self) -> &ComparisonOptions {
        &self.options
    }

    /// データベース差分を検出
    ///
    /// # Arguments
    ///
    /// * `from` - 変更前のスナップショット
    /// * `to` - 変更後のスナップショット
    ///
    /// # Returns
    ///
    /// 差分があれば `Some`、なければ `None`
    pub fn compare(&self, from: &Database, to: &Database) -> Option<DatabaseDiff> {
        let mut diff = DatabaseDiff::new();
        let case_insensitive = self.options.case_insensitive;

        // 追加されたエンティティ
        for entity in to.entities() {
            if self.is_ignored(entity) {
                continue;
            }
            if from.find_entity(entity.name(), case_insensitive).is_none() {
                trace!(entity = %entity.name(), "Entity added");
                diff.add_added_entity(self.normalized(entity).into_owned());
            }
        }

        // 削除されたエンティティ
        if self.options.remove_entities {
            for entity in from.entities() {
                if self.is_ignored(entity) {
                    continue;
                }
                if to.find_entity(entity.name(), case_insensitive).is_none() {
                    trace!(entity = %entity.name(), "Entity removed");
                    diff.add_removed_entity(self.normalized(entity).into_owned());
                }
            }
        }

        // 変更されたエンティティ
        for from_entity in from.entities() {
            if self.exclusion_filter.is_excluded(from_entity.name()) {
                continue;
            }
            if let Some(to_entity) = to.find_entity(from_entity.name(), case_insensitive) {
                let from_entity = self.normalized(from_entity);
                let to_entity = self.normalized(to_entity);
                if let Some(entity_diff) = self.entity_comparator.compare(&from_entity, &to_entity)
                {
                    trace!(
                        entity = %from_entity.name(),
                        changes = entity_diff.count(),
                        "Entity modified"
                    );
                    diff.add_modified_entity(from_entity.name().to_string(), entity_diff);
                }
            }
        }

        // リネームの検出
        self.detect_entity_renames(&mut diff);

        debug!(
            added = diff.added_entities().len(),
            removed = diff.removed_entities().len(),
            modified = diff.modified_entities().len(),
            renamed = diff.renamed_entities().len(),
            possibly_renamed = diff.possibly_renamed_entities().len(),
            "Database comparison finished"
        );

        if diff.is_empty() {
            None
        } else {
            Some(diff)
        }
    }

    /// 構造が同一の追加・削除エンティティの組を検出
    ///
    /// 追加エンティティごとに、削除エンティティを名前順に走査し最初の一致を採用します。
    /// リネーム検出が無効な場合は参考情報として記録し、追加・削除はそのまま残します。
    fn detect_entity_renames(&self, diff: &mut DatabaseDiff) {
        let added: Vec<Entity> = diff.added_entities().values().cloned().collect();

        for added_entity in &added {
            let removed: Vec<Entity> = diff.removed_entities().values().cloned().collect();

            for removed_entity in &removed {
                if self
                    .entity_comparator
                    .compare_ignoring_name(removed_entity, added_entity)
                    .is_some()
                {
                    continue;
                }

                if self.options.with_renaming {
                    debug!(
                        from = %removed_entity.name(),
                        to = %added_entity.name(),
                        "Entity renamed"
                    );
                    diff.promote_entity_rename(removed_entity.name(), added_entity.name());
                } else {
                    debug!(
                        from = %removed_entity.name(),
                        to = %added_entity.name(),
                        "Entity possibly renamed"
                    );
                    diff.add_possibly_renamed_entity(removed_entity.name(), added_entity.name());
                }
                break;
            }
        }
    }

    /// 除外対象またはDDL生成対象外のエンティティか
    fn is_ignored(&self, entity: &Entity) -> bool {
        entity.skip_sql || self.exclusion_filter.is_excluded(entity.name())
    }

    fn normalized<'a>(&self, entity: &'a Entity) -> Cow<'a, Entity> {
        match &self.normalizer {
            Some(normalizer) => Cow::Owned(normalizer.normalize(entity)),
            None => Cow::Borrowed(entity),
        }
    }
}

impl SchemaComparator for DatabaseComparator {
    fn compare_databases(&self, from: &Database, to: &Database) -> Option<DatabaseDiff> {
        self.compare(from, to)
    }
}

/// フィールド間の変更を検出
pub fn compare_fields(from: &Field, to: &Field) -> PropertyChanges {
    FieldComparator::new().compare(from, to)
}

/// インデックスが異なるかどうか
pub fn compare_index(from: &Index, to: &Index) -> bool {
    IndexComparator::default().compare(from, to)
}

/// リレーションが異なるかどうか
pub fn compare_relation(from: &Relation, to: &Relation) -> bool {
    RelationComparator::default().compare(from, to)
}

/// エンティティ差分を検出
pub fn compare_entities(from: &Entity, to: &Entity) -> Option<EntityDiff> {
    EntityComparator::new().compare(from, to)
}

/// データベース差分を検出
///
/// 除外パターンが不正な場合のみエラーを返します。
pub fn compare_databases(
    from: &Database,
    to: &Database,
    options: &ComparisonOptions,
) -> Result<Option<DatabaseDiff>, ConfigError> {
    Ok(DatabaseComparator::new(options.clone())?.compare(from, to))
}
