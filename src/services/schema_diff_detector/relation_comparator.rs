// リレーション（外部キー）レベルの差分検出

use crate::core::naming;
use crate::core::schema::{ReferentialAction, Relation};

/// リレーション比較
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationComparator {
    case_insensitive: bool,
    default_action: ReferentialAction,
}

impl RelationComparator {
    /// 未指定アクションの実効値を指定して作成
    pub fn new(case_insensitive: bool, default_action: ReferentialAction) -> Self {
        Self {
            case_insensitive,
            default_action,
        }
    }

    /// リレーションが異なるかどうか
    ///
    /// 参照先エンティティ、参照ペアの集合、実効ON UPDATE / ON DELETE、
    /// DDL対象外フラグのいずれかが異なる場合に `true` を返します。
    /// 参照ペアの並び順は比較に影響しません。
    pub fn compare(&self, from: &Relation, to: &Relation) -> bool {
        if !self.names_equal(&from.foreign_entity, &to.foreign_entity) {
            return true;
        }

        if self.sorted_pairs(from) != self.sorted_pairs(to) {
            return true;
        }

        if self.effective_action(from.on_update) != self.effective_action(to.on_update) {
            return true;
        }

        if self.effective_action(from.on_delete) != self.effective_action(to.on_delete) {
            return true;
        }

        from.skip_sql != to.skip_sql
    }

    /// 未指定のアクションを既定値で補完
    pub fn effective_action(&self, action: Option<ReferentialAction>) -> ReferentialAction {
        action.unwrap_or(self.default_action)
    }

    fn sorted_pairs(&self, relation: &Relation) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = relation
            .references
            .iter()
            .map(|r| (self.fold(&r.local), self.fold(&r.foreign)))
            .collect();
        pairs.sort();
        pairs
    }

    fn names_equal(&self, a: &str, b: &str) -> bool {
        naming::names_equal(a, b, self.case_insensitive)
    }

    fn fold(&self, name: &str) -> String {
        naming::fold_name(name, self.case_insensitive).into_owned()
    }
}
