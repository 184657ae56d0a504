// インデックスレベルの差分検出

use crate::core::naming;
use crate::core::schema::Index;

/// インデックス比較
///
/// インデックスとユニーク制約を同じ規則で比較します。
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexComparator {
    case_insensitive: bool,
}

impl IndexComparator {
    pub fn new(case_insensitive: bool) -> Self {
        Self { case_insensitive }
    }

    /// インデックスが異なるかどうか
    ///
    /// 種類、または構成フィールド名の並びが異なる場合に `true` を返します。
    /// フィールドごとのプレフィックス長は比較しません。
    pub fn compare(&self, from: &Index, to: &Index) -> bool {
        if from.kind != to.kind {
            return true;
        }

        let from_names = from.field_names();
        let to_names = to.field_names();
        if from_names.len() != to_names.len() {
            return true;
        }

        from_names
            .iter()
            .zip(to_names.iter())
            .any(|(a, b)| !naming::names_equal(a, b, self.case_insensitive))
    }
}
