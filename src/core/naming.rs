// 命名ポリシー
//
// アプリケーション名、設定ファイル名、名前のないリレーションの識別子合成、
// 大文字小文字を区別しない名前比較を単一ソースで提供します。

use sha2::{Digest, Sha256};
use std::borrow::Cow;

/// 現行アプリケーション名
pub const APP_NAME: &str = "stratum-diff";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".stratum-diff.yaml";

/// 合成識別子に使うハッシュの桁数
const RELATION_HASH_LENGTH: usize = 6;

/// 名前のないリレーションの識別子を合成
///
/// エンティティ名とローカルフィールド名（小文字化・ソート済み）から
/// 決定的な識別子を生成します。フィールドの列挙順には依存しません。
///
/// # Arguments
///
/// * `entity_name` - リレーションを保持するエンティティ名
/// * `local_fields` - ローカル側のフィールド名
///
/// # Returns
///
/// `{entity}_fk_{hash}` 形式の識別子
pub fn relation_identifier<S: AsRef<str>>(entity_name: &str, local_fields: &[S]) -> String {
    let mut names: Vec<String> = local_fields
        .iter()
        .map(|name| name.as_ref().to_lowercase())
        .collect();
    names.sort();

    let mut hasher = Sha256::new();
    hasher.update(names.join(",").as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    format!("{}_fk_{}", entity_name, &digest[..RELATION_HASH_LENGTH])
}

/// 名前の比較キーを返す
///
/// 大文字小文字を区別しない場合はUnicodeの小文字化を行います。
/// 名前の照合はすべてこの規則に従います。
pub fn fold_name(name: &str, case_insensitive: bool) -> Cow<'_, str> {
    if case_insensitive {
        Cow::Owned(name.to_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

/// 2つの名前が同一か
pub fn names_equal(a: &str, b: &str, case_insensitive: bool) -> bool {
    fold_name(a, case_insensitive) == fold_name(b, case_insensitive)
}
