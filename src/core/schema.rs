// スキーマドメインモデル
//
// 差分エンジンの入力となるスキーマスナップショットを表現する型システム。
// Database, Entity, Field, Index, Relation などの構造体を提供します。
// 各コンテナは名前をキーとし、重複した名前は構築時に拒否されます。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::error::{ConfigError, ElementKind, ErrorLocation, SchemaError};
use crate::core::naming;

/// データベース定義（スキーマスナップショット）
///
/// 名前をキーとするエンティティの集合を保持します。
/// エンティティは名前順で保持されるため、走査順は常に辞書順です。
/// デシリアライズ時も `add_entity` を経由するため、名前の重複は拒否されます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatabaseSnapshot")]
pub struct Database {
    /// データベース名
    pub name: String,

    /// エンティティ定義のマップ（エンティティ名 -> Entity）
    entities: BTreeMap<String, Entity>,
}

/// デシリアライズ用のデータベース表現
///
/// マップのキーは参照せず、各要素の名前で再構築します。
#[derive(Deserialize)]
struct DatabaseSnapshot {
    name: String,
    #[serde(default)]
    entities: BTreeMap<String, Entity>,
}

impl TryFrom<DatabaseSnapshot> for Database {
    type Error = SchemaError;

    fn try_from(snapshot: DatabaseSnapshot) -> Result<Self, Self::Error> {
        let mut database = Database::new(snapshot.name);
        for entity in snapshot.entities.into_values() {
            database.add_entity(entity)?;
        }
        Ok(database)
    }
}

impl Database {
    /// 新しいデータベースを作成
    pub fn new(name: String) -> Self {
        Self {
            name,
            entities: BTreeMap::new(),
        }
    }

    /// エンティティを追加
    ///
    /// 同名のエンティティが既に存在する場合はエラーを返します。
    pub fn add_entity(&mut self, entity: Entity) -> Result<(), SchemaError> {
        if self.entities.contains_key(entity.name()) {
            return Err(SchemaError::duplicate(
                ElementKind::Entity,
                entity.name(),
                None,
            ));
        }
        self.entities.insert(entity.name().to_string(), entity);
        Ok(())
    }

    /// 指定されたエンティティが存在するか確認
    pub fn has_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// 指定されたエンティティを取得
    pub fn get_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// エンティティを検索（大文字小文字の区別を選択可能）
    pub fn find_entity(&self, name: &str, case_insensitive: bool) -> Option<&Entity> {
        if !case_insensitive {
            return self.get_entity(name);
        }
        self.entities
            .values()
            .find(|entity| naming::names_equal(entity.name(), name, true))
    }

    /// 全エンティティを名前順で取得
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// エンティティ数を取得
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

/// ID生成戦略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// データベースネイティブの自動採番
    #[default]
    Native,
    /// ID生成なし
    None,
}

/// エンティティ定義
///
/// 単一のテーブルの構造を表現します。
/// フィールドは定義順を保持し、インデックスとユニーク制約は同じ名前空間で管理されます。
/// デシリアライズ時も `add_*` を経由するため、名前・識別子の重複は拒否されます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EntitySnapshot")]
pub struct Entity {
    /// エンティティ名
    name: String,

    /// フィールド定義（フィールド名 -> Field、定義順）
    fields: IndexMap<String, Field>,

    /// インデックス・ユニーク制約（インデックス名 -> Index）
    indexes: IndexMap<String, Index>,

    /// リレーション（識別子 -> Relation）
    relations: IndexMap<String, Relation>,

    /// 差分計算から除外するかどうか
    #[serde(skip_serializing_if = "is_false")]
    pub skip_sql: bool,

    /// ID生成戦略
    pub id_strategy: IdStrategy,
}

/// デシリアライズ用のエンティティ表現
///
/// マップのキーは参照せず、フィールド・インデックスは名前で、
/// リレーションは識別子で再構築します。
#[derive(Deserialize)]
struct EntitySnapshot {
    name: String,
    #[serde(default)]
    fields: IndexMap<String, Field>,
    #[serde(default)]
    indexes: IndexMap<String, Index>,
    #[serde(default)]
    relations: IndexMap<String, Relation>,
    #[serde(default)]
    skip_sql: bool,
    #[serde(default)]
    id_strategy: IdStrategy,
}

impl TryFrom<EntitySnapshot> for Entity {
    type Error = SchemaError;

    fn try_from(snapshot: EntitySnapshot) -> Result<Self, Self::Error> {
        let mut entity = Entity::new(snapshot.name);
        entity.skip_sql = snapshot.skip_sql;
        entity.id_strategy = snapshot.id_strategy;

        for field in snapshot.fields.into_values() {
            entity.add_field(field)?;
        }
        for index in snapshot.indexes.into_values() {
            entity.add_index(index)?;
        }
        for relation in snapshot.relations.into_values() {
            entity.add_relation(relation)?;
        }
        Ok(entity)
    }
}

impl Entity {
    /// 新しいエンティティを作成
    pub fn new(name: String) -> Self {
        Self {
            name,
            fields: IndexMap::new(),
            indexes: IndexMap::new(),
            relations: IndexMap::new(),
            skip_sql: false,
            id_strategy: IdStrategy::default(),
        }
    }

    /// エンティティ名を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 名前だけを差し替えたコピーを作成
    ///
    /// 名前のないリレーションの識別子は新しい名前で再計算されます。
    pub fn renamed(&self, name: String) -> Self {
        let relations = self
            .relations
            .values()
            .map(|relation| (relation.identifier(&name), relation.clone()))
            .collect();

        Self {
            name,
            relations,
            ..self.clone()
        }
    }

    /// フィールドを追加
    pub fn add_field(&mut self, field: Field) -> Result<(), SchemaError> {
        if self.fields.contains_key(&field.name) {
            return Err(SchemaError::duplicate(
                ElementKind::Field,
                &field.name,
                Some(ErrorLocation::with_entity(&self.name)),
            ));
        }
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }

    /// インデックスまたはユニーク制約を追加
    ///
    /// インデックスとユニーク制約は名前を共有するため、
    /// 種類が異なっても同名であれば重複として扱います。
    pub fn add_index(&mut self, index: Index) -> Result<(), SchemaError> {
        if self.indexes.contains_key(&index.name) {
            return Err(SchemaError::duplicate(
                ElementKind::Index,
                &index.name,
                Some(ErrorLocation::with_entity(&self.name)),
            ));
        }
        self.indexes.insert(index.name.clone(), index);
        Ok(())
    }

    /// ユニーク制約を追加
    pub fn add_unique(&mut self, mut index: Index) -> Result<(), SchemaError> {
        index.kind = IndexKind::Unique;
        self.add_index(index)
    }

    /// リレーションを追加
    ///
    /// 名前のないリレーションは合成識別子で管理されます。
    pub fn add_relation(&mut self, relation: Relation) -> Result<(), SchemaError> {
        let identifier = relation.identifier(&self.name);
        if self.relations.contains_key(&identifier) {
            return Err(SchemaError::duplicate(
                ElementKind::Relation,
                &identifier,
                Some(ErrorLocation::with_entity(&self.name)),
            ));
        }
        self.relations.insert(identifier, relation);
        Ok(())
    }

    /// 全フィールドを定義順で取得
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// 指定されたフィールドを取得
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// フィールドを検索（大文字小文字の区別を選択可能）
    pub fn find_field(&self, name: &str, case_insensitive: bool) -> Option<&Field> {
        if !case_insensitive {
            return self.get_field(name);
        }
        self.fields
            .values()
            .find(|field| naming::names_equal(&field.name, name, true))
    }

    /// フィールド数を取得
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// プライマリキーのフィールドを取得
    pub fn primary_key(&self) -> Vec<&Field> {
        self.fields.values().filter(|f| f.primary_key).collect()
    }

    /// インデックスとユニーク制約をすべて取得
    pub fn all_indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes.values()
    }

    /// 通常のインデックスのみ取得
    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes
            .values()
            .filter(|index| index.kind == IndexKind::Index)
    }

    /// ユニーク制約のみ取得
    pub fn uniques(&self) -> impl Iterator<Item = &Index> {
        self.indexes
            .values()
            .filter(|index| index.kind == IndexKind::Unique)
    }

    /// インデックスを検索（大文字小文字の区別を選択可能）
    pub fn find_index(&self, name: &str, case_insensitive: bool) -> Option<&Index> {
        if !case_insensitive {
            return self.indexes.get(name);
        }
        self.indexes
            .values()
            .find(|index| naming::names_equal(&index.name, name, true))
    }

    /// 全リレーションを取得
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    /// 識別子でリレーションを取得
    pub fn get_relation(&self, identifier: &str) -> Option<&Relation> {
        self.relations.get(identifier)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// 論理型
///
/// フィールドの言語非依存な型を表現します。
/// SQL型は明示的な上書きがない限り論理型から導出されます。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalType {
    Char,
    Varchar,
    LongVarchar,
    Clob,
    Numeric,
    Decimal,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Float,
    Double,
    Binary,
    VarBinary,
    LongVarBinary,
    Blob,
    Date,
    Time,
    Timestamp,
    Boolean,
    Json,
    Uuid,
    Enum,
    Object,
    Array,
}

impl LogicalType {
    /// 全論理型
    pub const ALL: [LogicalType; 26] = [
        LogicalType::Char,
        LogicalType::Varchar,
        LogicalType::LongVarchar,
        LogicalType::Clob,
        LogicalType::Numeric,
        LogicalType::Decimal,
        LogicalType::TinyInt,
        LogicalType::SmallInt,
        LogicalType::Integer,
        LogicalType::BigInt,
        LogicalType::Real,
        LogicalType::Float,
        LogicalType::Double,
        LogicalType::Binary,
        LogicalType::VarBinary,
        LogicalType::LongVarBinary,
        LogicalType::Blob,
        LogicalType::Date,
        LogicalType::Time,
        LogicalType::Timestamp,
        LogicalType::Boolean,
        LogicalType::Json,
        LogicalType::Uuid,
        LogicalType::Enum,
        LogicalType::Object,
        LogicalType::Array,
    ];

    /// 型名を返す
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalType::Char => "CHAR",
            LogicalType::Varchar => "VARCHAR",
            LogicalType::LongVarchar => "LONGVARCHAR",
            LogicalType::Clob => "CLOB",
            LogicalType::Numeric => "NUMERIC",
            LogicalType::Decimal => "DECIMAL",
            LogicalType::TinyInt => "TINYINT",
            LogicalType::SmallInt => "SMALLINT",
            LogicalType::Integer => "INTEGER",
            LogicalType::BigInt => "BIGINT",
            LogicalType::Real => "REAL",
            LogicalType::Float => "FLOAT",
            LogicalType::Double => "DOUBLE",
            LogicalType::Binary => "BINARY",
            LogicalType::VarBinary => "VARBINARY",
            LogicalType::LongVarBinary => "LONGVARBINARY",
            LogicalType::Blob => "BLOB",
            LogicalType::Date => "DATE",
            LogicalType::Time => "TIME",
            LogicalType::Timestamp => "TIMESTAMP",
            LogicalType::Boolean => "BOOLEAN",
            LogicalType::Json => "JSON",
            LogicalType::Uuid => "UUID",
            LogicalType::Enum => "ENUM",
            LogicalType::Object => "OBJECT",
            LogicalType::Array => "ARRAY",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogicalType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogicalType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownLogicalType {
                name: s.to_string(),
            })
    }
}

/// フィールド定義
///
/// エンティティ内の単一カラムの構造を表現します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// フィールド名
    pub name: String,

    /// 論理型
    #[serde(rename = "type")]
    pub logical_type: LogicalType,

    /// SQL型の明示的な上書き
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,

    /// サイズ（文字列長、精度など）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,

    /// 小数点以下の桁数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,

    /// NOT NULL制約
    #[serde(default)]
    pub not_null: bool,

    /// デフォルト値
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,

    /// 自動増分フラグ
    #[serde(default)]
    pub auto_increment: bool,

    /// プライマリキーの構成フィールドかどうか
    #[serde(default)]
    pub primary_key: bool,
}

impl Field {
    /// 新しいフィールドを作成
    pub fn new(name: String, logical_type: LogicalType) -> Self {
        Self {
            name,
            logical_type,
            sql_type: None,
            size: None,
            scale: None,
            not_null: false,
            default_value: None,
            auto_increment: false,
            primary_key: false,
        }
    }

    /// 自動増分のプライマリキーフィールドを作成
    pub fn primary_key(name: String, logical_type: LogicalType) -> Self {
        Self {
            not_null: true,
            auto_increment: true,
            primary_key: true,
            ..Self::new(name, logical_type)
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_sql_type(mut self, sql_type: &str) -> Self {
        self.sql_type = Some(sql_type.to_string());
        self
    }

    pub fn with_default(mut self, default_value: DefaultValue) -> Self {
        self.default_value = Some(default_value);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

/// デフォルト値の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultKind {
    /// リテラル値
    Value,
    /// SQL式（関数呼び出し、キーワードなど）
    Expression,
}

impl fmt::Display for DefaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultKind::Value => write!(f, "value"),
            DefaultKind::Expression => write!(f, "expression"),
        }
    }
}

/// デフォルト値
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefaultValue {
    /// 種類
    pub kind: DefaultKind,

    /// 値またはSQL式
    pub value: String,
}

impl DefaultValue {
    /// リテラル値のデフォルトを作成
    pub fn value(value: &str) -> Self {
        Self {
            kind: DefaultKind::Value,
            value: value.to_string(),
        }
    }

    /// SQL式のデフォルトを作成
    pub fn expression(expression: &str) -> Self {
        Self {
            kind: DefaultKind::Expression,
            value: expression.to_string(),
        }
    }

    /// SQL式かどうか
    pub fn is_expression(&self) -> bool {
        self.kind == DefaultKind::Expression
    }
}

/// インデックスの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Index,
    Unique,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Index => write!(f, "index"),
            IndexKind::Unique => write!(f, "unique"),
        }
    }
}

/// インデックス構成フィールド
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexField {
    /// フィールド名
    pub name: String,

    /// プレフィックス長の上書き
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

/// インデックス定義
///
/// インデックスまたはユニーク制約を表現します。
/// 構成フィールドの順序は意味を持ちます。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Index {
    /// インデックス名
    pub name: String,

    /// 種類
    pub kind: IndexKind,

    /// 構成フィールド（順序を保持）
    pub fields: Vec<IndexField>,
}

impl Index {
    /// 新しいインデックスを作成
    pub fn new(name: String, fields: Vec<String>) -> Self {
        Self::with_kind(name, IndexKind::Index, fields)
    }

    /// 新しいユニーク制約を作成
    pub fn unique(name: String, fields: Vec<String>) -> Self {
        Self::with_kind(name, IndexKind::Unique, fields)
    }

    /// 種類を指定して作成
    pub fn with_kind(name: String, kind: IndexKind, fields: Vec<String>) -> Self {
        Self {
            name,
            kind,
            fields: fields
                .into_iter()
                .map(|name| IndexField { name, size: None })
                .collect(),
        }
    }

    /// サイズ指定付きでフィールドを追加
    pub fn add_field_with_size(&mut self, name: String, size: Option<u32>) {
        self.fields.push(IndexField { name, size });
    }

    /// ユニーク制約かどうか
    pub fn is_unique(&self) -> bool {
        self.kind == IndexKind::Unique
    }

    /// 構成フィールド名を順序通りに取得
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// 参照アクション
///
/// リレーションのON DELETE / ON UPDATE句で使用するアクションを表現します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferentialAction {
    /// 参照先の削除/更新を制限（エンジンの既定）
    #[default]
    Restrict,
    /// 参照先の変更に追従して削除/更新
    Cascade,
    /// 参照先の削除/更新時にNULLに設定
    SetNull,
    /// 参照先の削除/更新時にデフォルト値に設定
    SetDefault,
    /// 何もしない
    NoAction,
}

impl ReferentialAction {
    /// SQL句として出力する文字列を返す
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// 参照ペア（ローカルフィールド -> 参照先フィールド）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    pub local: String,
    pub foreign: String,
}

/// リレーション定義（外部キー）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// リレーション名（任意）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// 参照先エンティティ
    pub foreign_entity: String,

    /// 参照ペア
    pub references: Vec<Reference>,

    /// 参照先レコード更新時のアクション
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,

    /// 参照先レコード削除時のアクション
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,

    /// DDL生成の対象外とするかどうか
    #[serde(default, skip_serializing_if = "is_false")]
    pub skip_sql: bool,
}

impl Relation {
    /// 新しいリレーションを作成
    pub fn new(foreign_entity: String) -> Self {
        Self {
            name: None,
            foreign_entity,
            references: Vec::new(),
            on_update: None,
            on_delete: None,
            skip_sql: false,
        }
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// 参照ペアを追加
    pub fn add_reference(&mut self, local: &str, foreign: &str) {
        self.references.push(Reference {
            local: local.to_string(),
            foreign: foreign.to_string(),
        });
    }

    /// ローカル側のフィールド名を取得
    pub fn local_fields(&self) -> Vec<&str> {
        self.references.iter().map(|r| r.local.as_str()).collect()
    }

    /// 参照先のフィールド名を取得
    pub fn foreign_fields(&self) -> Vec<&str> {
        self.references.iter().map(|r| r.foreign.as_str()).collect()
    }

    /// リレーションの識別子を取得
    ///
    /// 名前が指定されていればその名前、なければ所有エンティティ名と
    /// ローカルフィールドから合成した識別子を返します。
    pub fn identifier(&self, owner: &str) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => naming::relation_identifier(owner, &self.local_fields()),
        }
    }
}
