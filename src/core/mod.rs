// Core Domain
// スキーマモデル、差分モデル、設定、型マッピングの純粋なドメインロジック

pub mod config;
pub mod error;
pub mod naming;
pub mod schema;
pub mod schema_diff;
pub mod type_mapping;
