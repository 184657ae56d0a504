// Services Layer
// 比較処理と設定ファイルの読み込みを行うサービス層

pub mod config_loader;
pub mod schema_diff_detector;
pub mod traits;
