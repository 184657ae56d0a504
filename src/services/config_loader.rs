// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oはこのサービスに集約する。

use crate::core::config::DiffConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込む
    ///
    /// 読み込んだ設定は検証済みの状態で返します。
    pub fn from_file(path: &Path) -> Result<DiffConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: DiffConfig =
            serde_saphyr::from_str(&content).with_context(|| "Failed to parse config file")?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;

        debug!(
            path = %path.display(),
            excluded = config.excluded_entities.len(),
            type_overrides = config.type_mapping.len(),
            "Loaded diff config"
        );
        Ok(config)
    }

    /// デフォルトパスから設定を読み込む
    pub fn load_default() -> Result<DiffConfig> {
        let path = Path::new(DiffConfig::DEFAULT_CONFIG_PATH);
        Self::from_file(path)
    }
}
