use crate::config::types::GeneratorSettings;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// 工作目錄下的預設設定檔名稱
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

impl GeneratorSettings {
    /// 載入設定
    ///
    /// 指定路徑時檔案必須存在；未指定時讀取工作目錄的 settings.json，
    /// 不存在則使用預設值。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let default_path = Path::new(DEFAULT_SETTINGS_FILE);
                if default_path.exists() {
                    Self::load_from(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        settings.style.validate()?;
        Ok(settings)
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }

    /// 未知欄位會被拒絕
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid settings JSON")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize settings")
    }
}
