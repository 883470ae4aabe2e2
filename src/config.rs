use crate::error::{EcoScanError, Result};
use eco_scan_common::{build_alias_table, AliasTable, ProductCatalog, ScoringEngine};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub max_image_size: u32,
    pub timeout_seconds: u64,
    pub user_id: String,
    /// スキャン履歴の保存先（省略時は ~/.local/share/eco-scan）
    pub data_dir: Option<PathBuf>,
    /// 商品テーブルJSON（省略時は組み込み）
    pub catalog_path: Option<PathBuf>,
    pub alias_preset: Option<String>,
    pub alias_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".into(),
            max_image_size: 1600,
            timeout_seconds: 60,
            user_id: "local".into(),
            data_dir: None,
            catalog_path: None,
            alias_preset: Some("receipt".into()),
            alias_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %path.display(), "loaded config");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| EcoScanError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("eco-scan").join("config.json"))
    }

    /// 履歴の保存先
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir()
            .ok_or_else(|| EcoScanError::Config("data directory not found".into()))?;
        Ok(base.join("eco-scan"))
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key.clone().ok_or(EcoScanError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    /// 設定とCLI指定からスコアリングエンジンを組み立てる（CLI指定が優先）
    pub fn build_engine(
        &self,
        catalog_override: Option<&Path>,
        alias_override: Option<&Path>,
    ) -> Result<ScoringEngine> {
        let catalog = match catalog_override.or(self.catalog_path.as_deref()) {
            Some(path) => {
                if !path.exists() {
                    return Err(EcoScanError::FileNotFound(path.display().to_string()));
                }
                ProductCatalog::from_file(path)?
            }
            None => ProductCatalog::default(),
        };

        let alias_json = match alias_override.or(self.alias_path.as_deref()) {
            Some(path) => {
                if !path.exists() {
                    return Err(EcoScanError::FileNotFound(path.display().to_string()));
                }
                Some(std::fs::read_to_string(path)?)
            }
            None => None,
        };
        let aliases: AliasTable =
            build_alias_table(self.alias_preset.as_deref(), alias_json.as_deref())?;

        tracing::debug!(
            catalog = catalog.len(),
            aliases = aliases.len(),
            "scoring engine ready"
        );

        Ok(ScoringEngine::new(catalog, aliases, Default::default()))
    }
}
