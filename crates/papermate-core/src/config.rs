use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::ListMode;
use crate::detail::RecommendationMode;
use crate::error::{PaperMateError, Result};
use crate::pagination::PaginationLayout;

/// Root application configuration, loaded from `~/.config/papermate/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub recommendation_mode: RecommendationMode,
    /// How long identical list requests are answered from memory. 0 disables.
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub list_mode: ListMode,
    pub debounce_ms: u64,
    pub viewport_width: u32,
    pub pagination: PaginationLayout,
    pub recommendation_limit: usize,
    pub cache_recommendations: bool,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            user_agent: concat!("papermate/", env!("CARGO_PKG_VERSION")).to_string(),
            recommendation_mode: RecommendationMode::Endpoint,
            cache_ttl_secs: 60,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            list_mode: ListMode::Paged,
            debounce_ms: 300,
            viewport_width: 1280,
            pagination: PaginationLayout::default(),
            recommendation_limit: 5,
            cache_recommendations: true,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl UiConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/papermate/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PAPERMATE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("papermate")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn set_base_url(&mut self, url: impl Into<String>) {
        self.api.base_url = url.into();
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(PaperMateError::ConfigError(format!(
                "api.base_url must be an http(s) URL, got {base:?}"
            )));
        }
        let layout = &self.ui.pagination;
        if layout.mobile_max_visible == 0 || layout.desktop_max_visible == 0 {
            return Err(PaperMateError::ConfigError(
                "ui.pagination window sizes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
