use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{MemoryStorage, SessionStorage, TokenStorage};

/// Environment variable that overrides the configured service address.
pub const API_URL_ENV: &str = "NTROVOTE_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Base address of the election service, without a trailing slash
    pub api_base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Keep the session token on disk between runs
    pub remember_session: bool,
    /// Colour scheme of the terminal UI: Dark, Light or Basic
    pub theme: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 10,
            remember_session: true,
            theme: "Dark".to_string(),
        }
    }
}

impl ClientSettings {
    pub fn with_base_url(url: impl Into<String>) -> Self {
        Self {
            api_base_url: url.into(),
            ..Self::default()
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Nominee images are served by the API host under the relative path it returns.
    pub fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.api_base_url(), path.trim_start_matches('/'))
        }
    }

    pub fn token_storage(&self) -> Result<Arc<dyn TokenStorage>> {
        if self.remember_session {
            Ok(Arc::new(SessionStorage::default_location()?))
        } else {
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}

pub struct SettingsManager {
    settings_path: PathBuf,
    settings: ClientSettings,
}

impl SettingsManager {
    pub fn new() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::load_from(settings_path))
    }

    /// Reads `settings_path`, falling back to defaults when it is missing or unreadable,
    /// then applies the environment override.
    pub fn load_from(settings_path: PathBuf) -> Self {
        let mut settings = Self::load_from_file(&settings_path).unwrap_or_else(|e| {
            log::warn!("Failed to load settings, using defaults: {}", e);
            ClientSettings::default()
        });

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                log::info!("Using API address from {}: {}", API_URL_ENV, url);
                settings.api_base_url = url.trim().to_string();
            }
        }

        Self {
            settings_path,
            settings,
        }
    }

    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = home::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;

        let config_dir = home_dir.join(".config").join("ntrovote");

        // Ensure the directory exists
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        Ok(config_dir.join("settings.json"))
    }

    fn load_from_file(path: &Path) -> Result<ClientSettings> {
        if !path.exists() {
            return Ok(ClientSettings::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: ClientSettings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, content)?;
        log::info!("Settings saved to: {}", self.settings_path.display());
        Ok(())
    }

    pub fn get(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn update<F>(&mut self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut ClientSettings),
    {
        updater(&mut self.settings);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let settings: ClientSettings =
            serde_json::from_str(r#"{"api_base_url":"https://vote.example.org/"}"#).unwrap();
        assert_eq!(settings.api_base_url(), "https://vote.example.org");
        assert_eq!(settings.request_timeout_secs, 10);
        assert!(settings.remember_session);
        assert_eq!(settings.theme, "Dark");
    }

    #[test]
    fn asset_urls_are_resolved_against_the_api_host() {
        let settings = ClientSettings::with_base_url("http://localhost:8080/");
        assert_eq!(
            settings.asset_url("/uploads/alice.png"),
            "http://localhost:8080/uploads/alice.png"
        );
        assert_eq!(settings.asset_url("https://cdn/x.png"), "https://cdn/x.png");
    }

    #[test]
    fn update_writes_the_file() {
        let path = std::env::temp_dir()
            .join(format!("ntrovote-settings-{}", uuid::Uuid::new_v4()))
            .join("settings.json");
        let mut manager = SettingsManager::load_from(path.clone());
        manager.update(|s| s.request_timeout_secs = 3).unwrap();

        let reloaded = SettingsManager::load_from_file(&path).unwrap();
        assert_eq!(reloaded.request_timeout_secs, 3);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
