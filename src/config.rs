//! Application configuration
//!
//! One YAML document with a section per concern. Every section and key is
//! optional; missing ones fall back to defaults. A few environment
//! variables override the file.

use std::env;
use std::path::PathBuf;

use action_flow::PlaybackConfig;
use action_locator::ResolverConfig;
use action_primitives::TabSettings;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const ENV_STORE: &str = "WEBMINER_STORE";
pub const ENV_CHROME: &str = "WEBMINER_CHROME";
pub const ENV_HEADLESS: &str = "WEBMINER_HEADLESS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub resolver: ResolverConfig,
    pub playback: PlaybackConfig,
    pub tabs: TabSettings,
    pub store: StoreConfig,
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding every saved script
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|dir| dir.join("webminer").join("scripts.json"))
            .unwrap_or_else(|| PathBuf::from("webminer-scripts.json"));
        Self { path }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Chrome/Chromium binary; auto-detected when unset
    pub executable: Option<PathBuf>,
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
        }
    }
}

impl AppConfig {
    /// Apply `WEBMINER_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_STORE).filter(|v| !v.trim().is_empty()) {
            info!(path = %path, "Script store path from {}", ENV_STORE);
            self.store.path = PathBuf::from(path);
        }
        if let Some(chrome) = lookup(ENV_CHROME).filter(|v| !v.trim().is_empty()) {
            self.browser.executable = Some(PathBuf::from(chrome));
        }
        if let Some(raw) = lookup(ENV_HEADLESS) {
            match parse_bool(&raw) {
                Some(headless) => self.browser.headless = headless,
                None => warn!(value = %raw, "ignoring invalid {}", ENV_HEADLESS),
            }
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: AppConfig = serde_yaml::from_str(
            "resolver:\n  timeout_ms: 800\nplayback:\n  inter_step_delay_ms: 0\n",
        )
        .unwrap();
        assert_eq!(config.resolver.timeout_ms, 800);
        assert_eq!(config.resolver.poll_interval_ms, 100);
        assert_eq!(config.playback.inter_step_delay_ms, 0);
        assert_eq!(config.playback.status_reset_ms, 3_000);
        assert_eq!(config.tabs.max_tabs, 5);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_STORE, "/tmp/scripts.json"),
            (ENV_CHROME, "/usr/bin/chromium"),
            (ENV_HEADLESS, "no"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.store.path, PathBuf::from("/tmp/scripts.json"));
        assert_eq!(
            config.browser.executable,
            Some(PathBuf::from("/usr/bin/chromium"))
        );
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_invalid_headless_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| (key == ENV_HEADLESS).then(|| "maybe".to_string()));
        assert!(config.browser.headless);
    }
}
