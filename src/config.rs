//! Runtime configuration from environment variables
//!
//! | Variable              | Default                           |
//! |-----------------------|-----------------------------------|
//! | `DATA_DIR`            | `data`                            |
//! | `PORT`                | `3000`                            |
//! | `OPENWEATHER_API_KEY` | unset (weather section disabled)  |
//! | `WEATHER_BASE_URL`    | `http://api.openweathermap.org`   |
//! | `TRANSLATE_BASE_URL`  | `https://translate.googleapis.com`|
//! | `FOREST_TREES`        | `100`                             |
//! | `FOREST_SEED`         | `42`                              |

use std::path::PathBuf;

use crate::classifier::ForestParams;

pub const DEFAULT_WEATHER_BASE_URL: &str = "http://api.openweathermap.org";
pub const DEFAULT_TRANSLATE_BASE_URL: &str = "https://translate.googleapis.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub port: u16,
    pub weather_api_key: Option<String>,
    pub weather_base_url: String,
    pub translate_base_url: String,
    pub forest: ForestParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            port: 3000,
            weather_api_key: None,
            weather_base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            translate_base_url: DEFAULT_TRANSLATE_BASE_URL.to_string(),
            forest: ForestParams::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unparsable numbers keep defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut forest = defaults.forest;
        if let Some(n) = non_empty("FOREST_TREES").and_then(|v| v.parse().ok()) {
            forest.n_trees = n;
        }
        if let Some(seed) = non_empty("FOREST_SEED").and_then(|v| v.parse().ok()) {
            forest.seed = seed;
        }

        Self {
            data_dir: non_empty("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            weather_api_key: non_empty("OPENWEATHER_API_KEY"),
            weather_base_url: non_empty("WEATHER_BASE_URL").unwrap_or(defaults.weather_base_url),
            translate_base_url: non_empty("TRANSLATE_BASE_URL")
                .unwrap_or(defaults.translate_base_url),
            forest,
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
        tracing::info!("  PORT: {}", self.port);
        tracing::info!(
            "  OPENWEATHER_API_KEY: {}",
            if self.weather_api_key.is_some() { "set" } else { "unset" }
        );
        tracing::info!("  FOREST_TREES: {}", self.forest.n_trees);
        tracing::info!("  FOREST_SEED: {}", self.forest.seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let cfg = AppConfig::from_lookup(|_| None);
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.port, 3000);
        assert!(cfg.weather_api_key.is_none());
        assert_eq!(cfg.forest.n_trees, 100);
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let env: HashMap<&str, &str> = [
            ("DATA_DIR", "/srv/agri"),
            ("PORT", "not-a-port"),
            ("OPENWEATHER_API_KEY", "abc"),
            ("FOREST_TREES", "25"),
            ("FOREST_SEED", " "),
        ]
        .into_iter()
        .collect();

        let cfg = AppConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/agri"));
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.weather_api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.forest.n_trees, 25);
        assert_eq!(cfg.forest.seed, 42);
    }
}
