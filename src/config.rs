//! Persistent settings (`config.toml`) and the application's directories.

use crate::app_core::geometry::CellSize;
use crate::data::parse_base_url;
use crate::theme::Theme;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOG_FILE_NAME: &str = "heatmap-tui.log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the heatmap backend.
    pub server: String,
    /// Video shown on startup. `None` picks the newest one.
    pub video: Option<u64>,
    /// Grid cell side in natural-image pixels.
    pub cell_size: u32,
    /// Frame size assumed until the heatmap image is loaded.
    pub natural_width: u32,
    pub natural_height: u32,
    pub theme: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: "http://localhost:5000".to_string(),
            video: None,
            cell_size: CellSize::DEFAULT.get(),
            natural_width: 1280,
            natural_height: 720,
            theme: "dracula".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Reads `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(contents)?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cell_size == 0 {
            bail!("cell_size must be a positive number of pixels");
        }
        if self.natural_width == 0 || self.natural_height == 0 {
            bail!(
                "natural size must be non-zero, got {}x{}",
                self.natural_width,
                self.natural_height
            );
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        parse_base_url(&self.server)?;
        Theme::from_str(&self.theme).map_err(anyhow::Error::msg)?;
        Ok(())
    }

    pub fn cell_size(&self) -> Result<CellSize> {
        CellSize::new(self.cell_size)
            .ok_or_else(|| anyhow::anyhow!("cell_size must be a positive number of pixels"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "heatmap", "heatmap-tui")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}

pub fn get_cache_dir() -> Result<PathBuf> {
    let cache_dir = project_dirs()?.cache_dir().to_path_buf();
    fs::create_dir_all(&cache_dir)?;
    Ok(cache_dir)
}

pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = project_dirs()?.data_dir().to_path_buf();
    fs::create_dir_all(&data_dir)?;
    Ok(data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_generator_frame() {
        let settings = Settings::default();
        assert_eq!(settings.server, "http://localhost:5000");
        assert_eq!(settings.cell_size, 20);
        assert_eq!((settings.natural_width, settings.natural_height), (1280, 720));
        assert_eq!(settings.theme, "dracula");
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            server = "http://10.0.0.2:8080"
            video = 7
            theme = "gruvbox"
            "#,
        )
        .unwrap();
        assert_eq!(settings.server, "http://10.0.0.2:8080");
        assert_eq!(settings.video, Some(7));
        assert_eq!(settings.theme, "gruvbox");
        assert_eq!(settings.cell_size, 20);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let zero_cell = Settings {
            cell_size: 0,
            ..Settings::default()
        };
        assert!(zero_cell.validate().is_err());
        assert!(zero_cell.cell_size().is_err());

        let zero_height = Settings {
            natural_height: 0,
            ..Settings::default()
        };
        assert!(zero_height.validate().is_err());

        let bad_server = Settings {
            server: "localhost:5000 nope".to_string(),
            ..Settings::default()
        };
        assert!(bad_server.validate().is_err());

        let bad_theme = Settings {
            theme: "neon".to_string(),
            ..Settings::default()
        };
        assert!(bad_theme.validate().is_err());
    }

    #[test]
    fn load_reads_file_or_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());

        fs::write(&path, "cell_size = 40\nrequest_timeout_secs = 3\n").unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.cell_size, 40);
        assert_eq!(settings.request_timeout(), Duration::from_secs(3));

        fs::write(&path, "cell_size = \"big\"").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = Settings {
            video: Some(3),
            ..Settings::default()
        };
        let text = toml::to_string(&settings).unwrap();
        assert_eq!(Settings::from_toml_str(&text).unwrap(), settings);
    }
}
