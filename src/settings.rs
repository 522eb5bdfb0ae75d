//! User preferences persisted between sessions
//!
//! Only cosmetic and convenience values live here (theme, default folder).
//! Nothing about an in-flight probe or download is ever written to disk.

use std::path::PathBuf;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::APP_DIR_NAME;
use crate::error::AppError;

/// Application settings that persist between sessions
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub dark_mode: bool,
    pub download_folder: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            download_folder: Self::default_download_folder(),
        }
    }
}

impl Settings {
    /// The user's Downloads directory, or `~/Downloads` when the platform has none
    pub fn default_download_folder() -> String {
        dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
            .map(|path| path.display().to_string())
            .unwrap_or_default()
    }

    /// Get the path where settings are stored
    pub fn get_path() -> std::io::Result<PathBuf> {
        #[cfg(windows)]
        {
            let exe_path = std::env::current_exe()?;
            let exe_dir = exe_path.parent().ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "Failed to get executable directory")
            })?;
            Ok(exe_dir.join("tubegrab_settings.json"))
        }

        #[cfg(target_os = "macos")]
        {
            let home_dir = dirs::home_dir().ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "Failed to get home directory")
            })?;
            let app_support = home_dir.join("Library/Application Support").join(APP_DIR_NAME);
            std::fs::create_dir_all(&app_support)?;
            Ok(app_support.join("settings.json"))
        }

        #[cfg(all(unix, not(target_os = "macos")))]
        {
            let app_dir = match xdg::BaseDirectories::new() {
                Ok(xdg_dirs) => xdg_dirs.get_config_home().join(APP_DIR_NAME),
                Err(_) => {
                    let home_dir = dirs::home_dir().ok_or_else(|| {
                        std::io::Error::new(std::io::ErrorKind::NotFound, "Failed to get home directory")
                    })?;
                    home_dir.join(format!(".{}", APP_DIR_NAME))
                }
            };
            std::fs::create_dir_all(&app_dir)?;
            Ok(app_dir.join("settings.json"))
        }
    }

    /// Parse settings text; missing fields take their defaults
    pub fn from_json(content: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load settings from disk, falling back to defaults if the file is missing or broken
    pub fn load() -> Self {
        let path = match Self::get_path() {
            Ok(path) => path,
            Err(e) => {
                warn!("Failed to get settings path: {}. Using defaults.", e);
                return Settings::default();
            }
        };
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Settings file not found or unreadable: {}. Using defaults.", e);
                return Settings::default();
            }
        };
        match Self::from_json(&content) {
            Ok(settings) => {
                info!("Settings loaded from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("Failed to parse settings file: {}. Using defaults.", e);
                Settings::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), AppError> {
        let path = Self::get_path()?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        debug!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings = Settings::from_json(r#"{"dark_mode": false}"#).unwrap();
        assert!(!settings.dark_mode);
        assert_eq!(settings.download_folder, Settings::default_download_folder());
    }

    #[test]
    fn settings_survive_json() {
        let settings = Settings {
            dark_mode: false,
            download_folder: "/tmp/videos".to_string(),
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(Settings::from_json("not json").is_err());
    }
}
