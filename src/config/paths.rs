//! Cross-platform application paths using the `dirs` crate.
//!
//! Config dir (settings + preferences):
//!   Windows: %APPDATA%\sight-assist\
//!   macOS:   ~/Library/Application Support/sight-assist/
//!   Linux:   ~/.config/sight-assist/
//!
//! Data dir (Whisper models):
//!   Windows: %LOCALAPPDATA%\sight-assist\
//!   macOS:   ~/Library/Application Support/sight-assist/
//!   Linux:   ~/.local/share/sight-assist/

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    /// `settings.toml`: hand-edited configuration.
    pub settings_file: PathBuf,
    /// `preferences.toml`: locale and mock mode, rewritten by the app.
    pub preferences_file: PathBuf,
    /// Directory holding GGML model files.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "sight-assist";

    /// Falls back to the current directory if the platform has no standard
    /// location.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            preferences_file: config_dir.join("preferences.toml"),
            models_dir: data_dir.join("models"),
            config_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
