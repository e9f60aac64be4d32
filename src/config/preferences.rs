//! User preferences the app itself rewrites: active locale and mock mode.
//!
//! Kept apart from `settings.toml` so saving a preference never rewrites
//! hand-edited configuration.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::locale;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Locale tag, e.g. `"es-ES"`.  Unknown tags fall back to the default
    /// locale when applied.
    pub locale: String,
    pub mock_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            locale: locale::default_locale().code.to_string(),
            mock_mode: false,
        }
    }
}

impl Preferences {
    /// Missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}
