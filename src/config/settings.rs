//! Application settings structs, defaults and TOML persistence.
//!
//! Every section derives `Serialize`, `Deserialize`, `Default` and `Clone`
//! and carries `#[serde(default)]`, so a hand-edited `settings.toml` may
//! omit any key.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::analysis::DeploymentContext;

use super::AppPaths;

// ---------------------------------------------------------------------------
// AnalysisConfig
// ---------------------------------------------------------------------------

/// Settings for the image-analysis strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// `local` allows the direct strategy when a credential is present;
    /// `hosted` always routes through the intermediary.
    pub deployment: DeploymentContext,
    /// Model identifier for the direct call (e.g. `"gemini-2.5-flash"`).
    pub model: String,
    /// Base URL of the model REST API, without the `/models/...` suffix.
    pub model_base_url: String,
    /// Inline credential.  Prefer `api_key_env` outside development.
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,
    /// Full URL of the intermediary's analyze endpoint.
    pub proxy_url: String,
    /// Upper bound for one network analysis call.
    pub timeout_secs: u64,
    /// Simulated latency of mock mode.
    pub mock_delay_ms: u64,
    /// Model reasoning budget; 0 disables thinking for lowest latency.
    pub thinking_budget: i32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            deployment: DeploymentContext::Hosted,
            model: "gemini-2.5-flash".into(),
            model_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".into(),
            proxy_url: "http://127.0.0.1:8787/api/analyze".into(),
            timeout_secs: 30,
            mock_delay_ms: 1500,
            thinking_budget: 0,
        }
    }
}

impl AnalysisConfig {
    /// Resolve the model credential: the inline key first, then the
    /// configured environment variable.  Blank values count as absent.
    pub fn credential(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

// ---------------------------------------------------------------------------
// CameraConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// File an external streamer keeps overwriting with the latest frame
    /// (JPEG or PNG).  `None` means no camera.
    pub snapshot_path: Option<PathBuf>,
    /// Frames older than this are treated as a stalled stream.  0 disables
    /// the check.
    pub max_frame_age_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            max_frame_age_ms: 2_000,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Speech output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// Synthesizer program.  `None` picks `say` on macOS and `espeak-ng`
    /// elsewhere.
    pub synthesizer: Option<String>,
    /// Speaking rate in words per minute.
    pub rate_wpm: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            synthesizer: None,
            rate_wpm: 165,
        }
    }
}

// ---------------------------------------------------------------------------
// ListeningConfig
// ---------------------------------------------------------------------------

/// Microphone + Whisper speech input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListeningConfig {
    pub enabled: bool,
    /// GGML model file stem, resolved as `<models_dir>/ggml-<model>.bin`.
    pub model: String,
    /// Explicit model path overriding `model`.
    pub model_path: Option<PathBuf>,
    pub use_gpu: bool,
    /// Input device name.  `None` means the system default.
    pub audio_device: Option<String>,
    /// RMS level above which a 30 ms frame counts as speech.
    pub energy_threshold: f32,
    /// Silence after speech that ends the utterance.
    pub trailing_silence_ms: u64,
    /// Give up with "no speech" if nothing is heard within this window.
    pub no_speech_timeout_secs: u64,
    /// Hard cap on utterance length.
    pub max_utterance_secs: u64,
}

impl Default for ListeningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "base".into(),
            model_path: None,
            use_gpu: false,
            audio_device: None,
            energy_threshold: 0.015,
            trailing_silence_ms: 900,
            no_speech_timeout_secs: 6,
            max_utterance_secs: 15,
        }
    }
}

impl ListeningConfig {
    pub fn resolve_model_path(&self, paths: &AppPaths) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(|| paths.models_dir.join(format!("ggml-{}.bin", self.model)))
    }
}

// ---------------------------------------------------------------------------
// LocationConfig
// ---------------------------------------------------------------------------

/// Which location adapter is bound at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    /// No location capability.
    Disabled,
    /// The configured `latitude` / `longitude`.
    Fixed,
    /// HTTP IP-geolocation lookup.
    #[default]
    Ip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub source: LocationSource,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Endpoint returning `{"lat": .., "lon": ..}` JSON.
    pub lookup_url: String,
    pub timeout_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            source: LocationSource::Ip,
            latitude: None,
            longitude: None,
            lookup_url: "http://ip-api.com/json".into(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// HotkeyConfig
// ---------------------------------------------------------------------------

/// Global hotkey bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    pub enabled: bool,
    /// Starts listening for a voice command (e.g. `"F9"`).
    pub listen_key: String,
    /// One key per task, in FindBus, CrossRoad, Explore, FindShop order.
    pub task_keys: Vec<String>,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_key: "F9".into(),
            task_keys: vec!["F1".into(), "F2".into(), "F3".into(), "F4".into()],
        }
    }
}

// ---------------------------------------------------------------------------
// StartupConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Acquire a location fix before reporting ready.
    pub locate_on_start: bool,
    /// Speak the locale's welcome line once ready.
    pub speak_welcome: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            locate_on_start: true,
            speak_welcome: true,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui widget appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Last saved widget position `(x, y)` in screen pixels.
    pub window_position: Option<(f32, f32)>,
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ProxyConfig
// ---------------------------------------------------------------------------

/// Settings for the `vision-proxy` intermediary binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub bind_addr: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use sight_assist::config::AppConfig;
///
/// // Returns Default when the file is missing.
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub camera: CameraConfig,
    pub speech: SpeechConfig,
    pub listening: ListeningConfig,
    pub location: LocationConfig,
    pub hotkey: HotkeyConfig,
    pub startup: StartupConfig,
    pub ui: UiConfig,
    pub proxy: ProxyConfig,
}

impl AppConfig {
    /// Load from the platform-appropriate `settings.toml`.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.  A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let config = AppConfig::load_from(&dir.path().join("nope.toml")).expect("load");

        assert_eq!(config.analysis.deployment, DeploymentContext::Hosted);
        assert_eq!(config.analysis.timeout_secs, 30);
        assert_eq!(config.analysis.mock_delay_ms, 1500);
        assert_eq!(config.analysis.thinking_budget, 0);
        assert_eq!(config.location.timeout_secs, 10);
        assert_eq!(config.hotkey.listen_key, "F9");
        assert_eq!(config.hotkey.task_keys.len(), 4);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let mut cfg = AppConfig::default();
        cfg.analysis.deployment = DeploymentContext::Local;
        cfg.analysis.api_key = Some("k-test".into());
        cfg.camera.snapshot_path = Some(PathBuf::from("/tmp/frame.jpg"));
        cfg.location.source = LocationSource::Fixed;
        cfg.location.latitude = Some(40.4168);
        cfg.location.longitude = Some(-3.7038);
        cfg.ui.window_position = Some((100.0, 200.0));
        cfg.proxy.bind_addr = "0.0.0.0:9000".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.analysis.deployment, DeploymentContext::Local);
        assert_eq!(loaded.analysis.api_key.as_deref(), Some("k-test"));
        assert_eq!(loaded.camera.snapshot_path, Some(PathBuf::from("/tmp/frame.jpg")));
        assert_eq!(loaded.location.source, LocationSource::Fixed);
        assert_eq!(loaded.location.latitude, Some(40.4168));
        assert_eq!(loaded.ui.window_position, Some((100.0, 200.0)));
        assert_eq!(loaded.proxy.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[analysis]\ndeployment = \"local\"\n\n[startup]\nspeak_welcome = false\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.analysis.deployment, DeploymentContext::Local);
        assert_eq!(cfg.analysis.model, AnalysisConfig::default().model);
        assert!(!cfg.startup.speak_welcome);
        assert!(cfg.startup.locate_on_start);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "analysis = [").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn inline_key_is_preferred_and_blank_is_absent() {
        let mut cfg = AnalysisConfig::default();
        cfg.api_key_env = "SIGHT_ASSIST_TEST_NEVER_SET".into();
        assert_eq!(cfg.credential(), None);

        cfg.api_key = Some("  ".into());
        assert_eq!(cfg.credential(), None);

        cfg.api_key = Some(" abc ".into());
        assert_eq!(cfg.credential().as_deref(), Some("abc"));
    }

    #[test]
    fn model_path_override_wins() {
        let paths = AppPaths::new();
        let mut cfg = ListeningConfig::default();
        assert!(cfg.resolve_model_path(&paths).ends_with("ggml-base.bin"));

        cfg.model_path = Some(PathBuf::from("/models/custom.bin"));
        assert_eq!(cfg.resolve_model_path(&paths), PathBuf::from("/models/custom.bin"));
    }
}
