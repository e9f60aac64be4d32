//! Configuration: `AppConfig` (hand-edited `settings.toml`), `Preferences`
//! (app-written `preferences.toml`) and `AppPaths` for the per-user
//! directories.

pub mod paths;
pub mod preferences;
pub mod settings;

pub use paths::AppPaths;
pub use preferences::Preferences;
pub use settings::{
    AnalysisConfig, AppConfig, CameraConfig, HotkeyConfig, ListeningConfig, LocationConfig,
    LocationSource, ProxyConfig, SpeechConfig, StartupConfig, UiConfig,
};
