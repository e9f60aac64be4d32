//! Application entry point for the Sight Assist desktop widget.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] and [`Preferences`] from disk (defaults on first run).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Bind the providers, falling back to the unsupported variant for any
//!    capability that is missing on this machine.
//! 5. Spawn the orchestrator: bootstrap, then the command loop.
//! 6. Spawn the hotkey listener thread.
//! 7. Run [`eframe::run_native`], which blocks until the window is closed.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;

use sight_assist::{
    analysis::AnalysisClient,
    app::AssistApp,
    camera::{CaptureError, CaptureProvider, SnapshotCapture, UnavailableCapture},
    config::{AppConfig, AppPaths, LocationSource, Preferences},
    hotkey::{HotkeyBindings, HotkeyListener},
    location,
    pipeline::{Command, Orchestrator, Providers, StartupOptions},
    speech::{
        ProcessSpeechOutput, SpeechInput, SpeechOutput, UnsupportedSpeechInput,
        UnsupportedSpeechOutput, WhisperSpeechInput,
    },
    stt::WhisperTranscriber,
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Provider wiring
// ---------------------------------------------------------------------------

fn bind_camera(config: &AppConfig) -> (Arc<dyn CaptureProvider>, Option<CaptureError>) {
    match SnapshotCapture::open(&config.camera) {
        Ok(camera) => (Arc::new(camera), None),
        Err(e) => {
            log::warn!("Camera unavailable: {e}");
            (Arc::new(UnavailableCapture), Some(e))
        }
    }
}

fn bind_speech_output(config: &AppConfig) -> Arc<dyn SpeechOutput> {
    if !config.speech.enabled {
        log::info!("Speech output disabled in settings");
        return Arc::new(UnsupportedSpeechOutput);
    }
    match ProcessSpeechOutput::detect(&config.speech) {
        Ok(output) => Arc::new(output),
        Err(e) => {
            log::warn!("No speech synthesizer ({e}); results will only be shown");
            Arc::new(UnsupportedSpeechOutput)
        }
    }
}

fn bind_speech_input(config: &AppConfig, paths: &AppPaths) -> Arc<dyn SpeechInput> {
    if !config.listening.enabled {
        log::info!("Voice commands disabled in settings");
        return Arc::new(UnsupportedSpeechInput);
    }
    let model_path = config.listening.resolve_model_path(paths);
    match WhisperTranscriber::load(&model_path, config.listening.use_gpu) {
        Ok(transcriber) => {
            log::info!("Whisper model loaded: {}", model_path.display());
            Arc::new(WhisperSpeechInput::new(Arc::new(transcriber), &config.listening))
        }
        Err(e) => {
            log::warn!(
                "Could not load Whisper model ({}): {e}. Voice commands unavailable.",
                model_path.display()
            );
            Arc::new(UnsupportedSpeechInput)
        }
    }
}

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_title("Sight Assist")
        .with_decorations(false)
        .with_transparent(true)
        .with_inner_size([320.0, 230.0])
        .with_min_inner_size([280.0, 200.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }
    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Sight Assist starting up");

    // 2. Configuration
    let paths = AppPaths::new();
    let config = AppConfig::load_from(&paths.settings_file).unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let prefs = Preferences::load_from(&paths.preferences_file).unwrap_or_else(|e| {
        log::warn!("Failed to load preferences ({e}); using defaults");
        Preferences::default()
    });

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Providers
    let (camera, camera_error) = bind_camera(&config);
    let speech_in = bind_speech_input(&config, &paths);
    let providers = Providers {
        camera,
        speech_out: bind_speech_output(&config),
        speech_in: Arc::clone(&speech_in),
        location: location::from_config(&config.location),
    };
    let analysis = AnalysisClient::from_config(&config.analysis);

    // 5. Orchestrator
    let (command_tx, command_rx) = mpsc::channel::<Command>(16);
    let (mut orchestrator, snapshots) =
        Orchestrator::new(providers, analysis, &prefs, Some(paths.preferences_file.clone()));
    let startup = StartupOptions {
        camera_error,
        locate: config.startup.locate_on_start && config.location.source != LocationSource::Disabled,
        speak_welcome: config.startup.speak_welcome,
    };
    rt.spawn(async move {
        orchestrator.bootstrap(startup).await;
        orchestrator.run(command_rx).await;
    });

    // 6. Hotkeys
    let mut listen_key = None;
    let _hotkey_listener = if config.hotkey.enabled {
        match HotkeyBindings::from_config(&config.hotkey) {
            Ok(bindings) => match HotkeyListener::start(bindings, command_tx.clone()) {
                Ok(listener) => {
                    listen_key = Some(config.hotkey.listen_key.clone());
                    Some(listener)
                }
                Err(e) => {
                    log::warn!("Hotkey listener failed to start: {e}");
                    None
                }
            },
            Err(e) => {
                log::warn!("Invalid hotkey settings ({e}); hotkeys disabled");
                None
            }
        }
    } else {
        None
    };

    // 7. UI (blocks until the window is closed)
    let app = AssistApp::new(snapshots, command_tx, speech_in, listen_key);
    let result = eframe::run_native(
        "Sight Assist",
        native_options(&config),
        Box::new(move |_cc| Ok(Box::new(app))),
    );

    rt.shutdown_timeout(std::time::Duration::from_secs(1));
    result.map_err(|e| anyhow!("UI error: {e}"))
}
