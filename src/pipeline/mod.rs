//! Task orchestration for the assistant.
//!
//! # Architecture
//!
//! ```text
//! UI buttons / hotkeys ──Command (mpsc)──▶ Orchestrator::run()  ← async tokio task
//!                                              │
//!                                              ├─ SelectTask      → capture → analyze → speak
//!                                              ├─ StartListening  → listen → resolve → SelectTask
//!                                              ├─ Locate          → location provider
//!                                              └─ SetLocale / SetMockMode → persist preferences
//!
//! SessionSnapshot (watch) ←─── read by egui update() each frame
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use sight_assist::analysis::AnalysisClient;
//! use sight_assist::camera::UnavailableCapture;
//! use sight_assist::config::{AppConfig, Preferences};
//! use sight_assist::location::UnsupportedLocation;
//! use sight_assist::pipeline::{Command, Orchestrator, Providers};
//! use sight_assist::speech::{UnsupportedSpeechInput, UnsupportedSpeechOutput};
//! use sight_assist::task::Task;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let providers = Providers {
//!         camera: Arc::new(UnavailableCapture),
//!         speech_out: Arc::new(UnsupportedSpeechOutput),
//!         speech_in: Arc::new(UnsupportedSpeechInput),
//!         location: Arc::new(UnsupportedLocation),
//!     };
//!     let analysis = AnalysisClient::from_config(&config.analysis);
//!     let (orchestrator, _snapshots) =
//!         Orchestrator::new(providers, analysis, &Preferences::default(), None);
//!
//!     let (tx, rx) = mpsc::channel(16);
//!     tokio::spawn(orchestrator.run(rx));
//!     tx.send(Command::SelectTask(Task::Explore)).await.unwrap();
//! }
//! ```

pub mod runner;
pub mod state;

pub use runner::{Command, Dispatch, Orchestrator, Providers, StartupOptions};
pub use state::{Phase, Session, SessionEvent, SessionSnapshot};
