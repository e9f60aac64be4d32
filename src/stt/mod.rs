//! Speech-to-text via whisper-rs.
//!
//! ```rust,no_run
//! use sight_assist::stt::{Transcriber, WhisperTranscriber};
//!
//! let engine = WhisperTranscriber::load("models/ggml-base.bin", false).unwrap();
//! // 16 kHz mono f32 PCM
//! let audio = vec![0.0_f32; 16_000];
//! let text = engine.transcribe(&audio, "en").unwrap();
//! println!("{text}");
//! ```

pub mod engine;

pub use engine::{SttError, Transcriber, WhisperTranscriber, MIN_AUDIO_SAMPLES};
