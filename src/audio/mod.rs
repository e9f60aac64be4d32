//! Microphone audio for voice commands.
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → downmix
//!           → UtteranceDetector (endpointing) → trim_silence → resample_to_16k
//! ```

pub mod capture;
pub mod endpoint;
pub mod resample;

pub use capture::{AudioChunk, MicError, Microphone, StreamHandle};
pub use endpoint::{trim_silence, EndpointConfig, EndpointState, UtteranceDetector};
pub use resample::{downmix, resample_to_16k, ResampleError, WHISPER_SAMPLE_RATE};
