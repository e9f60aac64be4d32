//! Speech output (synthesis) and speech input (single-utterance
//! recognition).
//!
//! Both are async traits so the orchestrator can await them and tests can
//! substitute recording doubles.  Capability variants are bound once at
//! startup: a real adapter when the platform supports it, otherwise the
//! `Unsupported*` type.

pub mod input;
pub mod output;
pub mod voices;

use async_trait::async_trait;
use thiserror::Error;

use crate::locale::Locale;

pub use input::WhisperSpeechInput;
pub use output::{ProcessSpeechOutput, SynthKind};
pub use voices::{parse_espeak_voices, parse_say_voices, select_voice, Voice};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechOutputError {
    #[error("speech synthesis unavailable: {0}")]
    Unavailable(String),
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

impl SpeechOutputError {
    /// No synthesizer is bound.  The text is still shown, so the flow
    /// carries on without speech.
    pub fn is_display_only(&self) -> bool {
        matches!(self, SpeechOutputError::Unavailable(_))
    }

    pub fn user_message(&self, locale: &Locale) -> &'static str {
        locale.errors.speech_failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechInputError {
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("no speech detected")]
    NoSpeech,
    /// Listening was cancelled.  Benign.
    #[error("listening aborted")]
    Aborted,
    /// A listen was requested while one is in flight.  Benign no-op.
    #[error("already listening")]
    AlreadyListening,
    #[error("speech recognition failed: {0}")]
    Other(String),
}

impl SpeechInputError {
    /// Benign outcomes are neither shown nor spoken.
    pub fn is_benign(&self) -> bool {
        matches!(self, SpeechInputError::Aborted | SpeechInputError::AlreadyListening)
    }

    pub fn user_message(&self, locale: &Locale) -> &'static str {
        let e = &locale.errors;
        match self {
            SpeechInputError::PermissionDenied => e.microphone_denied,
            SpeechInputError::NoSpeech => e.no_speech,
            _ => e.listening_failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speak `text` in `language` (BCP-47 tag).  A newer call interrupts
    /// this one, in which case this call resolves `Ok(())`.
    async fn speak(&self, text: &str, language: &str) -> Result<(), SpeechOutputError>;

    fn is_speaking(&self) -> bool;
}

#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Capture one utterance and return its transcript.
    async fn listen(&self, language: &str) -> Result<String, SpeechInputError>;

    /// Cancel an in-flight [`listen`](SpeechInput::listen); it resolves with
    /// [`SpeechInputError::Aborted`].  No-op when idle.
    fn abort(&self);

    fn is_listening(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Unsupported variants
// ---------------------------------------------------------------------------

pub struct UnsupportedSpeechOutput;

#[async_trait]
impl SpeechOutput for UnsupportedSpeechOutput {
    async fn speak(&self, text: &str, _language: &str) -> Result<(), SpeechOutputError> {
        log::info!("speech: (no synthesizer) {text}");
        Err(SpeechOutputError::Unavailable("no synthesizer bound".into()))
    }

    fn is_speaking(&self) -> bool {
        false
    }
}

pub struct UnsupportedSpeechInput;

#[async_trait]
impl SpeechInput for UnsupportedSpeechInput {
    async fn listen(&self, _language: &str) -> Result<String, SpeechInputError> {
        Err(SpeechInputError::Other("speech recognition unavailable".into()))
    }

    fn abort(&self) {}

    fn is_listening(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale;

    #[test]
    fn only_abort_and_already_listening_are_benign() {
        assert!(SpeechInputError::Aborted.is_benign());
        assert!(SpeechInputError::AlreadyListening.is_benign());
        assert!(!SpeechInputError::NoSpeech.is_benign());
        assert!(!SpeechInputError::PermissionDenied.is_benign());
        assert!(!SpeechInputError::Other("x".into()).is_benign());
    }

    #[test]
    fn input_errors_map_to_locale_text() {
        let th = locale::find("th-TH").unwrap();
        assert_eq!(
            SpeechInputError::PermissionDenied.user_message(th),
            th.errors.microphone_denied
        );
        assert_eq!(SpeechInputError::NoSpeech.user_message(th), th.errors.no_speech);
    }

    #[tokio::test]
    async fn unsupported_variants_fail_without_side_effects() {
        assert!(matches!(
            UnsupportedSpeechOutput.speak("hi", "en-US").await,
            Err(SpeechOutputError::Unavailable(_))
        ));
        assert!(!UnsupportedSpeechOutput.is_speaking());
        assert!(matches!(
            UnsupportedSpeechInput.listen("en-US").await,
            Err(SpeechInputError::Other(_))
        ));
        assert!(!UnsupportedSpeechInput.is_listening());
    }

    #[test]
    fn only_missing_synthesizer_is_display_only() {
        assert!(SpeechOutputError::Unavailable("none".into()).is_display_only());
        assert!(!SpeechOutputError::Synthesis("crashed".into()).is_display_only());
    }
}
