//! Single-utterance speech input: microphone → endpointing → Whisper.
//!
//! Recording and inference are blocking, so the whole capture runs inside
//! `tokio::task::spawn_blocking`.  The blocking loop polls an abort flag
//! every 100 ms.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::audio::{
    downmix, resample_to_16k, trim_silence, EndpointConfig, EndpointState, Microphone,
    UtteranceDetector, WHISPER_SAMPLE_RATE,
};
use crate::config::ListeningConfig;
use crate::stt::{SttError, Transcriber};

use super::{SpeechInput, SpeechInputError};

const POLL: Duration = Duration::from_millis(100);

pub struct WhisperSpeechInput {
    transcriber: Arc<dyn Transcriber>,
    device: Option<String>,
    endpoint: EndpointConfig,
    listening: Arc<AtomicBool>,
    abort: Arc<AtomicBool>,
}

impl WhisperSpeechInput {
    pub fn new(transcriber: Arc<dyn Transcriber>, config: &ListeningConfig) -> Self {
        Self {
            transcriber,
            device: config.audio_device.clone(),
            endpoint: EndpointConfig {
                threshold: config.energy_threshold,
                trailing_silence: Duration::from_millis(config.trailing_silence_ms),
                no_speech_timeout: Duration::from_secs(config.no_speech_timeout_secs),
                max_utterance: Duration::from_secs(config.max_utterance_secs),
            },
            listening: Arc::new(AtomicBool::new(false)),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl SpeechInput for WhisperSpeechInput {
    async fn listen(&self, language: &str) -> Result<String, SpeechInputError> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(SpeechInputError::AlreadyListening);
        }
        self.abort.store(false, Ordering::SeqCst);

        let transcriber = Arc::clone(&self.transcriber);
        let device = self.device.clone();
        let endpoint = self.endpoint;
        let abort = Arc::clone(&self.abort);
        let whisper_lang = whisper_language(language);

        let result = tokio::task::spawn_blocking(move || {
            let (samples, rate) = record_utterance(device.as_deref(), endpoint, &abort)?;
            finish_utterance(&samples, rate, endpoint.threshold, transcriber.as_ref(), &whisper_lang)
        })
        .await
        .unwrap_or_else(|e| Err(SpeechInputError::Other(format!("listener task failed: {e}"))));

        self.listening.store(false, Ordering::SeqCst);
        match &result {
            Ok(text) => log::info!("speech: heard {text:?}"),
            Err(e) if e.is_benign() => log::debug!("speech: {e}"),
            Err(e) => log::warn!("speech: {e}"),
        }
        result
    }

    fn abort(&self) {
        if self.listening.load(Ordering::SeqCst) {
            self.abort.store(true, Ordering::SeqCst);
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

/// Whisper takes bare ISO-639-1 codes.
fn whisper_language(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("en")
        .to_ascii_lowercase()
}

/// Record mono samples at the device rate until the endpoint detector
/// reaches a final state.
fn record_utterance(
    device: Option<&str>,
    endpoint: EndpointConfig,
    abort: &AtomicBool,
) -> Result<(Vec<f32>, u32), SpeechInputError> {
    let mic = Microphone::open(device).map_err(|e| {
        if e.is_permission_denied() {
            SpeechInputError::PermissionDenied
        } else {
            SpeechInputError::Other(e.to_string())
        }
    })?;

    let (tx, rx) = mpsc::channel();
    let _stream = mic.start(tx).map_err(|e| {
        if e.is_permission_denied() {
            SpeechInputError::PermissionDenied
        } else {
            SpeechInputError::Other(e.to_string())
        }
    })?;

    let rate = mic.sample_rate();
    let channels = mic.channels();
    let mut detector = UtteranceDetector::new(endpoint, rate);
    let mut samples = Vec::new();

    // A stream that stops delivering audio must not hang the listener.
    let deadline = Instant::now()
        + endpoint.no_speech_timeout
        + endpoint.max_utterance
        + Duration::from_secs(2);

    loop {
        if abort.load(Ordering::SeqCst) {
            return Err(SpeechInputError::Aborted);
        }
        if Instant::now() > deadline {
            return Err(SpeechInputError::Other("microphone stopped delivering audio".into()));
        }
        match rx.recv_timeout(POLL) {
            Ok(chunk) => {
                let mono = downmix(&chunk.samples, channels);
                let state = detector.push(&mono);
                samples.extend_from_slice(&mono);
                match state {
                    EndpointState::Complete => return Ok((samples, rate)),
                    EndpointState::NoSpeech => return Err(SpeechInputError::NoSpeech),
                    _ => {}
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(SpeechInputError::Other("audio stream closed".into()));
            }
        }
    }
}

/// Resample, trim and transcribe a finished utterance.
fn finish_utterance(
    samples: &[f32],
    rate: u32,
    threshold: f32,
    transcriber: &dyn Transcriber,
    language: &str,
) -> Result<String, SpeechInputError> {
    let audio = resample_to_16k(samples, rate).map_err(|e| SpeechInputError::Other(e.to_string()))?;
    let voiced = trim_silence(&audio, threshold);
    if voiced.is_empty() {
        return Err(SpeechInputError::NoSpeech);
    }

    // Whisper is unreliable on clips under one second; pad with silence.
    let mut clip = voiced.to_vec();
    if clip.len() < WHISPER_SAMPLE_RATE as usize {
        clip.resize(WHISPER_SAMPLE_RATE as usize, 0.0);
    }

    match transcriber.transcribe(&clip, language) {
        Ok(text) if text.trim().is_empty() => Err(SpeechInputError::NoSpeech),
        Ok(text) => Ok(text.trim().to_string()),
        Err(SttError::AudioTooShort) => Err(SpeechInputError::NoSpeech),
        Err(e) => Err(SpeechInputError::Other(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        reply: Result<String, SttError>,
        seen: Mutex<Vec<(usize, String)>>,
    }

    impl Recording {
        fn new(reply: Result<String, SttError>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transcriber for Recording {
        fn transcribe(&self, audio: &[f32], language: &str) -> Result<String, SttError> {
            self.seen.lock().unwrap().push((audio.len(), language.to_string()));
            self.reply.clone()
        }
    }

    fn utterance(rate: u32) -> Vec<f32> {
        let n = rate as usize / 2;
        let mut v = vec![0.0_f32; n];
        let step = 2.0 * std::f32::consts::PI * 440.0 / rate as f32;
        v.extend((0..n).map(|i| 0.3 * (step * i as f32).sin()));
        v.extend(vec![0.0_f32; n]);
        v
    }

    #[test]
    fn language_tag_reduced_to_primary_subtag() {
        assert_eq!(whisper_language("es-ES"), "es");
        assert_eq!(whisper_language("th_TH"), "th");
        assert_eq!(whisper_language("EN"), "en");
        assert_eq!(whisper_language(""), "en");
    }

    #[test]
    fn voiced_clip_is_padded_and_transcribed_in_language() {
        let stt = Recording::new(Ok("  find a bus ".into()));
        let text = finish_utterance(&utterance(16_000), 16_000, 0.01, &stt, "en").unwrap();
        assert_eq!(text, "find a bus");

        let seen = stt.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, 16_000);
        assert_eq!(seen[0].1, "en");
    }

    #[test]
    fn silent_clip_is_no_speech_without_inference() {
        let stt = Recording::new(Ok("ghost".into()));
        let err = finish_utterance(&vec![0.0; 16_000], 16_000, 0.01, &stt, "en").unwrap_err();
        assert_eq!(err, SpeechInputError::NoSpeech);
        assert!(stt.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_transcript_is_no_speech() {
        let stt = Recording::new(Ok("   ".into()));
        let err = finish_utterance(&utterance(16_000), 16_000, 0.01, &stt, "es").unwrap_err();
        assert_eq!(err, SpeechInputError::NoSpeech);
    }

    #[test]
    fn engine_failure_is_other() {
        let stt = Recording::new(Err(SttError::Transcription("boom".into())));
        let err = finish_utterance(&utterance(16_000), 16_000, 0.01, &stt, "th").unwrap_err();
        assert!(matches!(err, SpeechInputError::Other(_)));
    }

    #[test]
    fn native_rate_audio_is_resampled_first() {
        let stt = Recording::new(Ok("cross".into()));
        finish_utterance(&utterance(48_000), 48_000, 0.01, &stt, "en").unwrap();
        let seen = stt.seen.lock().unwrap();
        assert!(seen[0].0 >= 16_000);
    }

    #[test]
    fn abort_is_ignored_when_idle() {
        let input = WhisperSpeechInput::new(
            Arc::new(Recording::new(Ok(String::new()))),
            &ListeningConfig::default(),
        );
        input.abort();
        assert!(!input.abort.load(Ordering::SeqCst));
        assert!(!input.is_listening());
    }
}
