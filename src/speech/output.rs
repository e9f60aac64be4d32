//! Speech output through the platform synthesizer process.
//!
//! Each utterance is one child process (`espeak-ng` or `say`).  A new
//! `speak` kills the running child; the interrupted call still resolves
//! `Ok(())`.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::oneshot;

use crate::config::SpeechConfig;

use super::voices::{parse_espeak_voices, parse_say_voices, select_voice, Voice};
use super::{SpeechOutput, SpeechOutputError};

/// Command-line dialect of the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthKind {
    EspeakNg,
    Say,
}

impl SynthKind {
    /// Infer the dialect from the program name.
    pub fn for_program(program: &str) -> Self {
        let stem = std::path::Path::new(program)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(program);
        if stem == "say" {
            SynthKind::Say
        } else {
            SynthKind::EspeakNg
        }
    }

    fn platform_default() -> &'static str {
        if cfg!(target_os = "macos") {
            "say"
        } else {
            "espeak-ng"
        }
    }

    fn list_voices_args(self) -> &'static [&'static str] {
        match self {
            SynthKind::EspeakNg => &["--voices"],
            SynthKind::Say => &["-v", "?"],
        }
    }

    fn parse_voices(self, listing: &str) -> Vec<Voice> {
        match self {
            SynthKind::EspeakNg => parse_espeak_voices(listing),
            SynthKind::Say => parse_say_voices(listing),
        }
    }

    /// Arguments for speaking `text`.  `--` keeps text starting with `-`
    /// from being read as a flag.
    pub fn speak_args(self, text: &str, voice: Option<&Voice>, rate_wpm: u32) -> Vec<String> {
        let mut args = Vec::with_capacity(6);
        match self {
            SynthKind::EspeakNg => {
                args.extend(["-s".to_string(), rate_wpm.to_string()]);
                if let Some(v) = voice {
                    args.extend(["-v".to_string(), v.name.clone()]);
                }
            }
            SynthKind::Say => {
                args.extend(["-r".to_string(), rate_wpm.to_string()]);
                if let Some(v) = voice {
                    args.extend(["-v".to_string(), v.name.clone()]);
                }
            }
        }
        args.push("--".into());
        args.push(text.to_string());
        args
    }
}

pub struct ProcessSpeechOutput {
    program: String,
    kind: SynthKind,
    voices: Vec<Voice>,
    rate_wpm: u32,
    /// Cancels the utterance currently playing.
    current: Mutex<Option<oneshot::Sender<()>>>,
    generation: AtomicU64,
    speaking: AtomicBool,
}

impl ProcessSpeechOutput {
    pub fn new(program: impl Into<String>, kind: SynthKind, voices: Vec<Voice>, rate_wpm: u32) -> Self {
        Self {
            program: program.into(),
            kind,
            voices,
            rate_wpm,
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
            speaking: AtomicBool::new(false),
        }
    }

    /// Locate the synthesizer and read its voice list.  Fails with
    /// `Unavailable` when the program cannot be run.
    pub fn detect(config: &SpeechConfig) -> Result<Self, SpeechOutputError> {
        let program = config
            .synthesizer
            .clone()
            .unwrap_or_else(|| SynthKind::platform_default().to_string());
        let kind = SynthKind::for_program(&program);

        let output = std::process::Command::new(&program)
            .args(kind.list_voices_args())
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| SpeechOutputError::Unavailable(format!("{program}: {e}")))?;

        let voices = kind.parse_voices(&String::from_utf8_lossy(&output.stdout));
        log::info!("speech: using {program} with {} voices", voices.len());
        Ok(Self::new(program, kind, voices, config.rate_wpm))
    }

    /// Replace the current cancel handle, interrupting whatever was playing.
    fn take_turn(&self) -> (oneshot::Receiver<()>, u64) {
        let (tx, rx) = oneshot::channel();
        let previous = match self.current.lock() {
            Ok(mut slot) => slot.replace(tx),
            Err(poisoned) => poisoned.into_inner().replace(tx),
        };
        if let Some(prev) = previous {
            let _ = prev.send(());
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        (rx, generation)
    }

    fn finish_turn(&self, generation: u64) {
        if self.generation.load(Ordering::SeqCst) == generation {
            self.speaking.store(false, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl SpeechOutput for ProcessSpeechOutput {
    async fn speak(&self, text: &str, language: &str) -> Result<(), SpeechOutputError> {
        let (cancel, generation) = self.take_turn();

        let voice = select_voice(&self.voices, language);
        if voice.is_none() {
            log::debug!("speech: no voice for {language}, using engine default");
        }
        let args = self.kind.speak_args(text, voice, self.rate_wpm);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                self.finish_turn(generation);
                SpeechOutputError::Unavailable(e.to_string())
            })?;

        self.speaking.store(true, Ordering::SeqCst);

        let result = tokio::select! {
            status = child.wait() => match status {
                Ok(s) if s.success() => Ok(()),
                Ok(s) => Err(SpeechOutputError::Synthesis(format!("{} exited with {s}", self.program))),
                Err(e) => Err(SpeechOutputError::Synthesis(e.to_string())),
            },
            _ = cancel => {
                let _ = child.kill().await;
                log::debug!("speech: utterance interrupted");
                Ok(())
            }
        };

        self.finish_turn(generation);
        result
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}
