//! Energy-based utterance endpointing.
//!
//! Audio arrives in arbitrary callback-sized pieces and is cut into 30 ms
//! frames.  A frame is *voice* when its RMS exceeds the threshold.  The
//! detector reports:
//!
//! * `Complete` once voice has been heard and is followed by
//!   `trailing_silence`, or when the utterance reaches `max_utterance`;
//! * `NoSpeech` when no voice frame appears within `no_speech_timeout`.
//!
//! [`trim_silence`] then strips the leading and trailing quiet frames before
//! the clip goes to Whisper.

use std::time::Duration;

const FRAME_MS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointConfig {
    pub threshold: f32,
    pub trailing_silence: Duration,
    pub no_speech_timeout: Duration,
    pub max_utterance: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            threshold: 0.015,
            trailing_silence: Duration::from_millis(900),
            no_speech_timeout: Duration::from_secs(6),
            max_utterance: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// Nothing heard yet.
    Waiting,
    Speaking,
    Complete,
    NoSpeech,
}

impl EndpointState {
    pub fn is_final(self) -> bool {
        matches!(self, EndpointState::Complete | EndpointState::NoSpeech)
    }
}

pub struct UtteranceDetector {
    config: EndpointConfig,
    frame_len: usize,
    pending: Vec<f32>,
    frames_seen: u64,
    frames_since_voice: u64,
    first_voice_frame: Option<u64>,
    state: EndpointState,
}

impl UtteranceDetector {
    /// `sample_rate` is the rate of the mono samples passed to [`push`].
    ///
    /// [`push`]: UtteranceDetector::push
    pub fn new(config: EndpointConfig, sample_rate: u32) -> Self {
        let frame_len = ((sample_rate as u64 * FRAME_MS) / 1000).max(1) as usize;
        Self {
            config,
            frame_len,
            pending: Vec::with_capacity(frame_len),
            frames_seen: 0,
            frames_since_voice: 0,
            first_voice_frame: None,
            state: EndpointState::Waiting,
        }
    }

    pub fn state(&self) -> EndpointState {
        self.state
    }

    /// Feed mono samples; returns the state after the last full frame.
    /// Once final, further input is ignored.
    pub fn push(&mut self, samples: &[f32]) -> EndpointState {
        if self.state.is_final() {
            return self.state;
        }
        self.pending.extend_from_slice(samples);

        let frame_len = self.frame_len;
        let mut consumed = 0;
        while self.pending.len() - consumed >= frame_len && !self.state.is_final() {
            let voice = is_voice(&self.pending[consumed..consumed + frame_len], self.config.threshold);
            consumed += frame_len;
            self.step(voice);
        }
        self.pending.drain(..consumed);
        self.state
    }

    fn step(&mut self, voice: bool) {
        self.frames_seen += 1;
        let elapsed = frames_to_duration(self.frames_seen);

        if voice {
            self.frames_since_voice = 0;
            self.first_voice_frame.get_or_insert(self.frames_seen);
            self.state = EndpointState::Speaking;
        } else {
            self.frames_since_voice += 1;
        }

        match self.first_voice_frame {
            None if elapsed >= self.config.no_speech_timeout => {
                self.state = EndpointState::NoSpeech;
            }
            Some(first) => {
                let spoken = frames_to_duration(self.frames_seen - first + 1);
                let quiet = frames_to_duration(self.frames_since_voice);
                if quiet >= self.config.trailing_silence || spoken >= self.config.max_utterance {
                    self.state = EndpointState::Complete;
                }
            }
            None => {}
        }
    }
}

fn frames_to_duration(frames: u64) -> Duration {
    Duration::from_millis(frames * FRAME_MS)
}

fn is_voice(frame: &[f32], threshold: f32) -> bool {
    if frame.is_empty() {
        return false;
    }
    let mean_sq = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
    mean_sq.sqrt() > threshold
}

/// Trim leading and trailing quiet 30 ms frames from 16 kHz mono audio.
/// An all-quiet clip yields an empty slice.
///
/// ```rust
/// use sight_assist::audio::trim_silence;
///
/// let mut audio = vec![0.0_f32; 480];
/// audio.extend(vec![0.5_f32; 480]);
/// audio.extend(vec![0.0_f32; 480]);
/// assert_eq!(trim_silence(&audio, 0.01).len(), 480);
/// ```
pub fn trim_silence(audio: &[f32], threshold: f32) -> &[f32] {
    const FRAME: usize = 480;
    let voiced = |i: usize| {
        let s = i * FRAME;
        let e = ((i + 1) * FRAME).min(audio.len());
        is_voice(&audio[s..e], threshold)
    };

    let total = audio.len().div_ceil(FRAME);
    let Some(first) = (0..total).find(|&i| voiced(i)) else {
        return &audio[0..0];
    };
    let last = (0..total).rfind(|&i| voiced(i)).unwrap_or(first);

    &audio[first * FRAME..((last + 1) * FRAME).min(audio.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;
    const FRAME: usize = 480;

    fn config() -> EndpointConfig {
        EndpointConfig {
            threshold: 0.01,
            trailing_silence: Duration::from_millis(300),
            no_speech_timeout: Duration::from_millis(600),
            max_utterance: Duration::from_millis(900),
        }
    }

    fn frames(n: usize, level: f32) -> Vec<f32> {
        vec![level; n * FRAME]
    }

    #[test]
    fn silence_only_ends_with_no_speech() {
        let mut d = UtteranceDetector::new(config(), RATE);
        assert_eq!(d.push(&frames(19, 0.0)), EndpointState::Waiting);
        assert_eq!(d.push(&frames(1, 0.0)), EndpointState::NoSpeech);
    }

    #[test]
    fn speech_then_trailing_silence_completes() {
        let mut d = UtteranceDetector::new(config(), RATE);
        assert_eq!(d.push(&frames(3, 0.0)), EndpointState::Waiting);
        assert_eq!(d.push(&frames(5, 0.3)), EndpointState::Speaking);
        assert_eq!(d.push(&frames(9, 0.0)), EndpointState::Speaking);
        assert_eq!(d.push(&frames(1, 0.0)), EndpointState::Complete);
    }

    #[test]
    fn late_speech_still_counts_before_timeout() {
        let mut d = UtteranceDetector::new(config(), RATE);
        d.push(&frames(15, 0.0));
        assert_eq!(d.push(&frames(1, 0.3)), EndpointState::Speaking);
        // No-speech timeout no longer applies once voice was heard.
        assert_eq!(d.push(&frames(5, 0.0)), EndpointState::Speaking);
    }

    #[test]
    fn long_speech_is_cut_at_max_length() {
        let mut d = UtteranceDetector::new(config(), RATE);
        assert_eq!(d.push(&frames(29, 0.3)), EndpointState::Speaking);
        assert_eq!(d.push(&frames(1, 0.3)), EndpointState::Complete);
    }

    #[test]
    fn partial_frames_are_buffered() {
        let mut d = UtteranceDetector::new(config(), RATE);
        assert_eq!(d.push(&vec![0.3; FRAME - 1]), EndpointState::Waiting);
        assert_eq!(d.push(&[0.3]), EndpointState::Speaking);
    }

    #[test]
    fn final_state_is_sticky() {
        let mut d = UtteranceDetector::new(config(), RATE);
        d.push(&frames(20, 0.0));
        assert_eq!(d.push(&frames(5, 0.3)), EndpointState::NoSpeech);
    }

    #[test]
    fn frame_length_follows_sample_rate() {
        let mut d = UtteranceDetector::new(config(), 48_000);
        assert_eq!(d.push(&vec![0.3; 1_439]), EndpointState::Waiting);
        assert_eq!(d.push(&[0.3]), EndpointState::Speaking);
    }

    #[test]
    fn trim_keeps_voiced_middle() {
        let mut audio = frames(2, 0.0);
        audio.extend(frames(3, 0.4));
        audio.extend(frames(1, 0.0));
        assert_eq!(trim_silence(&audio, 0.01).len(), 3 * FRAME);
    }

    #[test]
    fn trim_all_quiet_is_empty() {
        assert!(trim_silence(&frames(3, 0.0), 0.01).is_empty());
        assert!(trim_silence(&[], 0.01).is_empty());
    }
}
