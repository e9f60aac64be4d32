//! Microphone capture via `cpal`.
//!
//! [`Microphone::start`] streams [`AudioChunk`]s over a std mpsc channel;
//! the returned [`StreamHandle`] stops the hardware stream when dropped.

use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

/// One buffer of raw audio as delivered by the cpal callback.
///
/// Use [`crate::audio::downmix`] and [`crate::audio::resample_to_16k`] to
/// bring a whole utterance to 16 kHz mono before transcription.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g. 44100, 48000).
    pub sample_rate: u32,
    pub channels: u16,
}

/// Keeps the cpal stream alive.
///
/// Dropping it stops the hardware stream, which also ends a voice command
/// listen.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

#[derive(Debug, Error)]
pub enum MicError {
    #[error("no input device found")]
    NoDevice,

    #[error("input device {0:?} not found")]
    DeviceNotFound(String),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

impl MicError {
    /// Whether the platform refused microphone access rather than the
    /// device being absent or broken.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            MicError::BuildStream(cpal::BuildStreamError::BackendSpecific { err }) => {
                let d = err.description.to_lowercase();
                d.contains("permission") || d.contains("denied") || d.contains("not authorized")
            }
            _ => false,
        }
    }
}

/// Input device wrapper built on `cpal`.
///
/// ```rust,no_run
/// use std::sync::mpsc;
/// use sight_assist::audio::{AudioChunk, Microphone};
///
/// let (tx, rx) = mpsc::channel::<AudioChunk>();
/// let mic = Microphone::open(None).unwrap();
/// let _handle = mic.start(tx).unwrap();
/// // Chunks arrive on `rx` until `_handle` is dropped.
/// ```
pub struct Microphone {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_rate: u32,
    channels: u16,
}

impl Microphone {
    /// Open the named input device, or the host default when `device_name`
    /// is `None`, using the device's preferred stream configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MicError::NoDevice`] when there is no default input,
    /// [`MicError::DeviceNotFound`] when no device has the given name, and
    /// [`MicError::DefaultConfig`] when the device cannot report a default
    /// configuration.
    pub fn open(device_name: Option<&str>) -> Result<Self, MicError> {
        let host = cpal::default_host();
        let device = match device_name {
            None => host.default_input_device().ok_or(MicError::NoDevice)?,
            Some(name) => host
                .input_devices()?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| MicError::DeviceNotFound(name.to_string()))?,
        };

        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start recording and forward every hardware buffer to `tx`.
    ///
    /// The callback runs on cpal's audio thread.  Send errors (receiver
    /// gone) are ignored so that thread never panics.
    ///
    /// # Errors
    ///
    /// Returns [`MicError::BuildStream`] or [`MicError::PlayStream`] when the
    /// platform rejects the stream.  A refused microphone permission shows up
    /// as the former; see [`MicError::is_permission_denied`].
    pub fn start(&self, tx: mpsc::Sender<AudioChunk>) -> Result<StreamHandle, MicError> {
        let sample_rate = self.sample_rate;
        let channels = self.channels;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(AudioChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                });
            },
            |err: cpal::StreamError| {
                log::error!("audio: cpal stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    /// Native rate of the device in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}
