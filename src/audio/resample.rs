//! Channel downmix and sample-rate conversion to Whisper's 16 kHz mono.
//!
//! Resampling uses rubato's `SincFixedIn` with a Blackman-Harris window.
//! The whole utterance is converted in one go after endpointing, so the
//! resampler's group delay is trimmed and the output length is exact.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use thiserror::Error;

pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

const CHUNK_FRAMES: usize = 1024;

#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("resampler construction failed: {0}")]
    Construction(#[from] rubato::ResamplerConstructionError),
    #[error("resampling failed: {0}")]
    Process(#[from] rubato::ResampleError),
}

/// Average interleaved channels down to mono.
///
/// ```rust
/// use sight_assist::audio::downmix;
///
/// let mono = downmix(&[0.5_f32, -0.5, 0.2, 0.4], 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

/// Convert mono `samples` at `source_rate` to 16 kHz.
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Result<Vec<f32>, ResampleError> {
    if source_rate == WHISPER_SAMPLE_RATE || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = WHISPER_SAMPLE_RATE as f64 / source_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, 1)?;

    let expected = (samples.len() as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut out: Vec<f32> = Vec::with_capacity(expected + delay + CHUNK_FRAMES);

    let mut chunks = samples.chunks_exact(CHUNK_FRAMES);
    for chunk in &mut chunks {
        let processed = resampler.process(&[chunk][..], None)?;
        out.extend_from_slice(&processed[0]);
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        let processed = resampler.process_partial(Some(&[rest][..]), None)?;
        out.extend_from_slice(&processed[0]);
    }
    // Flush the filter tail until the delayed output has been produced.
    while out.len() < expected + delay {
        let processed = resampler.process_partial(None::<&[&[f32]]>, None)?;
        if processed[0].is_empty() {
            break;
        }
        out.extend_from_slice(&processed[0]);
    }

    let start = delay.min(out.len());
    let end = (start + expected).min(out.len());
    Ok(out[start..end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_mono_is_identity() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(downmix(&input, 1), input);
    }

    #[test]
    fn downmix_four_channels() {
        let out = downmix(&[0.4_f32; 8], 4);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn downmix_zero_channels_is_empty() {
        assert!(downmix(&[1.0_f32, 2.0], 0).is_empty());
    }

    #[test]
    fn already_16k_is_untouched() {
        let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
        assert_eq!(resample_to_16k(&input, 16_000).unwrap(), input);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(resample_to_16k(&[], 48_000).unwrap().is_empty());
    }

    #[test]
    fn one_second_at_48k_becomes_one_second_at_16k() {
        let out = resample_to_16k(&vec![0.0_f32; 48_000], 48_000).unwrap();
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn odd_rates_keep_duration() {
        let out = resample_to_16k(&vec![0.0_f32; 44_100], 44_100).unwrap();
        assert_eq!(out.len(), 16_000);

        let out = resample_to_16k(&vec![0.0_f32; 4_000], 8_000).unwrap();
        assert_eq!(out.len(), 8_000);
    }

    #[test]
    fn steady_tone_keeps_its_level_mid_signal() {
        let input = vec![0.5_f32; 48_000];
        let out = resample_to_16k(&input, 48_000).unwrap();
        let mid = &out[4_000..12_000];
        for &s in mid {
            assert!((s - 0.5).abs() < 0.01, "level drift: {s}");
        }
    }
}
