//! Audio helpers for spoken input
//!
//! Recorded utterances arrive as WAV bytes; recognizers that run in-process
//! want mono f32 samples at [`SPEECH_SAMPLE_RATE`].

pub mod resampler;
pub mod wav;

pub use resampler::{resample_audio, AudioResampler};
pub use wav::{decode_wav, downmix, encode_wav, AudioData};

use crate::Result;
use tracing::debug;

/// Sample rate expected by Whisper models
pub const SPEECH_SAMPLE_RATE: u32 = 16000;

/// Decode WAV bytes into mono samples at [`SPEECH_SAMPLE_RATE`]
pub fn prepare_for_speech(wav_bytes: &[u8]) -> Result<Vec<f32>> {
    let audio = decode_wav(wav_bytes)?.to_mono();
    debug!(
        "Preparing {:.2}s of audio at {} Hz for recognition",
        audio.duration_seconds(),
        audio.sample_rate
    );

    resample_audio(&audio.samples, audio.sample_rate, SPEECH_SAMPLE_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_stereo_at_speech_rate() {
        let stereo = AudioData::new(vec![0.25; 3200], SPEECH_SAMPLE_RATE, 2);
        let bytes = encode_wav(&stereo).unwrap();

        let samples = prepare_for_speech(&bytes).unwrap();
        assert_eq!(samples.len(), 1600);
        assert!((samples[0] - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_prepare_resamples() {
        let audio = AudioData::new(vec![0.0; 44100], 44100, 1);
        let bytes = encode_wav(&audio).unwrap();

        let samples = prepare_for_speech(&bytes).unwrap();
        let expected = SPEECH_SAMPLE_RATE as usize;
        assert!(samples.len().abs_diff(expected) < expected / 10);
    }
}
