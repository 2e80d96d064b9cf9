use crate::{MurmurError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;
use tracing::debug;

/// Decoded PCM audio, interleaved when multi-channel
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioData {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Average all channels into one
    pub fn to_mono(&self) -> AudioData {
        AudioData::new(
            downmix(&self.samples, self.channels),
            self.sample_rate,
            1,
        )
    }
}

fn read_error(e: hound::Error) -> MurmurError {
    MurmurError::AudioProcessingError(format!("Failed to read WAV data: {}", e))
}

/// Decode an in-memory WAV file to f32 samples in -1.0..=1.0
pub fn decode_wav(bytes: &[u8]) -> Result<AudioData> {
    let mut reader = WavReader::new(Cursor::new(bytes)).map_err(read_error)?;
    let spec = reader.spec();

    debug!(
        "Decoding WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(read_error)?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|sample| sample as f32 / i16::MAX as f32))
            .collect::<std::result::Result<_, _>>()
            .map_err(read_error)?,
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|sample| sample as f32 / 8_388_608.0)) // 2^23
            .collect::<std::result::Result<_, _>>()
            .map_err(read_error)?,
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|sample| sample as f32 / i32::MAX as f32))
            .collect::<std::result::Result<_, _>>()
            .map_err(read_error)?,
        (_, bits) => {
            return Err(MurmurError::AudioProcessingError(format!(
                "Unsupported bit depth: {}",
                bits
            )));
        }
    };

    Ok(AudioData::new(samples, spec.sample_rate, spec.channels))
}

/// Encode audio as a 16-bit PCM WAV file
pub fn encode_wav(audio: &AudioData) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let write_error =
        |e: hound::Error| MurmurError::AudioProcessingError(format!("Failed to write WAV data: {}", e));

    let mut bytes = Vec::new();
    {
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).map_err(write_error)?;
        for &sample in &audio.samples {
            let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(sample_i16).map_err(write_error)?;
        }
        writer.finalize().map_err(write_error)?;
    }

    Ok(bytes)
}

/// Average interleaved channels into a single channel
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(sample_rate: u32, seconds: f32) -> Vec<f32> {
        (0..(sample_rate as f32 * seconds) as usize)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_encode_decode_wav() {
        let audio = AudioData::new(sine(16000, 0.25), 16000, 1);

        let bytes = encode_wav(&audio).unwrap();
        let decoded = decode_wav(&bytes).unwrap();

        assert_eq!(decoded.sample_rate, 16000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples.len(), audio.samples.len());
        for (original, read) in audio.samples.iter().zip(decoded.samples.iter()) {
            assert!((original - read).abs() < 0.001);
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_wav(b"definitely not a wav file").is_err());
        assert!(decode_wav(&[]).is_err());
    }

    #[test]
    fn test_downmix_stereo() {
        let mono = downmix(&[0.5, 0.3, 0.7, 0.1], 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.4).abs() < 0.001);
        assert!((mono[1] - 0.4).abs() < 0.001);
    }

    #[test]
    fn test_duration() {
        let audio = AudioData::new(vec![0.0; 32000], 16000, 2);
        assert!((audio.duration_seconds() - 1.0).abs() < 0.001);
        assert_eq!(audio.to_mono().samples.len(), 16000);
    }
}
