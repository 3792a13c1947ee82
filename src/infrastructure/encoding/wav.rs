//! WAV encoder backed by hound
//!
//! The default encoder: uncompressed 16-bit mono PCM in a RIFF container.
//! Samples accumulate across the whole session and every dump serializes
//! the full accumulation, so later chunks extend earlier ones.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::application::ports::{EncodeError, SampleEncoder};
use crate::domain::recording::MimeType;

/// Bits per sample (16-bit audio)
const BITS_PER_SAMPLE: u16 = 16;

/// Number of channels (mono)
const CHANNELS: u16 = 1;

/// Accumulating WAV encoder
#[derive(Default)]
pub struct WavEncoder {
    samples: Vec<f32>,
}

impl WavEncoder {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }
}

impl SampleEncoder for WavEncoder {
    fn mime_type(&self) -> MimeType {
        MimeType::Wav
    }

    fn encode(&mut self, buffer: Vec<f32>) {
        self.samples.extend_from_slice(&buffer);
    }

    fn dump(&mut self, sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
        let spec = WavSpec {
            channels: CHANNELS,
            sample_rate,
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut writer =
            WavWriter::new(&mut cursor, spec).map_err(|e| EncodeError::Config(e.to_string()))?;

        for &sample in &self.samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(value)
                .map_err(|e| EncodeError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| EncodeError::Encode(e.to_string()))?;

        Ok(cursor.into_inner())
    }
}
