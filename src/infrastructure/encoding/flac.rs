//! FLAC encoder backed by flacenc
//!
//! Lossless compression at roughly 40% of the equivalent WAV size.
//! Like the WAV encoder, the accumulation is retained across dumps.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

use crate::application::ports::{EncodeError, SampleEncoder};
use crate::domain::recording::MimeType;

/// Bits per sample (16-bit audio)
const BITS_PER_SAMPLE: usize = 16;

/// Number of channels (mono)
const CHANNELS: usize = 1;

/// Accumulating FLAC encoder
#[derive(Default)]
pub struct FlacEncoder {
    samples: Vec<f32>,
}

impl FlacEncoder {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }
}

impl SampleEncoder for FlacEncoder {
    fn mime_type(&self) -> MimeType {
        MimeType::Flac
    }

    fn encode(&mut self, buffer: Vec<f32>) {
        self.samples.extend_from_slice(&buffer);
    }

    fn dump(&mut self, sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
        // flacenc works on i32 samples
        let samples_i32: Vec<i32> = self
            .samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i32)
            .collect();

        let config = config::Encoder::default()
            .into_verified()
            .map_err(|(_, e)| EncodeError::Config(format!("{:?}", e)))?;

        let source = MemSource::from_samples(
            &samples_i32,
            CHANNELS,
            BITS_PER_SAMPLE,
            sample_rate as usize,
        );

        let flac_stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
            .map_err(|e| EncodeError::Encode(format!("{:?}", e)))?;

        let mut sink = ByteSink::new();
        flac_stream
            .write(&mut sink)
            .map_err(|e| EncodeError::Encode(e.to_string()))?;

        Ok(sink.into_inner())
    }
}
