//! Sample encoder port interface

use thiserror::Error;

use crate::domain::recording::MimeType;

/// Encoding errors
#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    #[error("Encoder config error: {0}")]
    Config(String),

    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Port for the swappable sample-encoding algorithm.
///
/// An encoder accumulates raw sample batches fed to it via `encode` and
/// serializes everything accumulated so far when asked to `dump`. Whether the
/// accumulation is cleared or retained after a dump is the implementation's
/// choice; callers must not assume either.
pub trait SampleEncoder: Send {
    /// The MIME tag attached to every chunk this encoder produces
    fn mime_type(&self) -> MimeType;

    /// Append one batch of raw mono samples to the accumulation
    fn encode(&mut self, buffer: Vec<f32>);

    /// Serialize the accumulation into one encoded chunk at the given rate
    fn dump(&mut self, sample_rate: u32) -> Result<Vec<u8>, EncodeError>;
}
