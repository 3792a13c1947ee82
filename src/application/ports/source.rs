//! Media source port interface

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoDevice,

    #[error("Failed to read device config: {0}")]
    Config(String),

    #[error("Failed to open capture stream: {0}")]
    StreamOpen(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// Handle to a live capture pipeline.
///
/// Stopping halts delivery and releases the device; dropping without an
/// explicit stop must do the same.
pub trait CaptureStream: Send {
    /// Halt delivery and release the capture device
    fn stop(&mut self);
}

/// Port for the audio pipeline feeding raw sample buffers.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// The sampling rate of delivered buffers
    fn sample_rate(&self) -> u32;

    /// Attach the pipeline, delivering mono sample batches on `buffers`
    /// until the returned stream is stopped or dropped.
    async fn connect(
        &self,
        buffers: mpsc::UnboundedSender<Vec<f32>>,
    ) -> Result<Box<dyn CaptureStream>, CaptureError>;
}
