//! Audio cue port for playing sound feedback
//!
//! Provides audible feedback when capture starts or stops.

use async_trait::async_trait;
use thiserror::Error;

/// Types of audio cues that can be played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCueType {
    /// Ascending chime when capture starts
    CaptureStart,
    /// Descending chime when capture stops
    CaptureStop,
}

/// Errors that can occur during audio cue playback
#[derive(Error, Debug)]
pub enum AudioCueError {
    /// Failed to play the audio cue
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// No audio output device available
    #[error("Audio device not available: {0}")]
    DeviceNotAvailable(String),
}

/// Port trait for audio cue playback
#[async_trait]
pub trait AudioCue: Send + Sync {
    /// Play an audio cue
    async fn play(&self, cue_type: AudioCueType) -> Result<(), AudioCueError>;
}
