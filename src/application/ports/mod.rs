//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio_cue;
pub mod config;
pub mod encoder;
pub mod source;

// Re-export common types
pub use audio_cue::{AudioCue, AudioCueError, AudioCueType};
pub use config::ConfigStore;
pub use encoder::{EncodeError, SampleEncoder};
pub use source::{CaptureError, CaptureStream, MediaSource};
