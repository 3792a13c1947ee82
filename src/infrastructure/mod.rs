//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with cpal devices, audio codecs, and the filesystem.

pub mod audio_cue;
pub mod capture;
pub mod config;
pub mod encoding;

// Re-export adapters
pub use audio_cue::{create_audio_cue, NoOpAudioCue, RodioAudioCue};
pub use capture::{capture_supported, CaptureContext, CpalSource};
pub use config::XdgConfigStore;
pub use encoding::{FlacEncoder, WavEncoder};
